//! Resource store abstraction
//!
//! The store owns fetching and caching of content-addressed resources. The processing
//! layer only triggers fetches, watches local availability and writes generated content.

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use mediaprep_core::{FetchParameters, ResourceDataOption, ResourceId, ResourceSnapshot};
use std::pin::Pin;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Resource store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid resource id: {0}")]
    InvalidId(String),

    #[error("Write failed: {0}")]
    WriteFailed(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Stream of availability snapshots for one resource
pub type SnapshotStream = Pin<Box<dyn Stream<Item = ResourceSnapshot> + Send>>;

/// Handle on a running fetch. Cancelling it asks the store to stop the fetch.
///
/// Clones share the same fetch; cancelling is idempotent.
#[derive(Debug, Clone, Default)]
pub struct FetchHandle {
    token: CancellationToken,
}

impl FetchHandle {
    pub fn new() -> Self {
        FetchHandle {
            token: CancellationToken::new(),
        }
    }

    pub fn from_token(token: CancellationToken) -> Self {
        FetchHandle { token }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Token a store implementation watches to stop its fetch work
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

/// Resource store trait
///
/// Implementations must be safe for concurrent fetch/observe/write by identifier.
/// Absence of data is never an error here: an unreachable resource simply never
/// produces a complete snapshot.
#[async_trait]
pub trait ResourceStore: Send + Sync {
    /// Trigger (or join) a fetch of `id`. Idempotent per id.
    fn fetch(&self, id: &ResourceId, params: FetchParameters) -> FetchHandle;

    /// Watch local availability of `id`, yielding a snapshot whenever it changes.
    ///
    /// Dropping the stream stops the observation.
    fn observe_data(&self, id: &ResourceId, option: ResourceDataOption) -> SnapshotStream;

    /// Persist newly generated content under a fresh id.
    async fn store_data(&self, id: &ResourceId, data: Bytes) -> StoreResult<()>;
}
