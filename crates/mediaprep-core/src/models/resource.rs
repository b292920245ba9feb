//! Resource identifiers and availability snapshots

use crate::constants::LOCAL_RESOURCE_PREFIX;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Opaque identifier of a content-addressed blob held by a resource store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(String);

impl ResourceId {
    pub fn new(id: impl Into<String>) -> Self {
        ResourceId(id.into())
    }

    /// Allocate a fresh identifier for locally generated content (e.g. thumbnails).
    ///
    /// Every call returns a distinct id.
    pub fn generate_local() -> Self {
        ResourceId(format!("{}:{}", LOCAL_RESOURCE_PREFIX, Uuid::new_v4().simple()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_local(&self) -> bool {
        self.0
            .strip_prefix(LOCAL_RESOURCE_PREFIX)
            .is_some_and(|rest| rest.starts_with(':'))
    }
}

impl Display for ResourceId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}

impl From<&str> for ResourceId {
    fn from(value: &str) -> Self {
        ResourceId::new(value)
    }
}

impl From<String> for ResourceId {
    fn from(value: String) -> Self {
        ResourceId(value)
    }
}

/// Point-in-time readout of how much of a resource is available locally.
///
/// Snapshots carry no sequence number; only `complete` is authoritative.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResourceSnapshot {
    /// Local path of the available bytes, if any have been written.
    pub path: Option<PathBuf>,
    pub size: u64,
    pub complete: bool,
}

impl ResourceSnapshot {
    pub fn incomplete(size: u64) -> Self {
        ResourceSnapshot {
            path: None,
            size,
            complete: false,
        }
    }

    pub fn partial(path: impl Into<PathBuf>, size: u64) -> Self {
        ResourceSnapshot {
            path: Some(path.into()),
            size,
            complete: false,
        }
    }

    pub fn complete(path: impl Into<PathBuf>, size: u64) -> Self {
        ResourceSnapshot {
            path: Some(path.into()),
            size,
            complete: true,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }
}

/// Priority hint forwarded to the store's fetch machinery
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchPriority {
    #[default]
    Default,
    Elevated,
}

/// Parameters of a fetch trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FetchParameters {
    pub priority: FetchPriority,
}

/// How a data-availability stream should behave before the first emission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceDataOption {
    /// Hold back the first snapshot until at least one fetch attempt has been made.
    pub wait_until_fetch_attempted: bool,
}

impl Default for ResourceDataOption {
    fn default() -> Self {
        ResourceDataOption {
            wait_until_fetch_attempted: true,
        }
    }
}
