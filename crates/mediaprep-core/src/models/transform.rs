//! Transform modes and outcomes

use crate::models::media::MediaDescriptor;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};

/// How long a transform is willing to wait for its resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransformMode {
    /// Take the first snapshot the store offers and return immediately
    Opportunistic,
    /// Suspend until the resource is fully available locally
    WaitForCompletion,
}

impl Display for TransformMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            TransformMode::Opportunistic => write!(f, "opportunistic"),
            TransformMode::WaitForCompletion => write!(f, "wait_for_completion"),
        }
    }
}

/// Where CPU-bound derivation work (decode, resize, encode) runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionContext {
    /// On the task that polls the transform
    Inline,
    /// On the runtime's blocking thread pool
    Blocking,
}

impl ExecutionContext {
    /// Opportunistic runs inline, WaitForCompletion on the blocking pool.
    pub fn for_mode(mode: TransformMode) -> Self {
        match mode {
            TransformMode::Opportunistic => ExecutionContext::Inline,
            TransformMode::WaitForCompletion => ExecutionContext::Blocking,
        }
    }
}

/// Terminal result of a transform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "media", rename_all = "snake_case")]
pub enum TransformOutcome {
    Updated(MediaDescriptor),
    Unavailable,
    /// Cancelled before a terminal result was reached
    NotYetComplete,
}

impl TransformOutcome {
    pub fn updated(&self) -> Option<&MediaDescriptor> {
        match self {
            TransformOutcome::Updated(media) => Some(media),
            _ => None,
        }
    }

    pub fn into_media(self) -> Option<MediaDescriptor> {
        match self {
            TransformOutcome::Updated(media) => Some(media),
            _ => None,
        }
    }

    /// True when no media is available to the caller.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            TransformOutcome::Unavailable | TransformOutcome::NotYetComplete
        )
    }
}
