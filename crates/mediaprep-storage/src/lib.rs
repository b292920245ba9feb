//! Mediaprep Storage Library
//!
//! This crate provides the resource store abstraction consumed by the processing layer,
//! plus a local filesystem implementation.
//!
//! # Resource file layout
//!
//! A resource id maps to a single file name, percent-encoded so that ids such as
//! `local-file:1f3a…` are safe on every filesystem:
//!
//! - **Complete data**: `{base}/{encoded id}`
//! - **Partial data**: `{base}/{encoded id}.part`
//!
//! Ids that encode to `.`, `..` or an empty name are rejected.

pub(crate) mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_helpers;
pub mod traits;

// Re-export commonly used types
#[cfg(feature = "storage-local")]
pub use local::LocalResourceStore;
pub use traits::{FetchHandle, ResourceStore, SnapshotStream, StoreError, StoreResult};
