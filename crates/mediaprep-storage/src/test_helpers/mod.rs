//! Test doubles for crates that depend on a resource store

mod mock_store;

pub use mock_store::MockResourceStore;
