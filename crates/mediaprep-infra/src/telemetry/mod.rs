//! Telemetry initialization
//!
//! Installs the global tracing subscriber. `RUST_LOG` wins over the configured filter.

mod init_basic;

pub use init_basic::{init_telemetry, init_telemetry_from_config};
