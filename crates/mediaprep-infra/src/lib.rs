//! Mediaprep Infrastructure Library
//!
//! Shared infrastructure for binaries and services embedding the pipeline:
//! - Telemetry initialization (tracing subscriber with env filter)

#[cfg(feature = "observability-basic")]
pub mod telemetry;

#[cfg(feature = "observability-basic")]
pub use telemetry::{init_telemetry, init_telemetry_from_config};
