use mediaprep_core::constants::DEFAULT_LOG_FILTER;
use mediaprep_core::TransformConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing with `default_filter` as fallback for `RUST_LOG`.
///
/// Fails if a global subscriber is already installed.
pub fn init_telemetry(default_filter: &str) -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(tracing_subscriber::fmt::layer())
        .try_init()?;

    tracing::debug!(default_filter = default_filter, "Telemetry initialized");
    Ok(())
}

pub fn init_telemetry_from_config(
    config: &TransformConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    init_telemetry(config.log_filter.as_deref().unwrap_or(DEFAULT_LOG_FILTER))
}
