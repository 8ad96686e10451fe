//! Tracing/logging setup shared by every process embedding the bus.

/// Logging configuration.
pub mod config;

/// Tracing subscriber installation.
pub mod tracing;

pub use config::{LogFormat, ObservabilityConfig, UnknownLogFormat};

/// Initialize process-wide tracing/logging from the environment.
///
/// Logging is always installed. If `RIPPLE_LOG_FORMAT` is not recognised the
/// default format is used with the configured filter, and the error is
/// returned so the caller can report it once logging is up.
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() -> Result<(), UnknownLogFormat> {
    match ObservabilityConfig::try_from_env() {
        Ok(config) => {
            tracing::init(&config);
            Ok(())
        }
        Err(err) => {
            tracing::init(&ObservabilityConfig::from_env());
            Err(err)
        }
    }
}

/// Initialize with an explicit configuration.
pub fn init_with(config: &ObservabilityConfig) {
    tracing::init(config);
}
