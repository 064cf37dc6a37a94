//! Tracing subscriber setup.

use lottomatch_types::LogConfig;
use tracing_subscriber::EnvFilter;

use crate::error::NodeError;

/// Install the global subscriber. `RUST_LOG` wins over the configured level.
///
/// # Errors
/// `Telemetry` if a global subscriber is already installed.
pub fn init_tracing(log: &LogConfig) -> Result<(), NodeError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log.level));
    let result = if log.json {
        tracing_subscriber::fmt()
            .with_target(false)
            .with_env_filter(filter)
            .json()
            .try_init()
    } else {
        tracing_subscriber::fmt()
            .with_target(false)
            .with_env_filter(filter)
            .compact()
            .try_init()
    };
    result.map_err(|e| NodeError::Telemetry(e.to_string()))
}
