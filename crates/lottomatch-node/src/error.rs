//! Startup and supervision errors of the node binary.

use std::path::PathBuf;

use lottomatch_types::LottoError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("engine error: {0}")]
    Engine(#[from] LottoError),

    #[error("cannot read config {path}: {source}")]
    ConfigFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("tracing init failed: {0}")]
    Telemetry(String),

    #[error("signal handler error: {0}")]
    Signal(#[from] std::io::Error),
}
