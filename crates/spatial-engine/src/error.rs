//! Error types for engine command execution.

use geo_common::GeoError;
use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = std::result::Result<T, EngineError>;

/// Errors that can occur while running engine modules.
#[derive(Error, Debug)]
pub enum EngineError {
    /// The module ran and exited with a non-zero status.
    #[error("{module} failed with status {status}: {stderr}")]
    CommandFailed {
        module: String,
        status: i32,
        stderr: String,
    },

    #[error("Failed to launch {module}: {source}")]
    Launch {
        module: String,
        #[source]
        source: std::io::Error,
    },

    #[error("No active workspace: {0}")]
    NoContext(String),

    #[error(transparent)]
    Geo(#[from] GeoError),
}

impl From<std::io::Error> for EngineError {
    fn from(err: std::io::Error) -> Self {
        EngineError::Geo(GeoError::Io(err))
    }
}
