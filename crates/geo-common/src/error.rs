//! Error types for coordinate, region and projection handling.

use thiserror::Error;

/// Result type alias using GeoError.
pub type GeoResult<T> = Result<T, GeoError>;

/// Errors raised while reading or interpreting spatial values.
#[derive(Debug, Error)]
pub enum GeoError {
    /// Text that should hold coordinates or key/value pairs did not.
    #[error("Malformed {what}: {detail}")]
    Parse { what: &'static str, detail: String },

    #[error("Invalid EPSG code: {0}")]
    InvalidEpsg(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl GeoError {
    pub fn parse(what: &'static str, detail: impl Into<String>) -> Self {
        GeoError::Parse {
            what,
            detail: detail.into(),
        }
    }

    /// Whether this error came from malformed input rather than I/O.
    pub fn is_parse(&self) -> bool {
        matches!(self, GeoError::Parse { .. } | GeoError::InvalidEpsg(_))
    }
}
