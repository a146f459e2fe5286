//! Error types for the reprojected export.

use std::path::PathBuf;

use geo_common::GeoError;
use spatial_engine::EngineError;
use thiserror::Error;

/// Errors that can occur during an export.
#[derive(Error, Debug)]
pub enum ExportError {
    /// An engine module could not be run or exited with non-zero status.
    #[error("External command failed: {0}")]
    ExternalCommand(EngineError),

    /// Module output or a coordinate file did not have the expected shape.
    #[error("{0}")]
    Parse(GeoError),

    /// Removing the disposable workspace found something it did not create.
    #[error("Teardown of {} failed: {reason}", .path.display())]
    Teardown { path: PathBuf, reason: String },

    #[error("Workspace not found: {0}")]
    WorkspaceNotFound(String),

    #[error("Another export is already running in this session")]
    ExportInProgress,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExportError {
    pub fn is_teardown(&self) -> bool {
        matches!(self, ExportError::Teardown { .. })
    }
}

impl From<GeoError> for ExportError {
    fn from(err: GeoError) -> Self {
        match err {
            GeoError::Io(io) => ExportError::Io(io),
            other => ExportError::Parse(other),
        }
    }
}

impl From<EngineError> for ExportError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Geo(geo) => geo.into(),
            EngineError::NoContext(msg) => ExportError::WorkspaceNotFound(msg),
            other => ExportError::ExternalCommand(other),
        }
    }
}

/// Result type for export operations.
pub type ExportResult<T> = std::result::Result<T, ExportError>;
