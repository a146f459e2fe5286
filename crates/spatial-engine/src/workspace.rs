//! References to existing workspaces.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// A database directory, a location inside it and a mapset inside that.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkspaceRef {
    pub database: PathBuf,
    pub location: String,
    pub mapset: String,
}

impl WorkspaceRef {
    pub fn new(
        database: impl Into<PathBuf>,
        location: impl Into<String>,
        mapset: impl Into<String>,
    ) -> Self {
        Self {
            database: database.into(),
            location: location.into(),
            mapset: mapset.into(),
        }
    }

    pub fn location_path(&self) -> PathBuf {
        self.database.join(&self.location)
    }

    pub fn mapset_path(&self) -> PathBuf {
        self.location_path().join(&self.mapset)
    }

    /// Another mapset in the same location.
    pub fn sibling(&self, mapset: impl Into<String>) -> Self {
        Self {
            database: self.database.clone(),
            location: self.location.clone(),
            mapset: mapset.into(),
        }
    }

    pub fn exists(&self) -> bool {
        self.mapset_path().is_dir()
    }
}

impl fmt::Display for WorkspaceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.mapset, self.location_path().display())
    }
}
