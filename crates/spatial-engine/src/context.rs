//! Process context: which workspace child modules operate on.
//!
//! The engine's modules find their workspace through the file named by the
//! `GISRC` environment variable, and honour a temporary region named by
//! `WIND_OVERRIDE`. Instead of mutating the real process environment, the
//! values live in a [`ProcessContext`] that is applied to each child process.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use geo_common::{parse_key_values, GeoError, GeoResult};

use crate::workspace::WorkspaceRef;

/// Environment variable naming the context file.
pub const CONTEXT_ENV: &str = "GISRC";

/// Environment variable naming a temporary region override.
pub const REGION_OVERRIDE_ENV: &str = "WIND_OVERRIDE";

/// Active context file and region override for child modules.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessContext {
    pub context_file: Option<PathBuf>,
    pub region_override: Option<String>,
}

impl ProcessContext {
    pub fn new(context_file: impl Into<PathBuf>) -> Self {
        Self {
            context_file: Some(context_file.into()),
            region_override: None,
        }
    }

    pub fn with_region_override(mut self, region: impl Into<String>) -> Self {
        self.region_override = Some(region.into());
        self
    }

    /// Snapshot of the context inherited from the parent environment.
    pub fn from_env() -> Self {
        Self {
            context_file: std::env::var_os(CONTEXT_ENV).map(PathBuf::from),
            region_override: std::env::var(REGION_OVERRIDE_ENV)
                .ok()
                .filter(|v| !v.is_empty()),
        }
    }

    /// Set the child environment from this context.
    pub fn apply(&self, command: &mut Command) {
        match &self.context_file {
            Some(path) => command.env(CONTEXT_ENV, path),
            None => command.env_remove(CONTEXT_ENV),
        };
        match &self.region_override {
            Some(region) => command.env(REGION_OVERRIDE_ENV, region),
            None => command.env_remove(REGION_OVERRIDE_ENV),
        };
    }

    /// Read the workspace named by the context file.
    pub fn workspace(&self) -> GeoResult<WorkspaceRef> {
        let path = self
            .context_file
            .as_deref()
            .ok_or_else(|| GeoError::parse("process context", "no context file set"))?;
        Ok(ContextFile::read(path)?.workspace)
    }
}

/// The on-disk context file: `GISDBASE`, `LOCATION_NAME` and `MAPSET` lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextFile {
    pub workspace: WorkspaceRef,
}

impl ContextFile {
    pub fn new(workspace: WorkspaceRef) -> Self {
        Self { workspace }
    }

    pub fn to_content(&self) -> String {
        format!(
            "GISDBASE: {}\nLOCATION_NAME: {}\nMAPSET: {}\n",
            self.workspace.database.display(),
            self.workspace.location,
            self.workspace.mapset
        )
    }

    pub fn parse(content: &str) -> GeoResult<Self> {
        let values = parse_key_values(content, ":", None)?;
        let field = |key: &str| {
            values
                .get(key)
                .cloned()
                .ok_or_else(|| GeoError::parse("context file", format!("missing {}", key)))
        };
        Ok(Self::new(WorkspaceRef::new(
            field("GISDBASE")?,
            field("LOCATION_NAME")?,
            field("MAPSET")?,
        )))
    }

    pub fn read(path: &Path) -> GeoResult<Self> {
        Self::parse(&fs::read_to_string(path)?)
    }

    pub fn write(&self, path: &Path) -> GeoResult<()> {
        fs::write(path, self.to_content())?;
        Ok(())
    }
}
