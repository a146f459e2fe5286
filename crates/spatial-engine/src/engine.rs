//! The engine execution seam.

use std::path::PathBuf;

use geo_common::EpsgCode;

use crate::command::{CommandOutput, ModuleCall};
use crate::context::ProcessContext;
use crate::error::EngineResult;
use crate::workspace::WorkspaceRef;

/// Request to create a new location from a registry code.
///
/// The location gets its default `PERMANENT` mapset; no datum or datum
/// transformation is overridden.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLocation {
    pub database: PathBuf,
    pub location: String,
    pub epsg: EpsgCode,
}

impl NewLocation {
    pub fn path(&self) -> PathBuf {
        self.database.join(&self.location)
    }

    pub fn permanent_mapset(&self) -> WorkspaceRef {
        WorkspaceRef::new(&self.database, &self.location, "PERMANENT")
    }
}

/// Runs engine modules.
///
/// Implementations execute synchronously and report the module's exit status
/// in [`CommandOutput`]; only a failure to run the module at all is an `Err`.
/// Status checking is done by [`crate::Session`].
pub trait Engine: Send + Sync {
    /// Run `call` in `context`, feeding `stdin` to the module when given.
    fn execute(
        &self,
        context: &ProcessContext,
        call: &ModuleCall,
        stdin: Option<&str>,
    ) -> EngineResult<CommandOutput>;

    /// Create a location with its projection taken from `request.epsg`.
    fn create_location(&self, request: &NewLocation) -> EngineResult<()>;
}
