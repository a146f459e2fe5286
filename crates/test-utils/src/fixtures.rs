//! Common test fixtures for export tests.
//!
//! The values mimic a projected (Lambert conformal, metres) source location
//! with a computational region inside a larger raster.

use std::path::{Path, PathBuf};

use spatial_engine::{ContextFile, ProcessContext, WorkspaceRef};

use crate::paths::temp_test_dir_with_prefix;

/// Projection definition reported for source workspaces.
pub const SOURCE_PROJECTION: &str = "+proj=lcc +lat_1=36.16666666666666 +lat_2=34.33333333333334 +lat_0=33.75 +lon_0=-79 +x_0=609601.22 +y_0=0 +no_defs +a=6378137 +rf=298.257222101 +towgs84=0,0,0,0,0,0,0 +to_meter=1 +type=crs";

/// `g.region -g` output of a source workspace.
pub const SOURCE_REGION: &str =
    "n=228500\ns=215000\nw=630000\ne=645000\nnsres=10\newres=10\nrows=1350\ncols=1500\ncells=2025000\n";

/// `r.info -g` footprint of every source raster; strictly contains
/// [`SOURCE_REGION`].
pub const RASTER_FOOTPRINT: &str =
    "north=235000\nsouth=205000\neast=660000\nwest=620000\nnsres=10\newres=10\nrows=3000\ncols=4000\n";

/// Region of a freshly created location.
pub const DEFAULT_REGION: &str = "n=1\ns=0\ne=1\nw=0\nnsres=1\newres=1\nrows=1\ncols=1\n";

pub const SOURCE_LOCATION: &str = "nc_spm";
pub const SOURCE_MAPSET: &str = "user1";

/// A source database with one location holding `PERMANENT` and a user
/// mapset, plus a context file selecting the user mapset.
///
/// Everything lives in a temporary directory removed on drop.
pub struct SourceFixture {
    dir: tempfile::TempDir,
    workspace: WorkspaceRef,
    context_file: PathBuf,
}

impl SourceFixture {
    pub fn new() -> Self {
        let dir = temp_test_dir_with_prefix("png_proj_src");
        let database = dir.path().join("grassdata");
        let workspace = WorkspaceRef::new(&database, SOURCE_LOCATION, SOURCE_MAPSET);
        std::fs::create_dir_all(workspace.sibling("PERMANENT").mapset_path())
            .expect("Failed to create source location");
        std::fs::create_dir_all(workspace.mapset_path()).expect("Failed to create source mapset");

        let context_file = dir.path().join("rc");
        ContextFile::new(workspace.clone())
            .write(&context_file)
            .expect("Failed to write context file");

        Self {
            dir,
            workspace,
            context_file,
        }
    }

    /// Context selecting the source mapset.
    pub fn context(&self) -> ProcessContext {
        ProcessContext::new(&self.context_file)
    }

    pub fn workspace(&self) -> WorkspaceRef {
        self.workspace.clone()
    }

    pub fn projection(&self) -> &'static str {
        SOURCE_PROJECTION
    }

    /// Scratch directory for outputs, outside the source database.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

impl Default for SourceFixture {
    fn default() -> Self {
        Self::new()
    }
}
