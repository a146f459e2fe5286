//! The disposable workspace an export renders from.
//!
//! Ownership tree: a storage root directory created for one export holds one
//! location named after the target EPSG code, which holds one mapset. The
//! context file pointing at the mapset lives next to the root, not inside it.
//!
//! Teardown removes the mapset with everything in it, since the export is
//! the only writer. The location and the root must then be empty; anything
//! else found there was not created by the export and is reported instead of
//! deleted.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use geo_common::EpsgCode;
use spatial_engine::{ContextFile, NewLocation, ProcessContext, WorkspaceRef};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{ExportError, ExportResult};

/// Mapset created together with every new location.
pub const PARTITION: &str = "PERMANENT";

const PREFIX: &str = "png_proj";

#[derive(Debug)]
pub struct DisposableWorkspace {
    root: PathBuf,
    workspace: WorkspaceRef,
    context_file: PathBuf,
    epsg: EpsgCode,
}

impl DisposableWorkspace {
    pub fn location_name(epsg: EpsgCode) -> String {
        format!("{}_location_{}", PREFIX, epsg)
    }

    /// Create a fresh storage root under `temp_dir` and write the context
    /// file for the workspace that will live in it.
    ///
    /// The location itself is not created here.
    pub fn allocate(temp_dir: &Path, epsg: EpsgCode) -> ExportResult<Self> {
        let id = Uuid::new_v4().simple().to_string();
        let root = temp_dir.join(format!("{}_{}", PREFIX, id));
        fs::create_dir(&root)?;

        let workspace = WorkspaceRef::new(&root, Self::location_name(epsg), PARTITION);
        let context_file = temp_dir.join(format!("{}_{}.rc", PREFIX, id));
        if let Err(err) = ContextFile::new(workspace.clone()).write(&context_file) {
            if let Err(cleanup) = fs::remove_dir(&root) {
                warn!(
                    root = %root.display(),
                    error = %cleanup,
                    "Failed to remove storage root after context file error"
                );
            }
            return Err(err.into());
        }

        debug!(
            root = %root.display(),
            location = %workspace.location,
            "Allocated disposable workspace"
        );

        Ok(Self {
            root,
            workspace,
            context_file,
            epsg,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn workspace(&self) -> &WorkspaceRef {
        &self.workspace
    }

    pub fn context_file(&self) -> &Path {
        &self.context_file
    }

    /// Process context that directs engine modules into this workspace.
    pub fn context(&self) -> ProcessContext {
        ProcessContext::new(&self.context_file)
    }

    pub fn new_location(&self) -> NewLocation {
        NewLocation {
            database: self.root.clone(),
            location: self.workspace.location.clone(),
            epsg: self.epsg,
        }
    }

    /// Remove the mapset, the location, the root and the context file.
    ///
    /// Directories that were never created are skipped. The context file is
    /// removed even when the tree could not be, so only the tree is left
    /// behind for inspection.
    pub fn teardown(&self) -> ExportResult<()> {
        let tree = self.remove_tree();
        let context_file = remove_file(&self.context_file);
        tree.and(context_file)
    }

    fn remove_tree(&self) -> ExportResult<()> {
        let mapset = self.workspace.mapset_path();
        match fs::remove_dir_all(&mapset) {
            Ok(()) => {}
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(err) => return Err(teardown_error(&mapset, err.to_string())),
        }
        remove_empty_dir(&self.workspace.location_path())?;
        remove_empty_dir(&self.root)?;
        debug!(root = %self.root.display(), "Removed disposable workspace");
        Ok(())
    }
}

fn remove_empty_dir(path: &Path) -> ExportResult<()> {
    let entries = match fs::read_dir(path) {
        Ok(entries) => entries,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(()),
        Err(err) => return Err(teardown_error(path, err.to_string())),
    };

    let mut leftovers: Vec<String> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .collect();
    if !leftovers.is_empty() {
        leftovers.sort();
        return Err(teardown_error(
            path,
            format!("directory not empty, found: {}", leftovers.join(", ")),
        ));
    }

    fs::remove_dir(path).map_err(|err| teardown_error(path, err.to_string()))
}

fn remove_file(path: &Path) -> ExportResult<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
        Err(err) => Err(teardown_error(path, err.to_string())),
    }
}

fn teardown_error(path: &Path, reason: String) -> ExportError {
    ExportError::Teardown {
        path: path.to_path_buf(),
        reason,
    }
}
