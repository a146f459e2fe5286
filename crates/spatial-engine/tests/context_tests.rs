//! Context application and workspace resolution through a session.

use std::ffi::OsStr;
use std::process::Command;
use std::sync::Arc;

use spatial_engine::{
    CommandOutput, ContextFile, Engine, EngineResult, ModuleCall, NewLocation, ProcessContext,
    Session, WorkspaceRef, CONTEXT_ENV, REGION_OVERRIDE_ENV,
};

struct Silent;

impl Engine for Silent {
    fn execute(
        &self,
        _context: &ProcessContext,
        _call: &ModuleCall,
        _stdin: Option<&str>,
    ) -> EngineResult<CommandOutput> {
        Ok(CommandOutput::success(""))
    }

    fn create_location(&self, _request: &NewLocation) -> EngineResult<()> {
        Ok(())
    }
}

fn env_of<'a>(command: &'a Command, key: &str) -> Option<Option<&'a OsStr>> {
    command
        .get_envs()
        .find(|(k, _)| *k == OsStr::new(key))
        .map(|(_, v)| v)
}

#[test]
fn test_apply_sets_both_variables() {
    let context = ProcessContext::new("/tmp/rc").with_region_override("saved");
    let mut command = Command::new("true");
    context.apply(&mut command);

    assert_eq!(env_of(&command, CONTEXT_ENV), Some(Some(OsStr::new("/tmp/rc"))));
    assert_eq!(
        env_of(&command, REGION_OVERRIDE_ENV),
        Some(Some(OsStr::new("saved")))
    );
}

#[test]
fn test_apply_removes_unset_variables() {
    let mut command = Command::new("true");
    ProcessContext::default().apply(&mut command);

    // Explicitly removed, not merely inherited.
    assert_eq!(env_of(&command, CONTEXT_ENV), Some(None));
    assert_eq!(env_of(&command, REGION_OVERRIDE_ENV), Some(None));
}

#[test]
fn test_session_resolves_mapsets_from_context_file() {
    let dir = tempfile::tempdir().unwrap();
    let rc = dir.path().join("rc");
    let current = WorkspaceRef::new(dir.path(), "nc_spm", "user1");
    ContextFile::new(current.clone()).write(&rc).unwrap();

    let session = Session::new(Arc::new(Silent), ProcessContext::new(&rc));

    assert_eq!(session.current_workspace().unwrap(), current);
    let other = session.workspace("PERMANENT").unwrap();
    assert_eq!(other.location, "nc_spm");
    assert_eq!(other.mapset, "PERMANENT");
    assert_eq!(other.location_path(), current.location_path());
}

#[test]
fn test_marked_workspace_wins_over_context_file() {
    let dir = tempfile::tempdir().unwrap();
    let rc = dir.path().join("rc");
    ContextFile::new(WorkspaceRef::new(dir.path(), "nc_spm", "user1"))
        .write(&rc)
        .unwrap();
    let session = Session::new(Arc::new(Silent), ProcessContext::new(&rc));

    let marked = WorkspaceRef::new(dir.path(), "other", "PERMANENT");
    session.set_current_workspace(marked.clone());

    assert_eq!(session.current_workspace().unwrap(), marked);
}

#[test]
fn test_unreadable_context_file() {
    let dir = tempfile::tempdir().unwrap();
    let session = Session::new(
        Arc::new(Silent),
        ProcessContext::new(dir.path().join("missing")),
    );
    assert!(session.current_workspace().is_err());
}
