//! Execution context object shared by every engine operation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::debug;

use crate::command::{CommandOutput, ModuleCall};
use crate::context::ProcessContext;
use crate::engine::{Engine, NewLocation};
use crate::error::{EngineError, EngineResult};
use crate::workspace::WorkspaceRef;

/// Owns the process context and the engine used to run modules.
///
/// Every module started through a session sees the session's current
/// [`ProcessContext`]. Switching it affects all later calls made through the
/// same session, so operations that switch context take the
/// [`ExportSlot`] first.
pub struct Session {
    engine: Arc<dyn Engine>,
    context: Mutex<ProcessContext>,
    current: Mutex<Option<WorkspaceRef>>,
    export_active: AtomicBool,
}

impl Session {
    pub fn new(engine: Arc<dyn Engine>, context: ProcessContext) -> Self {
        Self {
            engine,
            context: Mutex::new(context),
            current: Mutex::new(None),
            export_active: AtomicBool::new(false),
        }
    }

    /// Session using the context inherited from the parent environment.
    pub fn from_env(engine: Arc<dyn Engine>) -> Self {
        Self::new(engine, ProcessContext::from_env())
    }

    pub fn context(&self) -> ProcessContext {
        lock(&self.context).clone()
    }

    /// Install `context` and return the one it replaced.
    pub fn replace_context(&self, context: ProcessContext) -> ProcessContext {
        std::mem::replace(&mut *lock(&self.context), context)
    }

    /// Remove the region override, returning it.
    pub fn take_region_override(&self) -> Option<String> {
        lock(&self.context).region_override.take()
    }

    /// Workspace marked current in this process, falling back to the one
    /// named by the context file.
    pub fn current_workspace(&self) -> EngineResult<WorkspaceRef> {
        if let Some(workspace) = lock(&self.current).clone() {
            return Ok(workspace);
        }
        let context = self.context();
        if context.context_file.is_none() {
            return Err(EngineError::NoContext(format!(
                "{} is not set",
                crate::context::CONTEXT_ENV
            )));
        }
        Ok(context.workspace()?)
    }

    /// Mark `workspace` current in this process.
    pub fn set_current_workspace(&self, workspace: WorkspaceRef) {
        debug!(workspace = %workspace, "Marking workspace current");
        *lock(&self.current) = Some(workspace);
    }

    /// Resolve a mapset name to a workspace in the current location.
    pub fn workspace(&self, mapset: &str) -> EngineResult<WorkspaceRef> {
        Ok(self.current_workspace()?.sibling(mapset))
    }

    /// Run a module and fail on non-zero status.
    pub fn run(&self, call: &ModuleCall) -> EngineResult<CommandOutput> {
        self.checked(call, None)
    }

    /// Run a module and return its standard output.
    pub fn read(&self, call: &ModuleCall) -> EngineResult<String> {
        Ok(self.checked(call, None)?.stdout)
    }

    /// Run a module with `input` on standard input and return its output.
    pub fn pipe(&self, call: &ModuleCall, input: &str) -> EngineResult<String> {
        Ok(self.checked(call, Some(input))?.stdout)
    }

    pub fn create_location(&self, request: &NewLocation) -> EngineResult<()> {
        self.engine.create_location(request)
    }

    fn checked(&self, call: &ModuleCall, stdin: Option<&str>) -> EngineResult<CommandOutput> {
        let context = self.context();
        let output = self.engine.execute(&context, call, stdin)?;
        if !output.is_success() {
            return Err(EngineError::CommandFailed {
                module: call.module().to_string(),
                status: output.status,
                stderr: output.stderr.trim().to_string(),
            });
        }
        Ok(output)
    }

    /// Claim the session for a context-switching operation.
    ///
    /// Returns `None` while another slot is held.
    pub fn acquire_export_slot(&self) -> Option<ExportSlot<'_>> {
        self.export_active
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| ExportSlot { session: self })
    }

    pub fn export_in_progress(&self) -> bool {
        self.export_active.load(Ordering::Acquire)
    }
}

/// Held for the duration of one export; released on drop.
pub struct ExportSlot<'a> {
    session: &'a Session,
}

impl Drop for ExportSlot<'_> {
    fn drop(&mut self) {
        self.session.export_active.store(false, Ordering::Release);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    impl Engine for Echo {
        fn execute(
            &self,
            context: &ProcessContext,
            call: &ModuleCall,
            stdin: Option<&str>,
        ) -> EngineResult<CommandOutput> {
            if call.module() == "fail" {
                return Ok(CommandOutput::failure(2, "ERROR: bad input\n"));
            }
            let rc = context
                .context_file
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default();
            Ok(CommandOutput::success(format!("{}|{}", rc, stdin.unwrap_or(""))))
        }

        fn create_location(&self, _request: &NewLocation) -> EngineResult<()> {
            Ok(())
        }
    }

    fn session() -> Session {
        Session::new(Arc::new(Echo), ProcessContext::new("/tmp/rc-a"))
    }

    #[test]
    fn test_non_zero_status_becomes_error() {
        let err = session().run(&ModuleCall::new("fail")).unwrap_err();
        match err {
            EngineError::CommandFailed {
                module,
                status,
                stderr,
            } => {
                assert_eq!(module, "fail");
                assert_eq!(status, 2);
                assert_eq!(stderr, "ERROR: bad input");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_calls_see_replaced_context() {
        let session = session();
        assert_eq!(session.read(&ModuleCall::new("x")).unwrap(), "/tmp/rc-a|");
        let previous = session.replace_context(ProcessContext::new("/tmp/rc-b"));
        assert_eq!(previous, ProcessContext::new("/tmp/rc-a"));
        assert_eq!(session.pipe(&ModuleCall::new("x"), "1 2").unwrap(), "/tmp/rc-b|1 2");
    }

    #[test]
    fn test_take_region_override() {
        let session = Session::new(
            Arc::new(Echo),
            ProcessContext::new("/tmp/rc-a").with_region_override("saved"),
        );
        assert_eq!(session.take_region_override().as_deref(), Some("saved"));
        assert_eq!(session.context().region_override, None);
    }

    #[test]
    fn test_export_slot_is_exclusive() {
        let session = session();
        let slot = session.acquire_export_slot().unwrap();
        assert!(session.export_in_progress());
        assert!(session.acquire_export_slot().is_none());
        drop(slot);
        assert!(!session.export_in_progress());
        assert!(session.acquire_export_slot().is_some());
    }

    #[test]
    fn test_current_workspace_without_context() {
        let session = Session::new(Arc::new(Echo), ProcessContext::default());
        assert!(matches!(
            session.current_workspace(),
            Err(EngineError::NoContext(_))
        ));
        session.set_current_workspace(WorkspaceRef::new("/g", "loc", "user"));
        assert_eq!(session.workspace("PERMANENT").unwrap().mapset, "PERMANENT");
    }
}
