//! Spatial engine command execution.
//!
//! The engine is an external program suite: every operation is a named
//! module run as a child process with `key=value` parameters. This crate
//! provides:
//!
//! - [`Engine`]: the execution seam, with [`ProcessEngine`] running real
//!   child processes
//! - [`ProcessContext`]: the active workspace connection and region override
//!   handed to every child process
//! - [`Session`]: an execution context object that owns the process context,
//!   remembers the in-process current workspace and hands out the single
//!   export slot

pub mod command;
pub mod context;
pub mod engine;
pub mod error;
pub mod process;
pub mod session;
pub mod workspace;

pub use command::{CommandOutput, ModuleCall};
pub use context::{ContextFile, ProcessContext, CONTEXT_ENV, REGION_OVERRIDE_ENV};
pub use engine::{Engine, NewLocation};
pub use error::{EngineError, EngineResult};
pub use process::{ProcessEngine, ProcessEngineConfig};
pub use session::{ExportSlot, Session};
pub use workspace::WorkspaceRef;
