//! Engine implementation running modules as child processes.

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use serde::Deserialize;
use tracing::debug;

use crate::command::{CommandOutput, ModuleCall};
use crate::context::ProcessContext;
use crate::engine::{Engine, NewLocation};
use crate::error::{EngineError, EngineResult};

/// Settings for [`ProcessEngine`].
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProcessEngineConfig {
    /// Launcher used to create locations (`grass -c EPSG:<code> -e <path>`).
    pub grass_executable: PathBuf,
    /// Directory holding the module executables; `PATH` lookup when unset.
    pub module_dir: Option<PathBuf>,
    /// Pass `--quiet` to every module.
    pub quiet: bool,
}

impl Default for ProcessEngineConfig {
    fn default() -> Self {
        Self {
            grass_executable: PathBuf::from("grass"),
            module_dir: None,
            quiet: true,
        }
    }
}

/// Runs each module as a blocking child process.
#[derive(Debug, Clone, Default)]
pub struct ProcessEngine {
    config: ProcessEngineConfig,
}

impl ProcessEngine {
    pub fn new(config: ProcessEngineConfig) -> Self {
        Self { config }
    }

    fn program(&self, module: &str) -> PathBuf {
        match &self.config.module_dir {
            Some(dir) => dir.join(module),
            None => PathBuf::from(module),
        }
    }
}

impl Engine for ProcessEngine {
    fn execute(
        &self,
        context: &ProcessContext,
        call: &ModuleCall,
        stdin: Option<&str>,
    ) -> EngineResult<CommandOutput> {
        let mut command = Command::new(self.program(call.module()));
        command.args(call.args());
        if self.config.quiet {
            command.arg("--quiet");
        }
        context.apply(&mut command);
        command
            .stdin(if stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        debug!(command = %call, "Running module");

        let launch_error = |source| EngineError::Launch {
            module: call.module().to_string(),
            source,
        };
        let mut child = command.spawn().map_err(launch_error)?;

        if let Some(input) = stdin {
            // Dropping the handle closes the pipe so the module sees EOF.
            if let Some(mut pipe) = child.stdin.take() {
                pipe.write_all(input.as_bytes()).map_err(launch_error)?;
            }
        }

        let output = child.wait_with_output().map_err(launch_error)?;

        Ok(CommandOutput {
            status: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    fn create_location(&self, request: &NewLocation) -> EngineResult<()> {
        let path = request.path();
        debug!(
            location = %path.display(),
            epsg = %request.epsg,
            "Creating location"
        );

        let output = Command::new(&self.config.grass_executable)
            .arg("-c")
            .arg(request.epsg.authority_string())
            .arg("-e")
            .arg(&path)
            .stdin(Stdio::null())
            .output()
            .map_err(|source| EngineError::Launch {
                module: self.config.grass_executable.display().to_string(),
                source,
            })?;

        if !output.status.success() {
            return Err(EngineError::CommandFailed {
                module: self.config.grass_executable.display().to_string(),
                status: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }
        Ok(())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn engine() -> ProcessEngine {
        ProcessEngine::new(ProcessEngineConfig {
            quiet: false,
            ..ProcessEngineConfig::default()
        })
    }

    #[test]
    fn test_stdin_is_piped_through() {
        let output = engine()
            .execute(&ProcessContext::default(), &ModuleCall::new("cat"), Some("10 20\n0 10\n"))
            .unwrap();
        assert!(output.is_success());
        assert_eq!(output.stdout, "10 20\n0 10\n");
    }

    #[test]
    fn test_non_zero_status_is_reported_not_raised() {
        let output = engine()
            .execute(&ProcessContext::default(), &ModuleCall::new("false"), None)
            .unwrap();
        assert!(!output.is_success());
    }

    #[test]
    fn test_context_is_applied_to_child() {
        let context = ProcessContext::new("/tmp/rc-test").with_region_override("tmp_region");
        let output = engine()
            .execute(&context, &ModuleCall::new("env"), None)
            .unwrap();
        assert!(output.stdout.contains("GISRC=/tmp/rc-test"));
        assert!(output.stdout.contains("WIND_OVERRIDE=tmp_region"));
    }

    #[test]
    fn test_missing_module_fails_to_launch() {
        let result = engine().execute(
            &ProcessContext::default(),
            &ModuleCall::new("png-proj-no-such-module"),
            None,
        );
        assert!(matches!(result, Err(EngineError::Launch { .. })));
    }
}
