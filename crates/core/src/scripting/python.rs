//! Python script executor.
//!
//! Runs the stored source inline with `-c`. The interpreter binary differs
//! by platform but the behaviour does not.

use super::executor::{RunOptions, ScriptError, ScriptExecutor, ScriptOutput};
use super::subprocess;

/// Interpreter used when none is configured.
#[cfg(windows)]
pub const DEFAULT_PYTHON: &str = "python";
#[cfg(not(windows))]
pub const DEFAULT_PYTHON: &str = "python3";

/// Executor for Python scripts.
pub struct PythonExecutor {
    interpreter: String,
}

impl PythonExecutor {
    /// Create an executor that launches `interpreter` (a name on `PATH` or a path).
    pub fn new(interpreter: impl Into<String>) -> Self {
        Self {
            interpreter: interpreter.into(),
        }
    }
}

impl Default for PythonExecutor {
    fn default() -> Self {
        Self::new(DEFAULT_PYTHON)
    }
}

impl ScriptExecutor for PythonExecutor {
    async fn execute(
        &self,
        source: &str,
        options: &RunOptions,
    ) -> Result<ScriptOutput, ScriptError> {
        let mut cmd = tokio::process::Command::new(&self.interpreter);
        cmd.arg("-c").arg(source);
        subprocess::run_command(cmd, options).await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
