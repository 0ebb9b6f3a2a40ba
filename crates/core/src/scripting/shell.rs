//! Shell script executor.
//!
//! Spawns `bash -c <source>`, so the stored script text is the command
//! string and nothing is written to disk.

use super::executor::{RunOptions, ScriptError, ScriptExecutor, ScriptOutput};
use super::subprocess;

/// Executor for shell (bash) scripts.
#[derive(Default)]
pub struct ShellExecutor;

impl ScriptExecutor for ShellExecutor {
    async fn execute(
        &self,
        source: &str,
        options: &RunOptions,
    ) -> Result<ScriptOutput, ScriptError> {
        let mut cmd = tokio::process::Command::new("bash");
        cmd.arg("-c").arg(source);
        subprocess::run_command(cmd, options).await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
