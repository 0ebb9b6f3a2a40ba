//! Kind-to-executor dispatch.

use super::executor::{RunOptions, ScriptError, ScriptExecutor, ScriptOutput};
use super::python::PythonExecutor;
use super::shell::ShellExecutor;
use crate::script_types::ScriptKind;

/// Maps a stored `script_type` to the executor for that runtime.
#[derive(Default)]
pub struct ScriptRunner {
    shell: ShellExecutor,
    python: PythonExecutor,
}

impl ScriptRunner {
    pub fn new(python: PythonExecutor) -> Self {
        Self {
            shell: ShellExecutor,
            python,
        }
    }

    /// Run `source` with the runtime named by `script_type`.
    ///
    /// An unknown type fails with [`ScriptError::UnsupportedKind`] before
    /// anything is spawned.
    pub async fn run(
        &self,
        script_type: &str,
        source: &str,
        options: &RunOptions,
    ) -> Result<ScriptOutput, ScriptError> {
        let kind: ScriptKind = script_type.parse()?;
        match kind {
            ScriptKind::Shell => self.shell.execute(source, options).await,
            ScriptKind::Python => self.python.execute(source, options).await,
        }
    }
}
