//! Unified script execution interface and shared types.
//!
//! Defines [`ScriptExecutor`], the trait that all runtime executors implement,
//! along with [`RunOptions`], [`ScriptOutput`], and [`ScriptError`].

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::script_types::UnsupportedKind;

/// Per-run limits handed to an executor.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Maximum wall-clock time before the process is killed. `None` means
    /// the process may run for as long as it likes.
    pub timeout: Option<Duration>,
    /// Cancelling this token kills the process.
    pub cancel: CancellationToken,
}

impl RunOptions {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self {
            timeout,
            cancel: CancellationToken::new(),
        }
    }

    /// Replace the cancellation token, typically with a child of a pool-wide token.
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }
}

impl Default for RunOptions {
    fn default() -> Self {
        Self::new(None)
    }
}

/// Captured result of a process that ran to completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptOutput {
    /// Stdout and stderr merged in the order the chunks arrived.
    pub output: String,
    /// Whether the process reported success (exit code 0).
    pub success: bool,
    /// Process exit code, `None` if it was terminated by a signal.
    pub exit_code: Option<i32>,
    /// Wall-clock duration in milliseconds.
    pub duration_ms: u64,
}

/// Reasons a run did not produce a [`ScriptOutput`].
#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    /// The stored script type names no known runtime. No process was spawned.
    #[error(transparent)]
    UnsupportedKind(#[from] UnsupportedKind),

    /// The interpreter could not be launched (missing binary, permission denied).
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The process exceeded its timeout and was killed.
    #[error("timed out after {}s", limit.as_secs())]
    Timeout {
        limit: Duration,
        elapsed_ms: u64,
        /// Whatever the process wrote before it was killed.
        output: String,
    },

    /// The run was cancelled and the process was killed.
    #[error("execution cancelled")]
    Cancelled { elapsed_ms: u64, output: String },

    /// Waiting on the spawned process failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Trait implemented by every script runtime executor.
///
/// Each executor receives the script source inline, spawns the appropriate
/// interpreter, and returns the captured output or an error.
pub trait ScriptExecutor: Send + Sync {
    /// Execute `source` under the limits in `options`.
    fn execute(
        &self,
        source: &str,
        options: &RunOptions,
    ) -> impl std::future::Future<Output = Result<ScriptOutput, ScriptError>> + Send;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
