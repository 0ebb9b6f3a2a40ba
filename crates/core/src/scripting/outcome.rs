//! Terminal state of an execution record.
//!
//! Every way a run can end (clean exit, non-zero exit, timeout, spawn
//! failure, unknown kind, scheduling failure, a crashed job) is folded into one
//! [`ExecutionOutcome`] so the store writes a single shape.

use std::fmt;

use super::executor::{ScriptError, ScriptOutput};
use super::status::ExecutionStatus;

/// Values written to a record when it leaves `running`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionOutcome {
    pub status: ExecutionStatus,
    /// Combined stdout/stderr. Kept on failure.
    pub output: String,
    /// Failure detail, present only when `status` is `failed`.
    pub error_message: Option<String>,
    pub exit_code: Option<i32>,
    pub duration_ms: Option<i64>,
}

impl ExecutionOutcome {
    /// Fold the runner's result into a terminal outcome.
    pub fn from_run(result: Result<ScriptOutput, ScriptError>) -> Self {
        match result {
            Ok(run) if run.success => Self {
                status: ExecutionStatus::Success,
                output: run.output,
                error_message: None,
                exit_code: run.exit_code,
                duration_ms: Some(to_i64(run.duration_ms)),
            },
            Ok(run) => Self {
                status: ExecutionStatus::Failed,
                error_message: Some(describe_exit(run.exit_code)),
                output: run.output,
                exit_code: run.exit_code,
                duration_ms: Some(to_i64(run.duration_ms)),
            },
            Err(err) => {
                let message = err.to_string();
                let (output, duration_ms) = match err {
                    ScriptError::Timeout {
                        output, elapsed_ms, ..
                    }
                    | ScriptError::Cancelled { output, elapsed_ms } => {
                        (output, Some(to_i64(elapsed_ms)))
                    }
                    _ => (String::new(), None),
                };
                Self {
                    status: ExecutionStatus::Failed,
                    output,
                    error_message: Some(message),
                    exit_code: None,
                    duration_ms,
                }
            }
        }
    }

    /// Outcome for a job the worker pool refused.
    pub fn scheduling_failed(reason: impl fmt::Display) -> Self {
        Self {
            status: ExecutionStatus::Failed,
            output: String::new(),
            error_message: Some(format!("could not schedule: {reason}")),
            exit_code: None,
            duration_ms: None,
        }
    }

    /// Outcome for a job whose task panicked before it produced a result.
    pub fn aborted() -> Self {
        Self {
            status: ExecutionStatus::Failed,
            output: String::new(),
            error_message: Some("execution aborted: worker task panicked".to_string()),
            exit_code: None,
            duration_ms: None,
        }
    }
}

fn describe_exit(exit_code: Option<i32>) -> String {
    match exit_code {
        Some(code) => format!("process exited with status {code}"),
        None => "process terminated by signal".to_string(),
    }
}

fn to_i64(ms: u64) -> i64 {
    i64::try_from(ms).unwrap_or(i64::MAX)
}
