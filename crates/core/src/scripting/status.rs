//! Execution record lifecycle.
//!
//! A record is created `running` and moves exactly once to a terminal
//! state. There is no observable pending state: creation and the start of
//! the run are one step from the caller's point of view.
//!
//! The string forms must match the `status` CHECK constraint in
//! `0002_create_executions.sql`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub const EXECUTION_RUNNING: &str = "running";
pub const EXECUTION_SUCCESS: &str = "success";
pub const EXECUTION_FAILED: &str = "failed";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStatus {
    Running,
    Success,
    Failed,
}

impl ExecutionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ExecutionStatus::Running => EXECUTION_RUNNING,
            ExecutionStatus::Success => EXECUTION_SUCCESS,
            ExecutionStatus::Failed => EXECUTION_FAILED,
        }
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, ExecutionStatus::Running)
    }

    /// Whether a record in `self` may move to `next`.
    ///
    /// Only `running -> success` and `running -> failed` are legal.
    pub fn can_transition_to(self, next: ExecutionStatus) -> bool {
        self == ExecutionStatus::Running && next.is_terminal()
    }
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExecutionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            EXECUTION_RUNNING => Ok(ExecutionStatus::Running),
            EXECUTION_SUCCESS => Ok(ExecutionStatus::Success),
            EXECUTION_FAILED => Ok(ExecutionStatus::Failed),
            other => Err(format!("unknown execution status: {other}")),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
