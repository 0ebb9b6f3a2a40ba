//! Script runtime kinds.
//!
//! Scripts are stored with a free-text `script_type`. Only the names below
//! can be executed; anything else is accepted at registration time and
//! fails when a run is attempted.

use std::fmt;
use std::str::FromStr;

/// Shell runtime (executed via `bash -c`).
pub const SCRIPT_TYPE_SHELL: &str = "shell";

/// Python runtime (executed via `python3 -c`).
pub const SCRIPT_TYPE_PYTHON: &str = "python";

/// A script runtime the process runner knows how to launch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScriptKind {
    Python,
    Shell,
}

impl ScriptKind {
    /// Every supported kind, in display order.
    pub const ALL: [ScriptKind; 2] = [ScriptKind::Python, ScriptKind::Shell];

    pub fn as_str(self) -> &'static str {
        match self {
            ScriptKind::Python => SCRIPT_TYPE_PYTHON,
            ScriptKind::Shell => SCRIPT_TYPE_SHELL,
        }
    }
}

impl fmt::Display for ScriptKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a stored `script_type` names no known runtime.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported script type: {0}")]
pub struct UnsupportedKind(pub String);

impl FromStr for ScriptKind {
    type Err = UnsupportedKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            SCRIPT_TYPE_PYTHON => Ok(ScriptKind::Python),
            SCRIPT_TYPE_SHELL => Ok(ScriptKind::Shell),
            other => Err(UnsupportedKind(other.to_string())),
        }
    }
}
