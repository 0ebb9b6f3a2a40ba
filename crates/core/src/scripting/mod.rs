//! Script execution domain logic.
//!
//! Provides the executor trait and its shell and Python implementations,
//! the kind dispatcher, and the execution status state machine. All
//! subprocess management is pure (no DB access) and lives in the `core`
//! crate for isolation and testability.

pub mod executor;
pub mod outcome;
pub mod python;
pub mod runner;
pub mod shell;
pub mod status;
pub mod subprocess;
