//! Domain logic for the runlet script runner.
//!
//! Everything in this crate is free of database access: script kinds, the
//! execution status state machine, the process runner, and the bounded
//! worker pool. The `db` and `api` crates build on top of it.

pub mod error;
pub mod script_types;
pub mod scripting;
pub mod types;
pub mod worker_pool;
