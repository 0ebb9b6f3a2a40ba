//! Script execution engine: accepts run requests and drives the worker pool.

pub mod dispatcher;
