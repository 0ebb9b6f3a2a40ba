pub mod execution;
pub mod script;
pub mod user;
