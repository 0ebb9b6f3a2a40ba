pub mod auth;
pub mod executions;
pub mod scripts;
