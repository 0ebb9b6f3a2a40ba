//! Zero-sized repositories. Every method takes `&DbPool` first.

mod execution_repo;
mod script_repo;
mod user_repo;

pub use execution_repo::ExecutionRepo;
pub use script_repo::ScriptRepo;
pub use user_repo::UserRepo;
