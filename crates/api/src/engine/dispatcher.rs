//! Run-request dispatcher.
//!
//! [`Dispatcher::submit`] creates the execution record synchronously, so the
//! caller gets an id straight away, then hands the run to the bounded worker
//! pool. Each worker runs the script snapshot it was given and writes the
//! terminal state back to the record.
//!
//! Failures after the record exists (unknown kind, spawn failure, non-zero
//! exit, timeout, a full queue) end up in the record, not in the response.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use runlet_core::error::CoreError;
use runlet_core::scripting::executor::RunOptions;
use runlet_core::scripting::outcome::ExecutionOutcome;
use runlet_core::scripting::runner::ScriptRunner;
use runlet_core::scripting::status::ExecutionStatus;
use runlet_core::types::DbId;
use runlet_core::worker_pool::{PoolConfig, PoolConfigError, WorkerPool};
use runlet_db::models::execution::{CreateExecution, Execution};
use runlet_db::repositories::{ExecutionRepo, ScriptRepo};
use runlet_db::DbPool;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::error::{AppError, AppResult};

/// Failure detail for records left `running` by a previous server process.
pub const ABANDONED_DETAIL: &str = "server stopped before the execution finished";

/// Unit of work handed to a worker.
///
/// Carries the script as it was at submission so later edits or deletion
/// cannot change what runs.
#[derive(Debug, Clone)]
pub struct ExecutionJob {
    pub execution_id: DbId,
    pub script_id: DbId,
    pub script_type: String,
    pub content: String,
}

/// Result of an accepted run request.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Submitted {
    pub execution_id: DbId,
    /// `running`, or `failed` when the job could not be scheduled.
    pub status: ExecutionStatus,
}

/// Accepts run requests and owns the worker pool that executes them.
pub struct Dispatcher {
    pool: DbPool,
    workers: WorkerPool<ExecutionJob>,
}

impl Dispatcher {
    /// Start the worker pool. Must be called from within a tokio runtime.
    pub fn start(
        pool: DbPool,
        config: PoolConfig,
        runner: ScriptRunner,
        script_timeout: Option<Duration>,
    ) -> Result<Self, PoolConfigError> {
        let runner = Arc::new(runner);
        let worker_db = pool.clone();

        let workers = WorkerPool::start(config, move |job: ExecutionJob, cancel| {
            let pool = worker_db.clone();
            let runner = Arc::clone(&runner);
            async move {
                run_job(&pool, runner, job, script_timeout, cancel).await;
            }
        })?;

        Ok(Self { pool, workers })
    }

    /// Fail records that were still `running` when the last server stopped.
    ///
    /// Must run before [`Dispatcher::start`]; no worker can own those
    /// records any more.
    pub async fn fail_abandoned(pool: &DbPool) -> AppResult<u64> {
        let failed = ExecutionRepo::fail_abandoned(pool, ABANDONED_DETAIL).await?;
        if failed > 0 {
            tracing::warn!(count = failed, "Marked abandoned executions as failed");
        }
        Ok(failed)
    }

    /// Create a `running` record for the script and queue it.
    ///
    /// A missing or deleted script is `NotFound` and creates no record. If
    /// the pool refuses the job the record is immediately finished as
    /// `failed` and still returned.
    pub async fn submit(&self, script_id: DbId) -> AppResult<Submitted> {
        let script = ScriptRepo::find_by_id(&self.pool, script_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "script",
                id: script_id,
            })?;

        let record = ExecutionRepo::create(
            &self.pool,
            &CreateExecution::for_script(script.id, &script.name, &script.script_type),
        )
        .await?;

        let job = ExecutionJob {
            execution_id: record.id,
            script_id: script.id,
            script_type: script.script_type,
            content: script.content,
        };

        match self.workers.try_submit(job) {
            Ok(()) => {
                tracing::info!(
                    execution_id = record.id,
                    script_id,
                    queued = self.workers.queued(),
                    "Execution queued"
                );
                Ok(Submitted {
                    execution_id: record.id,
                    status: ExecutionStatus::Running,
                })
            }
            Err(e) => {
                tracing::warn!(
                    execution_id = record.id,
                    script_id,
                    error = %e,
                    "Execution could not be scheduled"
                );
                let outcome = ExecutionOutcome::scheduling_failed(e);
                // The caller still gets the id; a record left `running` here
                // is closed out by `fail_abandoned` on the next start.
                if let Err(e) = ExecutionRepo::finish(&self.pool, record.id, &outcome).await {
                    tracing::error!(
                        execution_id = record.id,
                        error = %e,
                        "Failed to record scheduling failure"
                    );
                }
                Ok(Submitted {
                    execution_id: record.id,
                    status: ExecutionStatus::Failed,
                })
            }
        }
    }

    /// Submit the script of an existing record again as a new record.
    pub async fn rerun(&self, execution_id: DbId) -> AppResult<Submitted> {
        let previous = self.get(execution_id).await?;
        tracing::debug!(execution_id, script_id = previous.script_id, "Rerunning execution");
        self.submit(previous.script_id).await
    }

    pub async fn get(&self, execution_id: DbId) -> AppResult<Execution> {
        ExecutionRepo::find_by_id(&self.pool, execution_id)
            .await?
            .ok_or_else(|| {
                AppError::Core(CoreError::NotFound {
                    entity: "execution",
                    id: execution_id,
                })
            })
    }

    /// Newest first, optionally for one script.
    pub async fn list(&self, script_id: Option<DbId>) -> AppResult<Vec<Execution>> {
        Ok(ExecutionRepo::list(&self.pool, script_id).await?)
    }

    /// Soft-delete a record in any state. A running process is not stopped.
    pub async fn delete(&self, execution_id: DbId) -> AppResult<()> {
        if !ExecutionRepo::soft_delete(&self.pool, execution_id).await? {
            return Err(AppError::Core(CoreError::NotFound {
                entity: "execution",
                id: execution_id,
            }));
        }
        Ok(())
    }

    /// Stop accepting runs and wait up to `grace` for queued and running
    /// ones; whatever is left is killed and recorded as cancelled.
    pub async fn shutdown(&self, grace: Duration) {
        self.workers.shutdown(grace).await;
    }

    pub fn workers(&self) -> usize {
        self.workers.workers()
    }

    pub fn queued(&self) -> usize {
        self.workers.queued()
    }

    pub fn in_flight(&self) -> usize {
        self.workers.in_flight()
    }
}

/// Run one job and persist its terminal state. Never panics on store errors.
async fn run_job(
    pool: &DbPool,
    runner: Arc<ScriptRunner>,
    job: ExecutionJob,
    script_timeout: Option<Duration>,
    cancel: CancellationToken,
) {
    let ExecutionJob {
        execution_id,
        script_id,
        script_type,
        content,
    } = job;
    tracing::debug!(execution_id, script_id, script_type = %script_type, "Execution started");

    let options = RunOptions::new(script_timeout).with_cancel(cancel);
    let outcome = run_guarded(execution_id, async move {
        ExecutionOutcome::from_run(runner.run(&script_type, &content, &options).await)
    })
    .await;

    persist_outcome(pool, execution_id, script_id, &outcome).await;
}

/// Drive `run` in its own task so a panic still produces a failed outcome.
async fn run_guarded<F>(execution_id: DbId, run: F) -> ExecutionOutcome
where
    F: Future<Output = ExecutionOutcome> + Send + 'static,
{
    match tokio::spawn(run).await {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::error!(execution_id, error = %e, "Execution task failed");
            ExecutionOutcome::aborted()
        }
    }
}

async fn persist_outcome(
    pool: &DbPool,
    execution_id: DbId,
    script_id: DbId,
    outcome: &ExecutionOutcome,
) {
    match ExecutionRepo::finish(pool, execution_id, outcome).await {
        Ok(true) => tracing::info!(
            execution_id,
            script_id,
            status = %outcome.status,
            duration_ms = outcome.duration_ms,
            "Execution finished"
        ),
        Ok(false) => tracing::warn!(
            execution_id,
            "Execution record missing or already finished, result dropped"
        ),
        Err(e) => tracing::error!(
            execution_id,
            status = %outcome.status,
            error = %e,
            "Failed to persist execution result"
        ),
    }
}
