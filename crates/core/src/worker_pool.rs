//! Bounded worker pool.
//!
//! A fixed number of long-lived tokio tasks pull jobs from one bounded
//! queue. Submitting never blocks: a full queue is reported to the caller
//! immediately. Jobs are started in submission order.
//!
//! Shutdown closes the queue, lets the workers drain what was already
//! accepted, and after a grace period cancels the token handed to every
//! job so running processes get killed.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Default number of jobs that may wait for a free worker.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// Pool sizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolConfig {
    /// Number of jobs that may run at the same time.
    pub workers: usize,
    /// Number of accepted jobs that may wait for a worker.
    pub queue_capacity: usize,
}

impl PoolConfig {
    /// One worker per available CPU.
    pub fn with_cpu_workers() -> Self {
        let workers = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        Self {
            workers,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }

    pub fn validate(&self) -> Result<(), PoolConfigError> {
        if self.workers == 0 {
            return Err(PoolConfigError::NoWorkers);
        }
        if self.queue_capacity == 0 {
            return Err(PoolConfigError::NoQueue);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PoolConfigError {
    #[error("worker pool size must be at least 1")]
    NoWorkers,
    #[error("worker queue capacity must be at least 1")]
    NoQueue,
}

/// Why a job was not accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SubmitError {
    #[error("worker queue is full")]
    QueueFull,
    #[error("worker pool is shut down")]
    Closed,
}

/// A fixed set of workers consuming jobs of type `J`.
pub struct WorkerPool<J> {
    sender: Mutex<Option<mpsc::Sender<J>>>,
    handles: Mutex<Vec<JoinHandle<()>>>,
    cancel: CancellationToken,
    queued: Arc<AtomicUsize>,
    in_flight: Arc<AtomicUsize>,
    config: PoolConfig,
}

impl<J: Send + 'static> WorkerPool<J> {
    /// Spawn `config.workers` tasks that run `handler` for each job.
    ///
    /// The handler receives a token that is cancelled when shutdown gives
    /// up waiting. Must be called from within a tokio runtime.
    pub fn start<F, Fut>(config: PoolConfig, handler: F) -> Result<Self, PoolConfigError>
    where
        F: Fn(J, CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        config.validate()?;

        let (sender, receiver) = mpsc::channel(config.queue_capacity);
        let receiver = Arc::new(tokio::sync::Mutex::new(receiver));
        let handler = Arc::new(handler);
        let cancel = CancellationToken::new();
        let queued = Arc::new(AtomicUsize::new(0));
        let in_flight = Arc::new(AtomicUsize::new(0));

        let handles = (0..config.workers)
            .map(|worker_id| {
                tokio::spawn(worker_loop(
                    worker_id,
                    Arc::clone(&receiver),
                    Arc::clone(&handler),
                    cancel.clone(),
                    Arc::clone(&queued),
                    Arc::clone(&in_flight),
                ))
            })
            .collect();

        tracing::info!(
            workers = config.workers,
            queue_capacity = config.queue_capacity,
            "Worker pool started"
        );

        Ok(Self {
            sender: Mutex::new(Some(sender)),
            handles: Mutex::new(handles),
            cancel,
            queued,
            in_flight,
            config,
        })
    }

    /// Hand a job to the pool without waiting for queue space.
    pub fn try_submit(&self, job: J) -> Result<(), SubmitError> {
        let guard = self.sender.lock().unwrap_or_else(PoisonError::into_inner);
        let sender = guard.as_ref().ok_or(SubmitError::Closed)?;
        // Counted before sending so a fast worker never decrements first.
        self.queued.fetch_add(1, Ordering::SeqCst);
        sender.try_send(job).map_err(|e| {
            self.queued.fetch_sub(1, Ordering::SeqCst);
            match e {
                mpsc::error::TrySendError::Full(_) => SubmitError::QueueFull,
                mpsc::error::TrySendError::Closed(_) => SubmitError::Closed,
            }
        })
    }

    /// Stop accepting jobs and wait for the accepted ones.
    ///
    /// Queued and running jobs get `grace` to finish. After that their
    /// cancellation token fires and this waits for the workers to wind
    /// down. Calling it twice is harmless.
    pub async fn shutdown(&self, grace: Duration) {
        self.sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let mut handles =
            std::mem::take(&mut *self.handles.lock().unwrap_or_else(PoisonError::into_inner));

        tracing::info!(
            queued = self.queued(),
            in_flight = self.in_flight(),
            "Worker pool draining"
        );

        if tokio::time::timeout(grace, join_remaining(&mut handles))
            .await
            .is_err()
        {
            tracing::warn!(
                grace_secs = grace.as_secs(),
                remaining = self.queued() + self.in_flight(),
                "Worker pool grace period elapsed, cancelling running jobs"
            );
            self.cancel.cancel();
            join_remaining(&mut handles).await;
        }

        tracing::info!("Worker pool stopped");
    }

    /// Jobs accepted but not yet picked up by a worker.
    pub fn queued(&self) -> usize {
        self.queued.load(Ordering::SeqCst)
    }

    /// Jobs currently being handled.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub fn workers(&self) -> usize {
        self.config.workers
    }
}

async fn worker_loop<J, F, Fut>(
    worker_id: usize,
    receiver: Arc<tokio::sync::Mutex<mpsc::Receiver<J>>>,
    handler: Arc<F>,
    cancel: CancellationToken,
    queued: Arc<AtomicUsize>,
    in_flight: Arc<AtomicUsize>,
) where
    J: Send + 'static,
    F: Fn(J, CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    loop {
        // The lock is held only while waiting for the next job.
        let job = receiver.lock().await.recv().await;
        let Some(job) = job else {
            break;
        };
        queued.fetch_sub(1, Ordering::SeqCst);
        in_flight.fetch_add(1, Ordering::SeqCst);

        // A panicking job must not take the worker down with it.
        let task = tokio::spawn((*handler)(job, cancel.child_token()));
        if let Err(e) = task.await {
            if e.is_panic() {
                tracing::error!(worker_id, "Job panicked");
            }
        }

        in_flight.fetch_sub(1, Ordering::SeqCst);
    }
    tracing::debug!(worker_id, "Worker exiting");
}

async fn join_remaining(handles: &mut Vec<JoinHandle<()>>) {
    while let Some(handle) = handles.last_mut() {
        if let Err(e) = handle.await {
            tracing::error!(error = %e, "Worker task failed");
        }
        handles.pop();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
