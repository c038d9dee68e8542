use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::JoinSet;

use crate::error::ExecutorError;

use super::traits::TaskRunner;
use super::types::{BatchTask, TaskOutcome};

struct Job {
    task: BatchTask,
    reply: oneshot::Sender<TaskOutcome>,
}

/// Fixed-size pool of workers pulling tasks from a FIFO queue.
///
/// The pool is scoped to one batch: dropping it aborts every worker (and,
/// through `kill_on_drop`, any child process a worker is waiting on).
pub struct WorkerPool {
    queue: Option<mpsc::UnboundedSender<Job>>,
    workers: JoinSet<()>,
    size: usize,
}

/// Handle for one submitted task's outcome.
pub struct PendingOutcome {
    index: usize,
    rx: oneshot::Receiver<TaskOutcome>,
}

impl PendingOutcome {
    pub async fn wait(self) -> Result<TaskOutcome, ExecutorError> {
        let index = self.index;
        self.rx.await.map_err(|_| {
            ExecutorError::Pool(format!("task {index} was dropped before completing"))
        })
    }
}

impl WorkerPool {
    pub fn new(size: usize, runner: Arc<dyn TaskRunner>) -> Result<Self, ExecutorError> {
        if size == 0 {
            return Err(ExecutorError::InvalidConcurrency(size));
        }

        let (tx, rx) = mpsc::unbounded_channel::<Job>();
        let rx = Arc::new(Mutex::new(rx));
        let mut workers = JoinSet::new();

        for worker_id in 0..size {
            let rx = rx.clone();
            let runner = runner.clone();
            workers.spawn(async move {
                loop {
                    // Lock only for the dequeue so other workers can pick up
                    // jobs while this one runs.
                    let next = rx.lock().await.recv().await;
                    let Some(job) = next else {
                        break;
                    };

                    tracing::debug!(
                        worker_id,
                        task = job.task.index,
                        label = %job.task.label(),
                        "worker picked up task"
                    );
                    let outcome = runner.run(&job.task).await;
                    // The receiver is gone only if the batch was abandoned.
                    let _ = job.reply.send(outcome);
                }
                tracing::trace!(worker_id, "worker exiting");
            });
        }

        Ok(Self {
            queue: Some(tx),
            workers,
            size,
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Queue `task`. Tasks are admitted in submission order.
    pub fn submit(&self, task: BatchTask) -> Result<PendingOutcome, ExecutorError> {
        let index = task.index;
        let (reply, rx) = oneshot::channel();
        let queue = self
            .queue
            .as_ref()
            .ok_or_else(|| ExecutorError::Pool("pool already shut down".into()))?;
        queue
            .send(Job { task, reply })
            .map_err(|_| ExecutorError::Pool("all workers have exited".into()))?;
        Ok(PendingOutcome { index, rx })
    }

    /// Close the queue and wait for every worker to drain and exit.
    pub async fn shutdown(mut self) -> Result<(), ExecutorError> {
        self.queue.take();

        let mut first_err = None;
        while let Some(res) = self.workers.join_next().await {
            if let Err(e) = res {
                tracing::error!("worker terminated abnormally: {}", e);
                if first_err.is_none() {
                    first_err = Some(ExecutorError::Pool(e.to_string()));
                }
            }
        }

        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

/// Run every task through `runner` with at most `concurrency_limit` tasks
/// in flight.
///
/// Returns once all tasks have terminated. Outcomes are in submission order
/// whatever order they completed in.
pub async fn run_tasks(
    tasks: Vec<BatchTask>,
    concurrency_limit: usize,
    runner: Arc<dyn TaskRunner>,
) -> Result<Vec<TaskOutcome>, ExecutorError> {
    if concurrency_limit == 0 {
        return Err(ExecutorError::InvalidConcurrency(concurrency_limit));
    }
    if tasks.is_empty() {
        return Ok(Vec::new());
    }

    let pool = WorkerPool::new(concurrency_limit.min(tasks.len()), runner)?;

    let mut pending = Vec::with_capacity(tasks.len());
    for task in tasks {
        pending.push(pool.submit(task)?);
    }

    // Join the exact set of handles in submission order. Every handle is
    // awaited before any loss is reported so the batch is always fully joined.
    let joined = join_all(pending.into_iter().map(PendingOutcome::wait)).await;

    let mut outcomes = Vec::with_capacity(joined.len());
    let mut lost = None;
    for res in joined {
        match res {
            Ok(outcome) => outcomes.push(outcome),
            Err(e) => {
                if lost.is_none() {
                    lost = Some(e);
                }
            }
        }
    }

    pool.shutdown().await?;

    match lost {
        Some(e) => Err(e),
        None => Ok(outcomes),
    }
}
