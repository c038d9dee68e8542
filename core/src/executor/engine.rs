use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use indicatif::MultiProgress;
use uuid::Uuid;

use crate::config::BatchConfig;
use crate::discover::discover;
use crate::error::ExecutorError;

use super::output::{emit_batch_end, emit_batch_start, emit_task_end, emit_task_submit};
use super::process::ProcessRunner;
use super::progress::ProgressMonitor;
use super::scheduler::run_tasks;
use super::traits::TaskRunner;
use super::types::{
    build_tasks, BatchReport, BatchTask, CommandSpec, ExecutionOpts, InputFile, TaskOutcome,
};

/// Discovers inputs and fans the plotting command out over them.
pub struct BatchDispatcher {
    pattern: String,
    command: CommandSpec,
    opts: ExecutionOpts,
    runner: Arc<dyn TaskRunner>,
    progress_target: Option<MultiProgress>,
}

impl BatchDispatcher {
    /// Dispatcher spawning real processes as described by `cfg`.
    pub fn from_config(cfg: &BatchConfig) -> Self {
        let opts = ExecutionOpts::from_batch_config(cfg);
        let runner = Arc::new(ProcessRunner::new(&opts));
        Self {
            pattern: cfg.pattern.clone(),
            command: cfg.command.clone(),
            opts,
            runner,
            progress_target: None,
        }
    }

    /// Replace the task body, e.g. with an instrumented fake.
    pub fn with_runner(mut self, runner: Arc<dyn TaskRunner>) -> Self {
        self.runner = runner;
        self
    }

    /// Draw progress bars into a caller-owned `MultiProgress`.
    pub fn with_progress_target(mut self, multi: MultiProgress) -> Self {
        self.progress_target = Some(multi);
        self
    }

    /// Discover inputs and build their tasks without running anything.
    pub fn plan(&self) -> Result<Vec<BatchTask>, ExecutorError> {
        let inputs = discover(&self.pattern)?;
        Ok(build_tasks(inputs, &self.command))
    }

    /// Run one task per input with at most `concurrency_limit` running at
    /// once. Outcomes come back in input order after every task ended.
    pub async fn run_batch(
        &self,
        inputs: Vec<InputFile>,
        concurrency_limit: usize,
    ) -> Result<Vec<TaskOutcome>, ExecutorError> {
        if concurrency_limit == 0 {
            return Err(ExecutorError::InvalidConcurrency(concurrency_limit));
        }
        let tasks = build_tasks(inputs, &self.command);
        run_tasks(tasks, concurrency_limit, self.runner.clone()).await
    }

    /// Discover, run and report a whole batch.
    pub async fn dispatch(&self) -> Result<BatchReport, ExecutorError> {
        if self.opts.max_parallel == 0 {
            return Err(ExecutorError::InvalidConcurrency(0));
        }

        let run_id = Uuid::new_v4().to_string();
        let start = Instant::now();
        let tasks = self.plan()?;

        if tasks.is_empty() {
            tracing::warn!("No input files match '{}'", self.pattern);
        }
        emit_batch_start(
            &self.opts,
            &run_id,
            self.runner.name(),
            &self.pattern,
            tasks.len(),
        );

        let target = self.progress_target.clone().unwrap_or_else(MultiProgress::new);
        let progress = Arc::new(ProgressMonitor::with_target(
            target,
            tasks.len(),
            self.opts.progress_bar,
        ));
        for task in &tasks {
            tracing::debug!("Submitting task {}: {}", task.index, task.display_command());
            emit_task_submit(&self.opts, &run_id, task, &progress);
        }

        let observed: Arc<dyn TaskRunner> = Arc::new(ObservedRunner {
            inner: self.runner.clone(),
            opts: self.opts.clone(),
            run_id: run_id.clone(),
            progress: progress.clone(),
        });
        let outcomes = run_tasks(tasks, self.opts.max_parallel, observed).await?;

        let report = BatchReport {
            run_id,
            outcomes,
            duration_ms: start.elapsed().as_millis() as u64,
        };

        progress.finish(report.is_success());
        emit_batch_end(&self.opts, &report, &progress);
        if !report.is_success() {
            tracing::warn!("{} of {} tasks failed", report.failed(), report.total());
        }

        Ok(report)
    }
}

/// Wraps a runner with progress and per-task event output.
struct ObservedRunner {
    inner: Arc<dyn TaskRunner>,
    opts: ExecutionOpts,
    run_id: String,
    progress: Arc<ProgressMonitor>,
}

#[async_trait]
impl TaskRunner for ObservedRunner {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn run(&self, task: &BatchTask) -> TaskOutcome {
        self.progress.start_task(task.index, task.label());
        let outcome = self.inner.run(task).await;
        self.progress.complete_task(task.index, outcome.is_success());
        emit_task_end(&self.opts, &self.run_id, &outcome);
        outcome
    }
}
