use chrono::Local;
use serde::Serialize;

use super::progress::ProgressMonitor;
use super::types::{BatchReport, BatchTask, ExecutionOpts, TaskOutcome};

/// One line of JSONL output.
#[derive(Debug, Clone, Serialize)]
pub struct JsonlEvent {
    pub v: i32,
    #[serde(rename = "type")]
    pub event_type: String,
    pub ts: String,
    pub run_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl JsonlEvent {
    fn new(event_type: &str, run_id: &str) -> Self {
        Self {
            v: 1,
            event_type: event_type.to_string(),
            ts: Local::now().to_rfc3339(),
            run_id: run_id.to_string(),
            task: None,
            metadata: None,
        }
    }
}

pub fn emit_json(ev: &JsonlEvent) {
    match serde_json::to_string(ev) {
        Ok(line) => println!("{line}"),
        Err(e) => tracing::warn!("failed to serialize {} event: {}", ev.event_type, e),
    }
}

/// Emit batch start event
pub fn emit_batch_start(
    opts: &ExecutionOpts,
    run_id: &str,
    runner: &str,
    pattern: &str,
    total: usize,
) {
    if opts.is_jsonl() {
        let mut event = JsonlEvent::new("batch.start", run_id);
        event.metadata = Some(serde_json::json!({
            "pattern": pattern,
            "runner": runner,
            "total_tasks": total,
            "max_parallel": opts.max_parallel,
        }));
        emit_json(&event);
    }
    tracing::info!(
        "Batch {}: {} file(s) matched '{}', running up to {} at once ({} runner)",
        run_id,
        total,
        pattern,
        opts.max_parallel,
        runner
    );
}

/// Emit the per-task submission line
pub fn emit_task_submit(
    opts: &ExecutionOpts,
    run_id: &str,
    task: &BatchTask,
    progress: &ProgressMonitor,
) {
    if opts.is_jsonl() {
        let mut event = JsonlEvent::new("task.submit", run_id);
        event.task = Some(serde_json::json!({
            "index": task.index,
            "path": task.input.path,
            "label": task.label(),
            "command": task.display_command(),
        }));
        emit_json(&event);
    } else {
        progress.println(&format!(
            "Running {} on {} with label {}",
            task.command.program,
            task.input.path.display(),
            task.label()
        ));
    }
}

/// Emit task end event
pub fn emit_task_end(opts: &ExecutionOpts, run_id: &str, outcome: &TaskOutcome) {
    if opts.is_jsonl() {
        let mut event = JsonlEvent::new("task.end", run_id);
        event.task = serde_json::to_value(outcome).ok();
        emit_json(&event);
    }
    tracing::debug!(
        "Task {} ({}) finished: {} in {}ms",
        outcome.index,
        outcome.label,
        outcome.status,
        outcome.duration_ms
    );
}

/// Emit batch end event and the failure summary
pub fn emit_batch_end(opts: &ExecutionOpts, report: &BatchReport, progress: &ProgressMonitor) {
    if opts.is_jsonl() {
        let mut event = JsonlEvent::new("batch.end", &report.run_id);
        event.metadata = Some(serde_json::json!({
            "total_tasks": report.total(),
            "succeeded": report.succeeded(),
            "failed": report.failed(),
            "duration_ms": report.duration_ms,
        }));
        emit_json(&event);
        return;
    }

    for failure in report.failures() {
        progress.println(&format!(
            "✗ {} ({}): {}",
            failure.label,
            failure.path.display(),
            failure.status
        ));
    }
    progress.println(&format!(
        "{} of {} file(s) plotted in {}ms",
        report.succeeded(),
        report.total(),
        report.duration_ms
    ));
}
