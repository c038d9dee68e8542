use std::path::PathBuf;

use serde::Serialize;

/// How a single task ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OutcomeStatus {
    Succeeded,
    /// Non-zero exit. `exit_code` is `None` when the process was killed by a
    /// signal.
    Failed { exit_code: Option<i32> },
    SpawnFailed { error: String },
    TimedOut { after_ms: u64 },
}

impl OutcomeStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded)
    }
}

impl std::fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Succeeded => write!(f, "ok"),
            Self::Failed {
                exit_code: Some(code),
            } => write!(f, "exit code {code}"),
            Self::Failed { exit_code: None } => write!(f, "terminated by signal"),
            Self::SpawnFailed { error } => write!(f, "failed to start: {error}"),
            Self::TimedOut { after_ms } => write!(f, "timed out after {after_ms}ms"),
        }
    }
}

/// Result of running one task.
#[derive(Debug, Clone, Serialize)]
pub struct TaskOutcome {
    pub index: usize,
    pub path: PathBuf,
    pub label: String,
    #[serde(flatten)]
    pub status: OutcomeStatus,
    pub duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stdout_tail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stderr_tail: Option<String>,
}

impl TaskOutcome {
    pub fn new(task: &super::BatchTask, status: OutcomeStatus, duration_ms: u64) -> Self {
        Self {
            index: task.index,
            path: task.input.path.clone(),
            label: task.input.label.clone(),
            status,
            duration_ms,
            stdout_tail: None,
            stderr_tail: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

/// Aggregate of a whole batch run.
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub run_id: String,
    /// One entry per task, in submission order.
    pub outcomes: Vec<TaskOutcome>,
    pub duration_ms: u64,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.total() - self.succeeded()
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    pub fn failures(&self) -> impl Iterator<Item = &TaskOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success())
    }
}
