use async_trait::async_trait;

use crate::executor::types::{BatchTask, TaskOutcome};

/// Executes the body of one task.
///
/// Implementations never fail: every way a task can go wrong is folded into
/// the returned outcome so sibling tasks are unaffected.
#[async_trait]
pub trait TaskRunner: Send + Sync {
    fn name(&self) -> &str;

    async fn run(&self, task: &BatchTask) -> TaskOutcome;
}
