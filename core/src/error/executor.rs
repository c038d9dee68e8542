use thiserror::Error;

use super::discover::DiscoverError;

/// Dispatcher-level errors.
///
/// Task failures are never reported through this type; they are recorded on
/// the task's outcome instead.
#[derive(Error, Debug)]
pub enum ExecutorError {
    #[error("concurrency limit must be at least 1 (got {0})")]
    InvalidConcurrency(usize),

    #[error("discovery failed: {0}")]
    Discover(#[from] DiscoverError),

    #[error("worker pool failure: {0}")]
    Pool(String),
}
