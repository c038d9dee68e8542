//! Batch dispatcher: one external plotting command per input file, bounded
//! by a fixed-size worker pool.
//!
//! # Architecture
//!
//! ```text
//! glob pattern
//!   ↓
//! discover() → Vec<InputFile>            (sorted, labelled)
//!   ↓
//! build_tasks() → Vec<BatchTask>         (indexed in input order)
//!   ↓
//! WorkerPool::submit() → Vec<PendingOutcome>
//!   ↓
//! PendingOutcome::wait() in order → Vec<TaskOutcome>
//! ```

mod engine;
mod output;
mod process;
mod progress;
mod scheduler;
pub mod traits;
pub mod types;

pub use engine::BatchDispatcher;
pub use output::{emit_json, JsonlEvent};
pub use process::ProcessRunner;
pub use progress::ProgressMonitor;
pub use scheduler::{run_tasks, PendingOutcome, WorkerPool};
pub use traits::TaskRunner;
pub use types::{
    build_tasks, BatchReport, BatchTask, CommandSpec, ExecutionOpts, InputFile, OutcomeStatus,
    OutputMode, TaskOutcome,
};
