//! plotbatch-core: discover analysis output files and run a plotting command
//! on each of them with bounded parallelism.

pub mod config;
pub mod discover;
pub mod error;
pub mod executor;
pub mod util;

pub use discover::{discover, label};
pub use executor::{BatchDispatcher, BatchReport, TaskOutcome};
