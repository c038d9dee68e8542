use std::time::Duration;

use crate::config::BatchConfig;

use super::task::OutputMode;

/// Runtime options for one dispatch, resolved from [`BatchConfig`].
#[derive(Debug, Clone)]
pub struct ExecutionOpts {
    /// Output stream format: "text" or "jsonl"
    pub stream_format: String,

    /// Maximum parallel tasks
    pub max_parallel: usize,

    pub workdir: Option<String>,

    pub timeout: Option<Duration>,

    pub output: OutputMode,

    /// Bytes to keep from the end of each captured stream
    pub capture_bytes: usize,

    /// Enable visual progress bar (disabled for jsonl output)
    pub progress_bar: bool,
}

impl ExecutionOpts {
    pub fn from_batch_config(cfg: &BatchConfig) -> Self {
        let progress_bar = cfg.progress_bar && cfg.stream_format == "text";

        Self {
            stream_format: cfg.stream_format.clone(),
            max_parallel: cfg.jobs,
            workdir: cfg.workdir.clone(),
            timeout: cfg.timeout_secs.map(Duration::from_secs),
            output: cfg.output,
            capture_bytes: cfg.capture_bytes,
            progress_bar,
        }
    }

    pub fn is_jsonl(&self) -> bool {
        self.stream_format == "jsonl"
    }
}

impl Default for ExecutionOpts {
    fn default() -> Self {
        Self::from_batch_config(&BatchConfig::default())
    }
}
