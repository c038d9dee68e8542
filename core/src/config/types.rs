use serde::{Deserialize, Serialize};

use crate::executor::types::{CommandSpec, OutputMode};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub batch: BatchConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_enabled")]
    pub enabled: bool,

    /// If true, log to stderr.
    #[serde(default = "default_logging_console")]
    pub console: bool,

    /// If true, log to a file under `directory` (or OS temp dir if unset).
    #[serde(default)]
    pub file: bool,

    /// EnvFilter string, e.g. "info" or "plotbatch_core=debug".
    #[serde(default = "default_logging_level")]
    pub level: String,

    /// Optional directory for log files. If empty or unset, uses OS temp dir.
    #[serde(default)]
    pub directory: Option<String>,
}

fn default_logging_enabled() -> bool {
    true
}

fn default_logging_console() -> bool {
    true
}

fn default_logging_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: default_logging_enabled(),
            console: default_logging_console(),
            file: false,
            level: default_logging_level(),
            directory: None,
        }
    }
}

/// Settings for one batch run: which files to pick up, what to run on each
/// and how many commands may run at once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Glob pattern selecting the input files.
    #[serde(default = "default_pattern")]
    pub pattern: String,

    /// Maximum number of plotting commands running at the same time.
    #[serde(default = "default_jobs")]
    pub jobs: usize,

    #[serde(default)]
    pub command: CommandSpec,

    /// Working directory for every spawned command. Inherited when unset.
    #[serde(default)]
    pub workdir: Option<String>,

    /// Per-task deadline. The command is killed once it expires.
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    #[serde(default)]
    pub output: OutputMode,

    /// Bytes kept from the end of each captured stream.
    #[serde(default = "default_capture_bytes")]
    pub capture_bytes: usize,

    /// Exit non-zero when at least one task failed.
    #[serde(default)]
    pub strict: bool,

    /// "text" or "jsonl"
    #[serde(default = "default_stream_format")]
    pub stream_format: String,

    #[serde(default = "default_progress_bar")]
    pub progress_bar: bool,
}

pub const DEFAULT_PATTERN: &str = "../alignment/output/out_MIMOSA_*root";
pub const DEFAULT_JOBS: usize = 4;

fn default_pattern() -> String {
    DEFAULT_PATTERN.to_string()
}

fn default_jobs() -> usize {
    DEFAULT_JOBS
}

fn default_capture_bytes() -> usize {
    16 * 1024
}

fn default_stream_format() -> String {
    "text".to_string()
}

fn default_progress_bar() -> bool {
    true
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            pattern: default_pattern(),
            jobs: default_jobs(),
            command: CommandSpec::default(),
            workdir: None,
            timeout_secs: None,
            output: OutputMode::default(),
            capture_bytes: default_capture_bytes(),
            strict: false,
            stream_format: default_stream_format(),
            progress_bar: default_progress_bar(),
        }
    }
}
