use plotbatch_core::config::AppConfig;
use plotbatch_core::discover;
use plotbatch_core::error::{CliError, ExecutorError};

use super::cli::PatternArgs;

pub fn list(args: PatternArgs, cfg: &AppConfig) -> Result<i32, CliError> {
    let pattern = args.pattern.unwrap_or_else(|| cfg.batch.pattern.clone());
    let files = discover(&pattern).map_err(ExecutorError::from)?;

    if files.is_empty() {
        tracing::warn!("No input files match '{}'", pattern);
    }
    for file in files {
        println!("{}\t{}", file.path.display(), file.label);
    }
    Ok(0)
}
