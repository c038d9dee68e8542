use indicatif::MultiProgress;
use plotbatch_core::config::AppConfig;
use plotbatch_core::error::CliError;
use plotbatch_core::executor::BatchDispatcher;

use super::cli::RunArgs;

pub async fn run(
    args: RunArgs,
    mut cfg: AppConfig,
    progress: MultiProgress,
) -> Result<i32, CliError> {
    args.apply(&mut cfg.batch);
    if cfg.batch.progress_bar && !atty::is(atty::Stream::Stderr) {
        cfg.batch.progress_bar = false;
    }

    let dispatcher = BatchDispatcher::from_config(&cfg.batch).with_progress_target(progress);

    if args.dry_run {
        for task in dispatcher.plan()? {
            println!("{}", task.display_command());
        }
        return Ok(0);
    }

    let report = dispatcher.dispatch().await?;

    if cfg.batch.strict && !report.is_success() {
        tracing::error!("{} of {} tasks failed", report.failed(), report.total());
        return Ok(1);
    }
    Ok(0)
}
