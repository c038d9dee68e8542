use clap::Parser;
use indicatif::MultiProgress;
use plotbatch_cli::commands::{cli, list, run};
use plotbatch_cli::term::ProgressAwareStderr;
use plotbatch_core::config::{self, AppConfig, LoggingConfig};
use plotbatch_core::error::{self, CliError};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

static LOG_GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
    std::sync::OnceLock::new();

#[tokio::main]
async fn main() {
    let exit = match real_main().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{e}");
            exit_code_for_error(&e)
        }
    };

    std::process::exit(exit);
}

async fn real_main() -> Result<i32, CliError> {
    let args = cli::Args::parse();
    let cfg = load_config(args.config.as_deref())?;
    // Bars and log lines share stderr; logs pause the bars while writing.
    let progress = MultiProgress::new();
    init_tracing(&cfg.logging, ProgressAwareStderr::new(progress.clone()))
        .map_err(CliError::Command)?;

    match args.command {
        cli::Commands::Run(run_args) => run::run(run_args, cfg, progress).await,
        cli::Commands::List(pattern_args) => list::list(pattern_args, &cfg),
    }
}

fn load_config(path: Option<&std::path::Path>) -> Result<AppConfig, CliError> {
    let loaded = match path {
        Some(p) => config::load_from_path(p),
        None => config::load_default(),
    };
    loaded.map_err(|e| CliError::Config(e.to_string()))
}

fn exit_code_for_error(e: &error::CliError) -> i32 {
    // 0: success
    // 1: tasks failed (only with --strict; returned as a normal exit code)
    // 11: config error
    // 20: io / logging setup error
    // 30: dispatcher error
    match e {
        CliError::Config(_) => 11,
        CliError::Io(_) => 20,
        CliError::Command(_) => 20,
        CliError::Executor(error::ExecutorError::Discover(_)) => 11,
        CliError::Executor(error::ExecutorError::InvalidConcurrency(_)) => 11,
        CliError::Executor(error::ExecutorError::Pool(_)) => 30,
    }
}

fn init_tracing(logging: &LoggingConfig, stderr: ProgressAwareStderr) -> Result<(), String> {
    if !logging.enabled {
        return Ok(());
    }

    let filter = match std::env::var("RUST_LOG") {
        Ok(v) if !v.trim().is_empty() => EnvFilter::from_default_env(),
        _ => EnvFilter::try_new(logging.level.clone()).map_err(|e| e.to_string())?,
    };

    let mut maybe_writer = None;

    if logging.file {
        let dir = match logging
            .directory
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            Some(d) => std::path::PathBuf::from(d),
            None => std::env::temp_dir().join("plotbatch"),
        };

        std::fs::create_dir_all(&dir).map_err(|e| format!("create log dir failed: {e}"))?;
        let file_name = format!("plotbatch.{}.log", std::process::id());
        let appender = tracing_appender::rolling::never(dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(appender);
        let _ = LOG_GUARD.set(guard);
        maybe_writer = Some(non_blocking);
    }

    if !logging.console && maybe_writer.is_none() {
        return Err("logging disabled for both console and file".to_string());
    }

    let console_layer = logging.console.then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(move || stderr.clone())
            .with_ansi(atty::is(atty::Stream::Stderr))
    });

    let file_layer = maybe_writer.map(|w| {
        tracing_subscriber::fmt::layer()
            .with_writer(w)
            .with_ansi(false)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    Ok(())
}
