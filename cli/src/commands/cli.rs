use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};
use plotbatch_core::config::BatchConfig;

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamFormat {
    Text,
    Jsonl,
}

impl StreamFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Jsonl => "jsonl",
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "plotbatch", version, about = "Run a plotting command over a batch of analysis files")]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file to use instead of ~/.plotbatch/config.toml or ./plotbatch.toml.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(ClapArgs, Debug, Clone, Default)]
pub struct PatternArgs {
    /// Glob selecting the input files.
    #[arg(long, short = 'p')]
    pub pattern: Option<String>,
}

#[derive(ClapArgs, Debug, Clone, Default)]
pub struct RunArgs {
    #[command(flatten)]
    pub input: PatternArgs,

    /// Maximum number of commands running at once.
    #[arg(long, short = 'j')]
    pub jobs: Option<usize>,

    /// Kill a command that runs longer than this many seconds.
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Capture command output instead of passing it through.
    #[arg(long)]
    pub capture: bool,

    /// Exit with status 1 when any command fails.
    #[arg(long)]
    pub strict: bool,

    #[arg(long, value_enum)]
    pub format: Option<StreamFormat>,

    #[arg(long)]
    pub no_progress: bool,

    /// Print the commands that would run and exit.
    #[arg(long)]
    pub dry_run: bool,

    /// Working directory for the spawned commands.
    #[arg(long)]
    pub workdir: Option<String>,

    /// Program to run for each file (default: bash).
    #[arg(long)]
    pub program: Option<String>,

    /// Fixed arguments placed before the file path and label.
    #[arg(last = true)]
    pub args: Vec<String>,
}

impl RunArgs {
    /// Layer command line flags over the loaded configuration.
    pub fn apply(&self, cfg: &mut BatchConfig) {
        if let Some(pattern) = &self.input.pattern {
            cfg.pattern = pattern.clone();
        }
        if let Some(jobs) = self.jobs {
            cfg.jobs = jobs;
        }
        if self.timeout_secs.is_some() {
            cfg.timeout_secs = self.timeout_secs;
        }
        if self.capture {
            cfg.output = plotbatch_core::executor::OutputMode::Capture;
        }
        if self.strict {
            cfg.strict = true;
        }
        if let Some(format) = self.format {
            cfg.stream_format = format.as_str().to_string();
        }
        if self.no_progress {
            cfg.progress_bar = false;
        }
        if let Some(dir) = &self.workdir {
            cfg.workdir = Some(dir.clone());
        }
        if let Some(program) = &self.program {
            cfg.command.program = program.clone();
        }
        if !self.args.is_empty() {
            cfg.command.args = self.args.clone();
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the plotting command on every matching file.
    Run(RunArgs),
    /// Show the files a run would pick up and their labels.
    List(PatternArgs),
}

#[cfg(test)]
mod tests {
    use super::*;
    use plotbatch_core::executor::OutputMode;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_run_with_trailing_command_args() {
        let args = Args::try_parse_from([
            "plotbatch",
            "run",
            "-p",
            "out/*.root",
            "-j",
            "8",
            "--capture",
            "--program",
            "python3",
            "--",
            "plot_residual.py",
        ])
        .unwrap();

        let Commands::Run(run) = args.command else {
            panic!("expected run subcommand");
        };
        let mut cfg = BatchConfig::default();
        run.apply(&mut cfg);

        assert_eq!(cfg.pattern, "out/*.root");
        assert_eq!(cfg.jobs, 8);
        assert_eq!(cfg.output, OutputMode::Capture);
        assert_eq!(cfg.command.program, "python3");
        assert_eq!(cfg.command.args, vec!["plot_residual.py".to_string()]);
    }

    #[test]
    fn run_without_flags_keeps_config() {
        let args = Args::try_parse_from(["plotbatch", "run"]).unwrap();
        let Commands::Run(run) = args.command else {
            panic!("expected run subcommand");
        };

        let mut cfg = BatchConfig::default();
        run.apply(&mut cfg);

        assert_eq!(cfg.pattern, BatchConfig::default().pattern);
        assert_eq!(cfg.jobs, 4);
        assert_eq!(cfg.command.args, vec!["./make_plots.sh".to_string()]);
    }

    #[test]
    fn jsonl_format_and_global_config() {
        let args = Args::try_parse_from([
            "plotbatch",
            "run",
            "--format",
            "jsonl",
            "--config",
            "custom.toml",
        ])
        .unwrap();

        assert_eq!(args.config, Some(PathBuf::from("custom.toml")));
        let Commands::Run(run) = args.command else {
            panic!("expected run subcommand");
        };
        assert_eq!(run.format, Some(StreamFormat::Jsonl));
    }

    #[test]
    fn list_accepts_pattern() {
        let args = Args::try_parse_from(["plotbatch", "list", "--pattern", "x/*.root"]).unwrap();
        let Commands::List(list) = args.command else {
            panic!("expected list subcommand");
        };
        assert_eq!(list.pattern.as_deref(), Some("x/*.root"));
    }
}
