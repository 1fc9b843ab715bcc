//! pybench - benchmark Python interpreter builds against a baseline build

mod commands;
mod display;
mod logging;
mod settings;

use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing::{info, warn};

use pybench_core::application::{shutdown_channel, ShutdownToken};
use pybench_core::domain::{ProfileLevel, TimingSource, WorkloadKind};

use commands::ReportFormat;
use settings::Overrides;

#[derive(Parser)]
#[command(name = "pybench")]
#[command(about = "Benchmark Python interpreter builds against a baseline build", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Settings file (TOML); missing file means built-in defaults
    #[arg(long, global = true, env = "PYBENCH_CONFIG", default_value = "pybench.toml")]
    config: PathBuf,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Run timing benchmarks
    Run {
        #[command(flatten)]
        suite: SuiteArgs,

        /// Profiling depth
        #[arg(long, value_enum)]
        profile: Option<ProfileArg>,
    },

    /// Run scaling benchmarks
    Scaling {
        #[command(flatten)]
        suite: SuiteArgs,
    },

    /// List discovered workloads
    List,

    /// Show resolved interpreters and system information
    Env {
        /// Interpreters to resolve (`VERSION` or `VERSION=PATH`)
        #[arg(long = "python", value_name = "VERSION[=PATH]")]
        interpreters: Vec<String>,
    },

    /// Render a stored run as HTML
    Html {
        /// Run document (`runs/<id>.json`)
        json: PathBuf,

        /// Output file (default: next to the document)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Regenerate the history index page
    Index {
        /// Results directory holding `runs/`
        #[arg(long)]
        dir: Option<PathBuf>,
    },
}

#[derive(Args)]
struct SuiteArgs {
    /// Iterations per benchmark and interpreter build
    #[arg(short = 'n', long)]
    iterations: Option<usize>,

    /// Benchmarks to run (name, `test_` prefix and `.py` optional); all when omitted
    #[arg(short, long, num_args = 1..)]
    benchmarks: Vec<String>,

    /// How results are presented
    #[arg(long, value_enum, default_value = "text")]
    report_format: ReportFormat,

    /// Results directory
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Timing source
    #[arg(long, value_enum)]
    timing: Option<TimingArg>,

    /// Interpreters to measure (`VERSION` or `VERSION=PATH`), replaces the configured list
    #[arg(long = "python", value_name = "VERSION[=PATH]")]
    interpreters: Vec<String>,

    /// Baseline interpreter build
    #[arg(long)]
    baseline: Option<String>,

    /// Width of the "similar" band around the baseline, in percent
    #[arg(long)]
    threshold: Option<f64>,

    /// Per-run timeout in seconds
    #[arg(long)]
    timeout: Option<f64>,

    /// Cores workloads may use (`all` or a number)
    #[arg(long)]
    cpu_cores: Option<String>,

    /// Threads per core workloads may start
    #[arg(long)]
    thread_limit: Option<u32>,
}

#[derive(Clone, Copy, ValueEnum)]
enum ProfileArg {
    None,
    Basic,
    Detailed,
}

impl From<ProfileArg> for ProfileLevel {
    fn from(arg: ProfileArg) -> Self {
        match arg {
            ProfileArg::None => ProfileLevel::None,
            ProfileArg::Basic => ProfileLevel::Basic,
            ProfileArg::Detailed => ProfileLevel::Detailed,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum TimingArg {
    /// Wall clock around the interpreter process
    Wall,
    /// `Duration:` line printed by the workload
    Reported,
}

impl From<TimingArg> for TimingSource {
    fn from(arg: TimingArg) -> Self {
        match arg {
            TimingArg::Wall => TimingSource::Wall,
            TimingArg::Reported => TimingSource::Reported,
        }
    }
}

impl SuiteArgs {
    fn overrides(&self, profile: Option<ProfileArg>) -> Overrides {
        Overrides {
            iterations: self.iterations,
            profile: profile.map(Into::into),
            timing: self.timing.map(Into::into),
            output_dir: self.output.clone(),
            interpreters: self.interpreters.clone(),
            baseline: self.baseline.clone(),
            threshold_percent: self.threshold,
            timeout_secs: self.timeout,
            cpu_cores: self.cpu_cores.clone(),
            thread_limit: self.thread_limit,
        }
    }
}

/// Token triggered by Ctrl-C; the suite stops after the current run
fn interrupt_token() -> ShutdownToken {
    let (sender, token) = shutdown_channel();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, stopping after the current run");
            sender.shutdown();
        }
    });
    token
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose)?;

    let settings = settings::load_settings(&cli.config)?;

    match cli.command {
        Commands::Run { suite, profile } => {
            let settings = suite.overrides(profile).apply(settings);
            let token = interrupt_token();
            info!(config = %cli.config.display(), "Starting timing run");
            commands::run_suite(
                &settings,
                WorkloadKind::Timing,
                suite.benchmarks,
                suite.report_format,
                token,
            )
            .await?;
        }

        Commands::Scaling { suite } => {
            let settings = suite.overrides(None).apply(settings);
            let token = interrupt_token();
            info!(config = %cli.config.display(), "Starting scaling run");
            commands::run_suite(
                &settings,
                WorkloadKind::Scaling,
                suite.benchmarks,
                suite.report_format,
                token,
            )
            .await?;
        }

        Commands::List => commands::list(&settings)?,

        Commands::Env { interpreters } => {
            let settings = Overrides {
                interpreters,
                ..Overrides::default()
            }
            .apply(settings);
            commands::env(&settings).await?;
        }

        Commands::Html { json, output } => commands::html(&json, output).await?,

        Commands::Index { dir } => {
            let dir = dir.unwrap_or_else(|| settings.output_dir.clone());
            commands::index(&dir).await?;
        }
    }

    Ok(())
}
