// Subcommand handlers
// Wires the adapters into the core services and prints the outcome

use anyhow::{bail, Context, Result};
use clap::ValueEnum;
use colored::Colorize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use pybench_core::application::constants::{ENV_CPU_CORES, ENV_THREAD_LIMIT};
use pybench_core::application::{
    select_workloads, BenchmarkSuite, ReportBuilder, ShutdownToken, SuiteOptions,
};
use pybench_core::config::Settings;
use pybench_core::domain::{ComparisonThreshold, RunReport, WorkloadKind};
use pybench_core::port::{
    Interpreter, InterpreterResolver, RunStore, SystemProbe, SystemTimeProvider, UuidProvider,
    WorkloadCatalog,
};
use pybench_infra_report::{render_index_html, render_run_html, JsonRunStore};
use pybench_infra_system::{FsWorkloadCatalog, PyenvResolver, SubprocessRunner, SystemProbeImpl};

use crate::display;

/// How a finished run is presented (the JSON document is always stored)
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Tables on stdout
    Text,
    /// The run document on stdout
    Json,
    /// HTML page next to the stored document, plus the history index
    Html,
    /// Tables and HTML
    All,
}

fn catalog(settings: &Settings) -> FsWorkloadCatalog {
    FsWorkloadCatalog::new(&settings.benchmark_dir, &settings.scaling_dir)
}

fn probe(settings: &Settings) -> SystemProbeImpl {
    SystemProbeImpl::new().with_limits(settings.cpu_cores.clone(), settings.thread_limit)
}

/// Limits exported to every workload
fn workload_env(settings: &Settings) -> HashMap<String, String> {
    let mut env = HashMap::new();
    if let Some(cores) = &settings.cpu_cores {
        env.insert(ENV_CPU_CORES.to_string(), cores.clone());
    }
    if let Some(limit) = settings.thread_limit {
        env.insert(ENV_THREAD_LIMIT.to_string(), limit.to_string());
    }
    env
}

async fn resolve_interpreters(settings: &Settings) -> Result<Vec<Interpreter>> {
    let versions = settings.validate().context("Invalid configuration")?;
    let resolver = PyenvResolver::new();

    let mut interpreters = Vec::with_capacity(versions.len());
    for (version, spec) in versions.into_iter().zip(&settings.interpreters) {
        let interpreter = resolver
            .resolve(&version, spec.path.clone())
            .await
            .with_context(|| format!("Failed to resolve Python {version}"))?;
        info!(version = %interpreter.version, path = %interpreter.path.display(), "Interpreter resolved");
        interpreters.push(interpreter);
    }
    Ok(interpreters)
}

/// Run timing or scaling workloads, store the run and present it
pub async fn run_suite(
    settings: &Settings,
    kind: WorkloadKind,
    requested: Vec<String>,
    format: ReportFormat,
    shutdown: ShutdownToken,
) -> Result<()> {
    let interpreters = resolve_interpreters(settings).await?;

    let available = catalog(settings)
        .discover(kind)
        .with_context(|| format!("Failed to discover {kind} workloads"))?;
    let selection = select_workloads(&available, &requested);
    for name in &selection.unknown {
        warn!(benchmark = %name, "Unknown benchmark");
        eprintln!("{} unknown benchmark {}", "warning:".yellow().bold(), name);
    }
    if selection.selected.is_empty() {
        bail!("No {kind} workloads to run");
    }

    let options = SuiteOptions {
        iterations: settings.iterations,
        timeout: settings.timeout(),
        timing_source: settings.timing,
        profile_level: settings.profile,
        env: workload_env(settings),
        preload: settings.preload.clone(),
    };
    let suite = BenchmarkSuite::new(
        interpreters,
        settings.baseline_version()?,
        ComparisonThreshold::new(settings.threshold_percent),
        options,
        Arc::new(SubprocessRunner::default()),
    )?
    .with_observer(Arc::new(display::ConsoleProgress::new()))
    .with_shutdown(shutdown.clone());

    let (timing, scaling) = match kind {
        WorkloadKind::Timing => (suite.run_timing(&selection.selected).await, Vec::new()),
        WorkloadKind::Scaling => (Vec::new(), suite.run_scaling(&selection.selected).await),
    };
    if shutdown.is_shutdown() {
        eprintln!("{}", "Interrupted, saving completed workloads".yellow());
    }

    let builder = ReportBuilder::new(
        Arc::new(probe(settings)),
        Arc::new(SystemTimeProvider),
        Arc::new(UuidProvider),
    );
    let report = builder
        .build(suite.run_config(requested), &timing, &scaling)
        .await;

    let store = JsonRunStore::new(&settings.output_dir);
    let json_path = store.save(&report).await.context("Failed to save run")?;

    present(&store, &report, format).await?;
    eprintln!(
        "{} {}",
        "✓ Results saved to".green().bold(),
        json_path.display()
    );
    Ok(())
}

async fn present(store: &JsonRunStore, report: &RunReport, format: ReportFormat) -> Result<()> {
    if matches!(format, ReportFormat::Text | ReportFormat::All) {
        print_tables(report);
    }
    if format == ReportFormat::Json {
        println!("{}", serde_json::to_string_pretty(report)?);
    }
    if matches!(format, ReportFormat::Html | ReportFormat::All) {
        let page = store.html_path(&report.run_id);
        write_file(&page, &render_run_html(report)).await?;
        eprintln!("{} {}", "✓ HTML report".green().bold(), page.display());
        let index = write_index(store).await?;
        eprintln!("{} {}", "✓ History index".green().bold(), index.display());
    }
    Ok(())
}

fn print_tables(report: &RunReport) {
    let timing = display::timing_table(report);
    let scaling = display::scaling_table(report);
    if timing.is_none() && scaling.is_none() {
        println!("{}", "No results".yellow());
    }
    if let Some(table) = timing {
        println!("{table}");
    }
    if let Some(table) = scaling {
        println!("{table}");
    }
}

async fn write_file(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    tokio::fs::write(path, contents)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))
}

async fn write_index(store: &JsonRunStore) -> Result<PathBuf> {
    let runs = store.list().await.context("Failed to list stored runs")?;
    let path = store.index_path();
    write_file(&path, &render_index_html(&runs)).await?;
    info!(runs = runs.len(), path = %path.display(), "History index written");
    Ok(path)
}

/// Print every discovered workload
pub fn list(settings: &Settings) -> Result<()> {
    let catalog = catalog(settings);
    let mut workloads = catalog
        .discover(WorkloadKind::Timing)
        .context("Failed to discover timing workloads")?;
    workloads.extend(
        catalog
            .discover(WorkloadKind::Scaling)
            .context("Failed to discover scaling workloads")?,
    );

    if workloads.is_empty() {
        println!(
            "{} (looked in {} and {})",
            "No workloads found".yellow(),
            settings.benchmark_dir.display(),
            settings.scaling_dir.display()
        );
        return Ok(());
    }
    println!("{}", display::workload_table(&workloads));
    Ok(())
}

/// Show resolved interpreters and the host
pub async fn env(settings: &Settings) -> Result<()> {
    let interpreters = resolve_interpreters(settings).await?;
    println!("{}", "Interpreters".bold());
    println!(
        "{}",
        display::interpreter_table(&interpreters, &settings.baseline_version()?)
    );

    let probe = probe(settings);
    display::print_system_info(&probe.system_info().await);
    match probe.git_info().await {
        Some(git) => println!("  {} {} ({})", "Git:".bold(), git.branch, git.commit),
        None => println!("  {} N/A", "Git:".bold()),
    }
    Ok(())
}

/// Render a stored run as HTML; defaults to the run document path with `.html`
pub async fn html(json: &Path, output: Option<PathBuf>) -> Result<()> {
    let store = JsonRunStore::new(json.parent().unwrap_or_else(|| Path::new(".")));
    let report = store
        .load(json)
        .await
        .with_context(|| format!("Failed to load {}", json.display()))?;

    let output = output.unwrap_or_else(|| json.with_extension("html"));
    write_file(&output, &render_run_html(&report)).await?;
    println!("{} {}", "✓ HTML report".green().bold(), output.display());
    Ok(())
}

/// Regenerate `<dir>/index.html` from the runs stored under `<dir>/runs`
pub async fn index(dir: &Path) -> Result<()> {
    let store = JsonRunStore::new(dir);
    let path = write_index(&store).await?;
    println!("{} {}", "✓ History index".green().bold(), path.display());
    Ok(())
}
