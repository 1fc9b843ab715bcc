// Terminal output: result tables and suite progress

use colored::Colorize;
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use tabled::settings::Style;
use tabled::{Table, Tabled};

use pybench_core::domain::{
    ComparisonStatus, InterpreterVersion, RunReport, SystemInfo, Workload, WorkloadId,
};
use pybench_core::port::{Interpreter, ProgressObserver};

#[derive(Tabled)]
struct TimingRow {
    #[tabled(rename = "Benchmark")]
    benchmark: String,
    #[tabled(rename = "Version")]
    version: String,
    #[tabled(rename = "Mean (s)")]
    mean: String,
    #[tabled(rename = "Median (s)")]
    median: String,
    #[tabled(rename = "Stddev")]
    stddev: String,
    #[tabled(rename = "Relative")]
    relative: String,
    #[tabled(rename = "Status")]
    status: String,
}

#[derive(Tabled)]
struct ScalingRow {
    #[tabled(rename = "Test")]
    test: String,
    #[tabled(rename = "Version")]
    version: String,
    #[tabled(rename = "Series")]
    series: String,
    #[tabled(rename = "Workers")]
    workers: String,
    #[tabled(rename = "Mean (s)")]
    mean: String,
    #[tabled(rename = "Speedup")]
    speedup: String,
    #[tabled(rename = "Efficiency")]
    efficiency: String,
    #[tabled(rename = "Relative")]
    relative: String,
    #[tabled(rename = "Status")]
    status: String,
}

#[derive(Tabled)]
struct WorkloadRow {
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Workload")]
    id: String,
    #[tabled(rename = "Path")]
    path: String,
}

#[derive(Tabled)]
struct InterpreterRow {
    #[tabled(rename = "Version")]
    version: String,
    #[tabled(rename = "Path")]
    path: String,
    #[tabled(rename = "Baseline")]
    baseline: String,
}

fn secs(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.4}"))
}

fn status_cell(status: ComparisonStatus) -> String {
    let text = status.to_string();
    match status {
        ComparisonStatus::Improved => text.green().to_string(),
        ComparisonStatus::Degraded => text.red().to_string(),
        ComparisonStatus::Failed => text.red().bold().to_string(),
        ComparisonStatus::Baseline => text.bold().to_string(),
        ComparisonStatus::Similar | ComparisonStatus::NoBaseline => text,
    }
}

fn table<T: Tabled>(rows: Vec<T>) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

/// Timing results, one row per benchmark and build
pub fn timing_table(report: &RunReport) -> Option<String> {
    let rows: Vec<TimingRow> = report
        .benchmarks
        .iter()
        .flat_map(|(id, entry)| {
            entry.summary.iter().map(move |(version, line)| TimingRow {
                benchmark: id.to_string(),
                version: version.to_string(),
                mean: secs(line.mean),
                median: secs(line.median),
                stddev: secs(line.stddev),
                relative: line.relative_perf.clone().unwrap_or_else(|| "-".into()),
                status: status_cell(line.status),
            })
        })
        .collect();
    (!rows.is_empty()).then(|| table(rows))
}

/// Scaling results, one row per worker count (or one row for a failed build)
pub fn scaling_table(report: &RunReport) -> Option<String> {
    let mut rows = Vec::new();
    for (id, versions) in report.scaling.iter() {
        for (version, result) in versions.iter() {
            if result.points.is_empty() {
                rows.push(ScalingRow {
                    test: id.to_string(),
                    version: version.to_string(),
                    series: "-".into(),
                    workers: "-".into(),
                    mean: secs(result.baseline.as_ref().map(|b| b.mean)),
                    speedup: "-".into(),
                    efficiency: "-".into(),
                    relative: "-".into(),
                    status: status_cell(result.status),
                });
                continue;
            }
            for point in &result.points {
                rows.push(ScalingRow {
                    test: id.to_string(),
                    version: version.to_string(),
                    series: point.series.clone(),
                    workers: point.workers.to_string(),
                    mean: secs(Some(point.duration.mean)),
                    speedup: format!("{:.2}x", point.speedup),
                    efficiency: format!("{:.1}%", point.efficiency * 100.0),
                    relative: point
                        .relative_performance
                        .map_or_else(|| "-".into(), |r| format!("{r:.2}%")),
                    status: status_cell(point.status),
                });
            }
        }
    }
    (!rows.is_empty()).then(|| table(rows))
}

pub fn workload_table(workloads: &[Workload]) -> String {
    table(
        workloads
            .iter()
            .map(|w| WorkloadRow {
                kind: w.kind.to_string(),
                id: w.id.to_string(),
                path: w.path.display().to_string(),
            })
            .collect(),
    )
}

pub fn interpreter_table(interpreters: &[Interpreter], baseline: &InterpreterVersion) -> String {
    table(
        interpreters
            .iter()
            .map(|i| InterpreterRow {
                version: i.version.to_string(),
                path: i.path.display().to_string(),
                baseline: if &i.version == baseline { "✓".green().to_string() } else { String::new() },
            })
            .collect(),
    )
}

pub fn print_system_info(info: &SystemInfo) {
    println!("{}", "System".bold());
    println!("  {} {}", "CPU:".bold(), info.cpu_brand);
    println!(
        "  {} {} logical, {} available, {} threads @ {:.0} MHz",
        "Cores:".bold(),
        info.cpu_count,
        info.available_cores,
        info.total_threads,
        info.cpu_freq.current
    );
    println!(
        "  {} {:.2} GB",
        "Memory:".bold(),
        info.memory_total as f64 / (1024.0 * 1024.0 * 1024.0)
    );
    println!("  {} {}", "OS:".bold(), info.os_info);
    println!(
        "  {} {:.2} {:.2} {:.2}",
        "Load:".bold(),
        info.load_avg[0],
        info.load_avg[1],
        info.load_avg[2]
    );
}

/// Suite progress on stderr: one line per workload and build
pub struct ConsoleProgress {
    total: AtomicUsize,
    done: AtomicUsize,
}

impl ConsoleProgress {
    pub fn new() -> Self {
        Self {
            total: AtomicUsize::new(0),
            done: AtomicUsize::new(0),
        }
    }
}

impl Default for ConsoleProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressObserver for ConsoleProgress {
    fn on_suite_start(&self, total_runs: usize) {
        self.total.store(total_runs, Ordering::Relaxed);
        self.done.store(0, Ordering::Relaxed);
    }

    fn on_benchmark_start(&self, workload: &WorkloadId) {
        eprintln!("{} {}", "▶".cyan(), workload.to_string().bold());
    }

    fn on_iteration(
        &self,
        _workload: &WorkloadId,
        version: &InterpreterVersion,
        iteration: usize,
        iterations: usize,
        success: bool,
    ) {
        let done = self.done.fetch_add(1, Ordering::Relaxed) + 1;
        let mut stderr = std::io::stderr().lock();
        if iteration == 1 {
            let _ = write!(stderr, "  {:<10} ", version.as_str());
        }
        let mark = if success { ".".green() } else { "x".red() };
        let _ = write!(stderr, "{mark}");
        if iteration == iterations {
            let _ = write!(
                stderr,
                " {}",
                format!("[{done}/{}]", self.total.load(Ordering::Relaxed)).dimmed()
            );
            let _ = writeln!(stderr);
        }
        let _ = stderr.flush();
    }
}
