// HTML run page
// System information, comparison charts, per-benchmark statistics and scaling tables

use std::fmt::Write;

use pybench_core::domain::{
    parse_relative, ComparisonStatus, InterpreterVersion, RunReport, ScalingVersionResult,
    VersionMap, VersionSummary, WorkloadId,
};

use crate::escape::{escape, gib};
use crate::svg::{BarChart, BarSeries};

const STYLE: &str = "\
body { font-family: Arial, sans-serif; margin: 20px; }
h1, h2, h3 { color: #333; }
table { width: 100%; border-collapse: collapse; margin-top: 20px; }
th, td { border: 1px solid #ddd; padding: 8px; text-align: center; }
th { background-color: #b0bec5; color: #333; }
tr.header { background-color: #eceff1; font-weight: bold; }
tr.baseline { background-color: #cfd8dc; }
tr.failed { color: #b71c1c; }
td.improved { color: #2e7d32; }
td.degraded { color: #c62828; }
.system-info { background-color: #f7f7f7; padding: 15px; border-radius: 8px; margin-bottom: 20px; }
.system-info li { margin-bottom: 5px; }
.flex-container { display: flex; justify-content: space-around; flex-wrap: wrap; }
.flex-item { flex: 1; min-width: 300px; margin: 10px; }
.chart text { font-size: 11px; fill: #333; }
.chart .chart-title { font-size: 14px; font-weight: bold; }
";

/// Render a stored run as a standalone HTML page
pub fn render_run_html(report: &RunReport) -> String {
    let versions = report.versions();
    let mut html = String::new();

    let _ = write!(
        html,
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>Benchmark Results {}</title>\n<style>\n{STYLE}</style>\n</head>\n<body>\n<h1>Benchmark Results</h1>\n",
        escape(&report.run_id)
    );
    system_section(&mut html, report);

    if !report.benchmarks.is_empty() {
        html.push_str("<div class=\"flex-container\">\n");
        for chart in [relative_chart(report, &versions), median_chart(report, &versions)] {
            let _ = writeln!(html, "<div class=\"flex-item\">{}</div>", chart.render());
        }
        html.push_str("</div>\n");
        statistics_section(&mut html, report, &versions);
    }

    if !report.scaling.is_empty() {
        html.push_str("<h2>Scaling</h2>\n");
        for (workload, results) in report.scaling.iter() {
            scaling_table(&mut html, workload, results, &versions);
        }
    }

    html.push_str("</body>\n</html>\n");
    html
}

fn system_section(html: &mut String, report: &RunReport) {
    let info = &report.system_info;
    let config = &report.run_config;
    let load = info
        .load_avg
        .iter()
        .map(|l| format!("{l:.2}"))
        .collect::<Vec<_>>()
        .join(", ");
    let git = report
        .git_info
        .as_ref()
        .map(|g| format!("{} @ {}", g.branch, g.commit))
        .unwrap_or_else(|| "N/A".to_string());

    let _ = write!(
        html,
        "<h2>System Information</h2>\n<div class=\"system-info\">\n<ul>\n\
         <li><strong>Date:</strong> {}</li>\n\
         <li><strong>CPU:</strong> {} ({} logical, {} available, {} threads)</li>\n\
         <li><strong>Total Memory:</strong> {}</li>\n\
         <li><strong>OS:</strong> {}</li>\n\
         <li><strong>CPU Frequency:</strong> {:.2} MHz</li>\n\
         <li><strong>Load Average:</strong> [{}]</li>\n\
         <li><strong>Git:</strong> {}</li>\n\
         <li><strong>Iterations:</strong> {} (baseline {}, threshold &plusmn;{}%, timing {}, profile {})</li>\n\
         </ul>\n</div>\n",
        report.created_at.format("%Y-%m-%d %H:%M:%S UTC"),
        escape(&info.cpu_brand),
        info.cpu_count,
        info.available_cores,
        info.total_threads,
        gib(info.memory_total),
        escape(&info.os_info),
        info.cpu_freq.current,
        load,
        escape(&git),
        config.iterations,
        escape(config.baseline.as_str()),
        config.threshold_percent,
        config.timing_source,
        config.profile_level,
    );
}

/// Relative figure as charted and tabulated: 100 for the baseline row
fn relative_value(line: &VersionSummary) -> Option<f64> {
    match line.status {
        ComparisonStatus::Baseline => Some(100.0),
        _ => line.relative_perf.as_deref().and_then(parse_relative),
    }
}

fn chart_series(
    report: &RunReport,
    versions: &[InterpreterVersion],
    value: impl Fn(&VersionSummary) -> Option<f64>,
    error: Option<&dyn Fn(&VersionSummary) -> Option<f64>>,
) -> Vec<BarSeries> {
    versions
        .iter()
        .map(|version| {
            let lines: Vec<Option<&VersionSummary>> = report
                .benchmarks
                .values()
                .map(|entry| entry.summary.get(version))
                .collect();
            BarSeries {
                name: version.to_string(),
                values: lines.iter().map(|l| l.and_then(&value)).collect(),
                errors: error.map(|f| lines.iter().map(|l| l.and_then(f)).collect()),
            }
        })
        .collect()
}

fn categories(report: &RunReport) -> Vec<String> {
    report.benchmarks.keys().map(|k| k.to_string()).collect()
}

fn relative_chart(report: &RunReport, versions: &[InterpreterVersion]) -> BarChart {
    BarChart {
        title: "Execution Time Comparison Across Tests".into(),
        x_label: format!("Execution time relative to {} (%)", report.run_config.baseline),
        categories: categories(report),
        series: chart_series(report, versions, relative_value, None),
    }
}

fn median_chart(report: &RunReport, versions: &[InterpreterVersion]) -> BarChart {
    let stddev: &dyn Fn(&VersionSummary) -> Option<f64> = &|l| l.stddev;
    BarChart {
        title: "Median Execution Time with Error Bars".into(),
        x_label: "Median execution time (s)".into(),
        categories: categories(report),
        series: chart_series(report, versions, |l| l.median, Some(stddev)),
    }
}

fn seconds(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.4}"))
}

fn status_class(status: ComparisonStatus) -> &'static str {
    match status {
        ComparisonStatus::Improved => "improved",
        ComparisonStatus::Degraded => "degraded",
        _ => "",
    }
}

fn statistics_section(html: &mut String, report: &RunReport, versions: &[InterpreterVersion]) {
    html.push_str("<h2>Detailed Statistics</h2>\n<table>\n");
    for (workload, entry) in report.benchmarks.iter() {
        let _ = write!(
            html,
            "<tr class=\"header\"><td colspan=\"10\">{}</td></tr>\n\
             <tr><th>Python Version</th><th>Median</th><th>Stddev</th><th>Mean</th><th>Min</th><th>Max</th>\
             <th>CV</th><th>Execution Time Increase</th><th>Status</th><th>Failures</th></tr>\n",
            escape(workload.as_str())
        );
        for version in versions {
            let Some(line) = entry.summary.get(version) else {
                continue;
            };
            let row_class = match line.status {
                ComparisonStatus::Baseline => "baseline",
                ComparisonStatus::Failed => "failed",
                _ => "",
            };
            let relative = relative_value(line)
                .map_or_else(|| "N/A".to_string(), |r| format!("{r:.2}%"));
            let cv = line
                .cv_percent
                .map_or_else(|| "-".to_string(), |c| format!("{c:.1}%"));
            let failures = match &line.error {
                Some(error) if line.failures > 0 => {
                    format!("<span title=\"{}\">{}</span>", escape(error), line.failures)
                }
                _ => line.failures.to_string(),
            };
            let _ = writeln!(
                html,
                "<tr class=\"{row_class}\"><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td>\
                 <td>{cv}</td><td class=\"{}\">{relative}</td><td>{}</td><td>{failures}</td></tr>",
                escape(version.as_str()),
                seconds(line.median),
                seconds(line.stddev),
                seconds(line.mean),
                seconds(line.min),
                seconds(line.max),
                status_class(line.status),
                line.status,
            );
        }
    }
    html.push_str("</table>\n");
}

fn scaling_table(
    html: &mut String,
    workload: &WorkloadId,
    results: &VersionMap<ScalingVersionResult>,
    versions: &[InterpreterVersion],
) {
    let _ = write!(
        html,
        "<h3>{}</h3>\n<table>\n<tr><th>Python Version</th><th>Series</th><th>Workers</th><th>Mean (s)</th>\
         <th>Stddev</th><th>Speedup</th><th>Efficiency</th><th>Relative</th><th>Status</th></tr>\n",
        escape(workload.as_str())
    );
    for version in versions {
        let Some(result) = results.get(version) else {
            continue;
        };
        let row_class = if result.status == ComparisonStatus::Baseline {
            "baseline"
        } else {
            ""
        };

        if result.points.is_empty() {
            let detail = result
                .error
                .as_deref()
                .map(|e| format!(" ({})", escape(e)))
                .unwrap_or_default();
            let _ = writeln!(
                html,
                "<tr class=\"failed\"><td>{}</td><td colspan=\"7\">no usable measurement{detail}</td><td>{}</td></tr>",
                escape(version.as_str()),
                result.status
            );
            continue;
        }

        if let Some(baseline) = &result.baseline {
            let _ = writeln!(
                html,
                "<tr class=\"{row_class}\"><td>{}</td><td>single worker</td><td>1</td><td>{:.4}</td><td>{:.4}</td>\
                 <td>1.00x</td><td>100.0%</td><td></td><td>{}</td></tr>",
                escape(version.as_str()),
                baseline.mean,
                baseline.stddev,
                result.status
            );
        }
        for point in &result.points {
            let relative = match point.status {
                ComparisonStatus::Baseline => "100.00%".to_string(),
                _ => point
                    .relative_performance
                    .map_or_else(|| "N/A".to_string(), |r| format!("{r:.2}%")),
            };
            let _ = writeln!(
                html,
                "<tr class=\"{row_class}\"><td>{}</td><td>{}</td><td>{}</td><td>{:.4}</td><td>{:.4}</td>\
                 <td>{:.2}x</td><td>{:.1}%</td><td class=\"{}\">{relative}</td><td>{}</td></tr>",
                escape(version.as_str()),
                escape(&point.series),
                point.workers,
                point.duration.mean,
                point.duration.stddev,
                point.speedup,
                point.efficiency * 100.0,
                status_class(point.status),
                point.status
            );
        }
    }
    html.push_str("</table>\n");
}
