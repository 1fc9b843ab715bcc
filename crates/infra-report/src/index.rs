// History index page linking every stored run

use std::fmt::Write;

use pybench_core::domain::RunSummary;

use crate::escape::{escape, gib};

const STYLE: &str = "\
body { font-family: Arial, sans-serif; max-width: 1200px; margin: 0 auto; padding: 20px; }
h1 { color: #333; text-align: center; margin: 40px 0; }
table { width: 100%; border-collapse: collapse; margin-top: 20px; }
th, td { border: 1px solid #ddd; padding: 12px; text-align: left; }
th { background-color: #f8f9fa; color: #333; font-weight: bold; }
tr:nth-child(even) { background-color: #f8f9fa; }
tr:hover { background-color: #f5f5f5; }
a { color: #0366d6; text-decoration: none; }
a:hover { text-decoration: underline; }
.system-info, .git-info { color: #666; }
.timestamp { white-space: nowrap; }
";

/// Render the history page; runs are listed in the order given
pub fn render_index_html(runs: &[RunSummary]) -> String {
    let mut html = String::new();
    let _ = write!(
        html,
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>Python Benchmark History</title>\n\
         <style>\n{STYLE}</style>\n</head>\n<body>\n<h1>Python Benchmark History</h1>\n<table>\n\
         <tr><th>Date</th><th>System Information</th><th>Git Info</th><th>Benchmarks</th><th>Results</th></tr>\n"
    );

    for run in runs {
        let info = &run.system_info;
        let git = match &run.git_info {
            Some(git) => format!(
                "<div class=\"git-info\"><div>Branch: {}</div><div>Commit: {}</div></div>",
                escape(&git.branch),
                escape(&git.commit)
            ),
            None => "N/A".to_string(),
        };
        let id = escape(&run.run_id);
        let _ = writeln!(
            html,
            "<tr><td class=\"timestamp\">{}</td>\
             <td><div class=\"system-info\"><div>CPU: {} cores @ {:.2} MHz</div><div>Memory: {}</div><div>OS: {}</div></div></td>\
             <td>{git}</td><td>{} timing, {} scaling</td><td><a href=\"runs/{id}.html\">View Results</a></td></tr>",
            run.created_at.format("%Y-%m-%d %H:%M:%S"),
            info.cpu_count,
            info.cpu_freq.current,
            gib(info.memory_total),
            escape(&info.os_info),
            run.benchmark_count,
            run.scaling_count,
        );
    }

    html.push_str("</table>\n</body>\n</html>\n");
    html
}
