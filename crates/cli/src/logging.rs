//! Logging setup
//!
//! Logs go to stderr so stdout stays clean for tables and JSON.
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: filter directives (default: `pybench=info`, `pybench=debug` with `-v`)
//! - `PYBENCH_LOG_FORMAT`: `json` for JSON lines, anything else for compact text

use anyhow::{Context, Result};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LOG_FORMAT_ENV: &str = "PYBENCH_LOG_FORMAT";

fn default_directive(verbose: u8) -> &'static str {
    match verbose {
        0 => "pybench=info",
        1 => "pybench=debug",
        _ => "pybench=trace",
    }
}

pub fn init_logging(verbose: u8) -> Result<()> {
    let log_format = std::env::var(LOG_FORMAT_ENV).unwrap_or_else(|_| "text".to_string());

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directive(verbose)))
        .context("Failed to create env filter")?;

    match log_format.as_str() {
        "json" => tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
        _ => tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().compact().with_writer(std::io::stderr))
            .try_init(),
    }
    .context("Failed to install tracing subscriber")
}
