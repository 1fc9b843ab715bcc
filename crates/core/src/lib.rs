// pybench Core - Domain Logic, Ports & Aggregation Services
// NO infrastructure dependencies (adapters live in infra-* crates)

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod port;

pub use error::{AppError, Result};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
