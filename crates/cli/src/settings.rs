// Settings loading
//
// Layers, lowest first: built-in defaults, optional TOML file, PYBENCH_*
// environment, command-line flags.

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use pybench_core::config::{InterpreterSpec, Settings};
use pybench_core::domain::{ProfileLevel, TimingSource};

const ENV_PREFIX: &str = "PYBENCH";

/// Flag values that override the configuration file and environment
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub iterations: Option<usize>,
    pub profile: Option<ProfileLevel>,
    pub timing: Option<TimingSource>,
    pub output_dir: Option<PathBuf>,
    /// `VERSION` or `VERSION=PATH`; replaces the configured list when not empty
    pub interpreters: Vec<String>,
    pub baseline: Option<String>,
    pub threshold_percent: Option<f64>,
    pub timeout_secs: Option<f64>,
    pub cpu_cores: Option<String>,
    pub thread_limit: Option<u32>,
}

/// Load settings from `path` (if it exists) and the process environment
pub fn load_settings(path: &Path) -> Result<Settings> {
    load_settings_from(path, None)
}

/// Like [`load_settings`], with an explicit environment map instead of the
/// process environment
pub fn load_settings_from(path: &Path, env: Option<HashMap<String, String>>) -> Result<Settings> {
    let config = Config::builder()
        .add_source(File::from(path).required(false))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .source(env),
        )
        .build()
        .with_context(|| format!("Failed to read configuration {}", path.display()))?;

    config
        .try_deserialize()
        .with_context(|| format!("Invalid configuration in {}", path.display()))
}

impl Overrides {
    pub fn apply(self, mut settings: Settings) -> Settings {
        if let Some(iterations) = self.iterations {
            settings.iterations = iterations;
        }
        if let Some(profile) = self.profile {
            settings.profile = profile;
        }
        if let Some(timing) = self.timing {
            settings.timing = timing;
        }
        if let Some(dir) = self.output_dir {
            settings.output_dir = dir;
        }
        if !self.interpreters.is_empty() {
            settings.interpreters = self.interpreters.iter().map(|s| parse_interpreter(s)).collect();
        }
        if let Some(baseline) = self.baseline {
            settings.baseline = baseline;
        }
        if let Some(threshold) = self.threshold_percent {
            settings.threshold_percent = threshold;
        }
        if let Some(timeout) = self.timeout_secs {
            settings.timeout_secs = Some(timeout);
        }
        if let Some(cores) = self.cpu_cores {
            settings.cpu_cores = Some(cores);
        }
        if let Some(limit) = self.thread_limit {
            settings.thread_limit = Some(limit);
        }
        settings
    }
}

fn parse_interpreter(arg: &str) -> InterpreterSpec {
    match arg.split_once('=') {
        Some((version, path)) => InterpreterSpec {
            version: version.trim().to_string(),
            path: Some(PathBuf::from(path.trim())),
        },
        None => InterpreterSpec::new(arg.trim()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(dir: &Path, contents: &str) -> PathBuf {
        let path = dir.join("pybench.toml");
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings =
            load_settings_from(&dir.path().join("pybench.toml"), Some(HashMap::new())).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_file_then_environment() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            dir.path(),
            r#"
iterations = 3
baseline = "3.13.0"
profile = "detailed"
output_dir = "results"

[[interpreters]]
version = "3.13.0"

[[interpreters]]
version = "3.13.0t"
path = "/opt/python3.13t/bin/python"
"#,
        );

        let env = HashMap::from([
            ("PYBENCH_ITERATIONS".to_string(), "7".to_string()),
            ("PYBENCH_TIMEOUT_SECS".to_string(), "30".to_string()),
        ]);
        let settings = load_settings_from(&path, Some(env)).unwrap();

        assert_eq!(settings.iterations, 7);
        assert_eq!(settings.timeout_secs, Some(30.0));
        assert_eq!(settings.baseline, "3.13.0");
        assert_eq!(settings.profile, ProfileLevel::Detailed);
        assert_eq!(settings.output_dir, PathBuf::from("results"));
        assert_eq!(settings.interpreters.len(), 2);
        assert_eq!(
            settings.interpreters[1].path.as_deref(),
            Some(Path::new("/opt/python3.13t/bin/python"))
        );
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(dir.path(), "iterations = \"many\"\n");
        assert!(load_settings_from(&path, Some(HashMap::new())).is_err());
    }

    #[test]
    fn test_flags_win() {
        let overrides = Overrides {
            iterations: Some(2),
            timing: Some(TimingSource::Reported),
            interpreters: vec!["3.13.0".into(), "3.13.0t=/tmp/python3.13t".into()],
            baseline: Some("3.13.0".into()),
            ..Overrides::default()
        };
        let settings = overrides.apply(Settings::default());

        assert_eq!(settings.iterations, 2);
        assert_eq!(settings.timing, TimingSource::Reported);
        assert_eq!(settings.baseline, "3.13.0");
        assert_eq!(settings.interpreters[0], InterpreterSpec::new("3.13.0"));
        assert_eq!(
            settings.interpreters[1].path,
            Some(PathBuf::from("/tmp/python3.13t"))
        );
        // untouched values keep their layer
        assert_eq!(settings.profile, ProfileLevel::Basic);
    }
}
