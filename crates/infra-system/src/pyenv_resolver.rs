// Interpreter resolution through pyenv
// Explicit paths skip discovery; every interpreter is validated against its banner
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, info};

use pybench_core::domain::InterpreterVersion;
use pybench_core::error::{AppError, Result};
use pybench_core::port::{Interpreter, InterpreterResolver};

use crate::subprocess_runner::is_executable;

const BANNER_SNIPPET: &str = "import sys; print(sys.version)";

pub struct PyenvResolver {
    pyenv: PathBuf,
}

impl PyenvResolver {
    pub fn new() -> Self {
        Self::with_pyenv("pyenv")
    }

    /// Use a specific pyenv executable
    pub fn with_pyenv(pyenv: impl Into<PathBuf>) -> Self {
        Self {
            pyenv: pyenv.into(),
        }
    }

    async fn pyenv_output(&self, args: &[&str]) -> Result<String> {
        let output = Command::new(&self.pyenv)
            .args(args)
            .output()
            .await
            .map_err(|e| AppError::Interpreter(format!("cannot run pyenv: {e}")))?;
        if !output.status.success() {
            return Err(AppError::Interpreter(format!(
                "pyenv {} failed: {}",
                args.join(" "),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    /// Locate the interpreter of a build through pyenv
    async fn discover(&self, version: &InterpreterVersion) -> Result<PathBuf> {
        let installed = self.pyenv_output(&["versions", "--bare"]).await?;
        let matching = select_installed(version, installed.lines()).ok_or_else(|| {
            AppError::Interpreter(format!("Python {version} not found in pyenv versions"))
        })?;

        let prefix = self.pyenv_output(&["prefix", matching]).await?;
        let python = Path::new(prefix.trim()).join("bin").join("python");
        if !is_executable(&python) {
            return Err(AppError::Interpreter(format!(
                "Python executable not found at {}",
                python.display()
            )));
        }
        debug!(version = %version, installed = matching, path = %python.display(), "Found pyenv interpreter");
        Ok(python)
    }

    async fn validate(&self, version: &InterpreterVersion, path: &Path) -> Result<()> {
        let output = Command::new(path)
            .args(["-c", BANNER_SNIPPET])
            .output()
            .await
            .map_err(|e| {
                AppError::Interpreter(format!("cannot execute {}: {e}", path.display()))
            })?;
        if !output.status.success() {
            return Err(AppError::Interpreter(format!(
                "Failed to execute Python interpreter at {}",
                path.display()
            )));
        }

        let banner = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if !version.matches_banner(&banner) {
            let expected = if version.is_free_threaded() {
                format!("free-threading build of {}", version.base())
            } else {
                version.to_string()
            };
            return Err(AppError::Interpreter(format!(
                "Python version mismatch at {}: expected {expected}, got {banner}",
                path.display()
            )));
        }
        Ok(())
    }
}

impl Default for PyenvResolver {
    fn default() -> Self {
        Self::new()
    }
}

/// Pick the installed pyenv version for a build
///
/// An exact name wins; otherwise the first name starting with the label whose
/// free-threading suffix agrees with it (`3.13` never resolves to `3.13.0t`).
fn select_installed<'a>(
    version: &InterpreterVersion,
    installed: impl Iterator<Item = &'a str>,
) -> Option<&'a str> {
    let names: Vec<&str> = installed.map(str::trim).filter(|l| !l.is_empty()).collect();
    let label = version.as_str();
    names.iter().find(|n| **n == label).copied().or_else(|| {
        names
            .iter()
            .find(|n| n.starts_with(label) && n.ends_with('t') == version.is_free_threaded())
            .copied()
    })
}

#[async_trait]
impl InterpreterResolver for PyenvResolver {
    async fn resolve(
        &self,
        version: &InterpreterVersion,
        explicit_path: Option<PathBuf>,
    ) -> Result<Interpreter> {
        let path = match explicit_path {
            Some(path) => path,
            None => self.discover(version).await?,
        };
        self.validate(version, &path).await?;
        info!(version = %version, path = %path.display(), "Interpreter resolved");
        Ok(Interpreter::new(version.clone(), path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(label: &str) -> InterpreterVersion {
        InterpreterVersion::parse(label).unwrap()
    }

    #[test]
    fn test_select_installed() {
        let installed = ["3.12.7", "3.13.0", "3.13.0t", "3.13.1"];

        assert_eq!(select_installed(&v("3.13.0"), installed.into_iter()), Some("3.13.0"));
        assert_eq!(select_installed(&v("3.13.0t"), installed.into_iter()), Some("3.13.0t"));
        assert_eq!(select_installed(&v("3.12"), installed.into_iter()), Some("3.12.7"));
        assert_eq!(select_installed(&v("3.11.9"), installed.into_iter()), None);
        assert_eq!(
            select_installed(&v("3.13"), ["3.13.0t", "3.13.0"].into_iter()),
            Some("3.13.0")
        );
    }

    #[cfg(unix)]
    mod fake_interpreters {
        use super::*;
        use std::os::unix::fs::PermissionsExt;

        fn write_executable(path: &Path, body: &str) {
            std::fs::write(path, body).unwrap();
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).unwrap();
        }

        fn fake_python(dir: &Path, banner: &str) -> PathBuf {
            let bin = dir.join("bin");
            std::fs::create_dir_all(&bin).unwrap();
            let python = bin.join("python");
            write_executable(&python, &format!("#!/bin/sh\necho '{banner}'\n"));
            python
        }

        #[tokio::test]
        async fn test_explicit_path_is_validated() {
            let dir = tempfile::tempdir().unwrap();
            let python = fake_python(
                dir.path(),
                "3.13.0 experimental free-threading build (main, Oct  7 2024, 10:00:00) [GCC 13.2.0]",
            );
            let resolver = PyenvResolver::new();

            let ok = resolver.resolve(&v("3.13.0t"), Some(python.clone())).await.unwrap();
            assert_eq!(ok.path, python);

            let err = resolver.resolve(&v("3.12.7"), Some(python)).await.unwrap_err();
            assert!(err.to_string().contains("version mismatch"));
        }

        #[tokio::test]
        async fn test_free_threaded_requires_banner_marker() {
            let dir = tempfile::tempdir().unwrap();
            let python = fake_python(dir.path(), "3.13.0 (main, Oct  7 2024) [GCC 13.2.0]");

            let err = PyenvResolver::new()
                .resolve(&v("3.13.0t"), Some(python))
                .await
                .unwrap_err();
            assert!(err.to_string().contains("free-threading build of 3.13.0"));
        }

        #[tokio::test]
        async fn test_discovery_through_pyenv() {
            let dir = tempfile::tempdir().unwrap();
            let prefix = dir.path().join("versions").join("3.12.7");
            fake_python(&prefix, "3.12.7 (main, Oct  1 2024) [Clang 15.0.0]");

            let pyenv = dir.path().join("pyenv");
            write_executable(
                &pyenv,
                &format!(
                    "#!/bin/sh\nif [ \"$1\" = versions ]; then printf '3.11.9\\n3.12.7\\n'; \
                     elif [ \"$1\" = prefix ]; then echo '{}'; else exit 1; fi\n",
                    prefix.display()
                ),
            );
            let resolver = PyenvResolver::with_pyenv(&pyenv);

            let interpreter = resolver.resolve(&v("3.12.7"), None).await.unwrap();
            assert_eq!(interpreter.path, prefix.join("bin").join("python"));

            let missing = resolver.resolve(&v("3.13.0"), None).await.unwrap_err();
            assert!(missing.to_string().contains("not found in pyenv versions"));
        }
    }
}
