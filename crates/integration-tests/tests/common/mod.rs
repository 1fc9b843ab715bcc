//! Shared fixtures: a benchmark tree on disk and shell scripts posing as
//! interpreter builds.
//!
//! A fake interpreter answers the `sys.version` probe with a banner and runs
//! every workload "script" with `/bin/sh`, exporting `FAKE_VERSION` and
//! `FAKE_DURATION` so workloads can vary their output per build.

#![allow(dead_code)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::TimeZone;
use pybench_core::application::ReportBuilder;
use pybench_core::domain::InterpreterVersion;
use pybench_core::port::system_probe::mocks::MockSystemProbe;
use pybench_core::port::{FixedIdProvider, FixedTimeProvider, Interpreter, InterpreterResolver};
use pybench_infra_system::PyenvResolver;

pub fn v(label: &str) -> InterpreterVersion {
    InterpreterVersion::parse(label).unwrap()
}

pub fn write_executable(path: &Path, body: &str) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, body).unwrap();
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).unwrap();
}

pub fn write_workload(path: &Path, body: &str) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, body).unwrap();
}

/// Fake build `label` whose workloads see `FAKE_DURATION=duration`
pub fn fake_python(dir: &Path, label: &str, duration: f64) -> PathBuf {
    let version = v(label);
    let banner = if version.is_free_threaded() {
        format!("{} experimental free-threading build (main, Oct  7 2024)", version.base())
    } else {
        format!("{label} (main, Oct  7 2024) [GCC 13.2.0]")
    };
    let path = dir.join("pythons").join(label).join("bin").join("python");
    write_executable(
        &path,
        &format!(
            "#!/bin/sh\n\
             if [ \"$1\" = \"-c\" ]; then\n  echo '{banner}'\n  exit 0\nfi\n\
             export FAKE_VERSION='{label}'\n\
             export FAKE_DURATION='{duration}'\n\
             exec /bin/sh \"$@\"\n"
        ),
    );
    path
}

/// Resolve fake builds through the real resolver (explicit path + banner check)
pub async fn resolve_all(dir: &Path, builds: &[(&str, f64)]) -> Vec<Interpreter> {
    let resolver = PyenvResolver::new();
    let mut interpreters = Vec::new();
    for (label, duration) in builds {
        let path = fake_python(dir, label, *duration);
        interpreters.push(resolver.resolve(&v(label), Some(path)).await.unwrap());
    }
    interpreters
}

pub fn report_builder(run_id: &str) -> ReportBuilder {
    ReportBuilder::new(
        Arc::new(MockSystemProbe::new().with_git("main", "0123abcd")),
        Arc::new(FixedTimeProvider(
            chrono::Utc.with_ymd_and_hms(2024, 10, 7, 12, 0, 0).unwrap(),
        )),
        Arc::new(FixedIdProvider(run_id.to_string())),
    )
}
