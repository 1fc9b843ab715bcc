// System information port
// Host context recorded alongside every run
use async_trait::async_trait;

use crate::domain::{GitInfo, SystemInfo};

/// System probe port
#[async_trait]
pub trait SystemProbe: Send + Sync {
    /// Collect host information
    async fn system_info(&self) -> SystemInfo;

    /// Current branch and commit, `None` outside a git checkout
    async fn git_info(&self) -> Option<GitInfo>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use crate::domain::CpuFrequency;

    pub fn sample_system_info() -> SystemInfo {
        SystemInfo {
            cpu_count: 8,
            available_cores: 8,
            total_threads: 8,
            memory_total: 16 * 1024 * 1024 * 1024,
            os_info: "Linux 6.8.0".to_string(),
            cpu_brand: "Mock CPU".to_string(),
            cpu_freq: CpuFrequency { current: 3200.0 },
            load_avg: [0.5, 0.4, 0.3],
        }
    }

    /// Mock SystemProbe for testing
    pub struct MockSystemProbe {
        info: SystemInfo,
        git: Option<GitInfo>,
    }

    impl MockSystemProbe {
        pub fn new() -> Self {
            Self {
                info: sample_system_info(),
                git: None,
            }
        }

        pub fn with_git(mut self, branch: &str, commit: &str) -> Self {
            self.git = Some(GitInfo {
                branch: branch.to_string(),
                commit: commit.to_string(),
            });
            self
        }
    }

    impl Default for MockSystemProbe {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl SystemProbe for MockSystemProbe {
        async fn system_info(&self) -> SystemInfo {
            self.info.clone()
        }

        async fn git_info(&self) -> Option<GitInfo> {
            self.git.clone()
        }
    }
}
