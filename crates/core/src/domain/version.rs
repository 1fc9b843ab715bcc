// Interpreter Version Label

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::error::{DomainError, Result};

/// Marker suffix of free-threaded (GIL-disabled) builds, e.g. `3.13.0t`
const FREE_THREADED_SUFFIX: char = 't';

/// Marker printed in `sys.version` by free-threaded builds
const FREE_THREADED_BANNER: &str = "free-threading";

/// Version label of an interpreter build (e.g. `3.12.7`, `3.13.0t`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct InterpreterVersion(String);

impl InterpreterVersion {
    pub fn parse(label: impl Into<String>) -> Result<Self> {
        let label = label.into();
        let base = label.strip_suffix(FREE_THREADED_SUFFIX).unwrap_or(&label);

        let valid = !base.is_empty()
            && base
                .split('.')
                .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_digit()));

        if !valid {
            return Err(DomainError::InvalidVersion(label));
        }
        Ok(Self(label))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True for builds with the GIL disabled
    pub fn is_free_threaded(&self) -> bool {
        self.0.ends_with(FREE_THREADED_SUFFIX)
    }

    /// Version without the free-threaded suffix
    pub fn base(&self) -> &str {
        self.0
            .strip_suffix(FREE_THREADED_SUFFIX)
            .unwrap_or(&self.0)
    }

    /// Check a `sys.version` banner against this label.
    ///
    /// Free-threaded builds must advertise `free-threading` and carry the base
    /// version; regular builds must carry the full label.
    pub fn matches_banner(&self, banner: &str) -> bool {
        if self.is_free_threaded() {
            banner.contains(FREE_THREADED_BANNER) && banner.contains(self.base())
        } else {
            banner.contains(self.as_str())
        }
    }
}

impl fmt::Display for InterpreterVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for InterpreterVersion {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for InterpreterVersion {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(value)
    }
}

impl From<InterpreterVersion> for String {
    fn from(value: InterpreterVersion) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_free_threaded_detection() {
        let ft = InterpreterVersion::parse("3.13.0t").unwrap();
        assert!(ft.is_free_threaded());
        assert_eq!(ft.base(), "3.13.0");

        let gil = InterpreterVersion::parse("3.12.7").unwrap();
        assert!(!gil.is_free_threaded());
        assert_eq!(gil.base(), "3.12.7");
    }

    #[test]
    fn test_rejects_malformed_labels() {
        for label in ["", "t", "3..1", "3.13.0tt", "python3", "3.13-dev", ".3"] {
            assert!(
                InterpreterVersion::parse(label).is_err(),
                "{label:?} should be rejected"
            );
        }
        assert!(InterpreterVersion::parse("3.12").is_ok());
    }

    #[test]
    fn test_banner_matching() {
        let ft = InterpreterVersion::parse("3.13.0t").unwrap();
        assert!(ft.matches_banner(
            "3.13.0 experimental free-threading build (main, Oct  8 2024) [Clang 15.0.0]"
        ));
        assert!(!ft.matches_banner("3.13.0 (main, Oct  8 2024) [Clang 15.0.0]"));

        let gil = InterpreterVersion::parse("3.12.7").unwrap();
        assert!(gil.matches_banner("3.12.7 (main, Oct  1 2024) [GCC 13.2.0]"));
        assert!(!gil.matches_banner("3.12.6 (main, Oct  1 2024) [GCC 13.2.0]"));
    }

    #[test]
    fn test_serde_uses_plain_string() {
        let v = InterpreterVersion::parse("3.13.0t").unwrap();
        let json = serde_json::to_string(&v).unwrap();
        assert_eq!(json, "\"3.13.0t\"");

        let bad: std::result::Result<InterpreterVersion, _> = serde_json::from_str("\"abc\"");
        assert!(bad.is_err());
    }
}
