// Comparison against the baseline interpreter build

use serde::{Deserialize, Serialize};
use std::fmt;

/// Default width of the "similar" band around the baseline (±10%)
pub const DEFAULT_THRESHOLD_PERCENT: f64 = 10.0;

/// Outcome of comparing one build against the baseline build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonStatus {
    Baseline,
    Improved,
    Similar,
    Degraded,
    /// The baseline build produced no statistics to compare against
    NoBaseline,
    /// No successful iteration
    Failed,
}

impl fmt::Display for ComparisonStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ComparisonStatus::Baseline => "baseline",
            ComparisonStatus::Improved => "improved",
            ComparisonStatus::Similar => "similar",
            ComparisonStatus::Degraded => "degraded",
            ComparisonStatus::NoBaseline => "no_baseline",
            ComparisonStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Symmetric band around 100% inside which builds count as similar
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComparisonThreshold {
    pub percent: f64,
}

impl Default for ComparisonThreshold {
    fn default() -> Self {
        Self {
            percent: DEFAULT_THRESHOLD_PERCENT,
        }
    }
}

impl ComparisonThreshold {
    pub fn new(percent: f64) -> Self {
        Self { percent }
    }

    /// Classify a relative figure (`mean / baseline_mean * 100`).
    ///
    /// Lower is faster. Both band edges count as similar.
    pub fn classify(&self, relative: f64) -> ComparisonStatus {
        if relative < 100.0 - self.percent {
            ComparisonStatus::Improved
        } else if relative > 100.0 + self.percent {
            ComparisonStatus::Degraded
        } else {
            ComparisonStatus::Similar
        }
    }
}

/// Mean duration relative to the baseline mean, in percent.
///
/// `None` when the baseline mean is not strictly positive.
pub fn relative_percent(mean: f64, baseline_mean: f64) -> Option<f64> {
    if baseline_mean > 0.0 && baseline_mean.is_finite() {
        Some(mean / baseline_mean * 100.0)
    } else {
        None
    }
}

/// Render a relative figure the way reports print it (`"93.41%"`)
pub fn format_relative(relative: f64) -> String {
    format!("{relative:.2}%")
}

/// Parse a rendered relative figure back (`"93.41%"` -> 93.41)
pub fn parse_relative(s: &str) -> Option<f64> {
    s.trim().trim_end_matches('%').trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_bands() {
        let t = ComparisonThreshold::default();
        assert_eq!(t.classify(85.0), ComparisonStatus::Improved);
        assert_eq!(t.classify(89.99), ComparisonStatus::Improved);
        assert_eq!(t.classify(90.0), ComparisonStatus::Similar);
        assert_eq!(t.classify(100.0), ComparisonStatus::Similar);
        assert_eq!(t.classify(110.0), ComparisonStatus::Similar);
        assert_eq!(t.classify(110.01), ComparisonStatus::Degraded);
    }

    #[test]
    fn test_custom_threshold() {
        let t = ComparisonThreshold::new(5.0);
        assert_eq!(t.classify(94.0), ComparisonStatus::Improved);
        assert_eq!(t.classify(106.0), ComparisonStatus::Degraded);
    }

    #[test]
    fn test_relative_percent_requires_positive_baseline() {
        assert_eq!(relative_percent(1.5, 1.0), Some(150.0));
        assert_eq!(relative_percent(1.0, 0.0), None);
        assert_eq!(relative_percent(1.0, -2.0), None);
    }

    #[test]
    fn test_relative_formatting() {
        assert_eq!(format_relative(93.4099), "93.41%");
        assert_eq!(parse_relative("93.41%"), Some(93.41));
        assert_eq!(parse_relative("n/a"), None);
    }

    #[test]
    fn test_status_serializes_snake_case() {
        let json = serde_json::to_string(&ComparisonStatus::NoBaseline).unwrap();
        assert_eq!(json, "\"no_baseline\"");
    }
}
