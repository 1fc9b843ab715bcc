// Descriptive statistics over one series of timing samples

use serde::{Deserialize, Serialize};

/// Summary of a series of durations (seconds)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticalSummary {
    pub mean: f64,
    pub median: f64,
    /// Sample standard deviation (n - 1 denominator), 0 for a single sample
    pub stddev: f64,
    pub min: f64,
    pub max: f64,
    /// Raw samples in run order
    pub iterations: Vec<f64>,
}

impl StatisticalSummary {
    /// Summarize a series; `None` for an empty series
    pub fn from_samples(samples: &[f64]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }

        let n = samples.len() as f64;
        let mean = samples.iter().sum::<f64>() / n;

        let stddev = if samples.len() > 1 {
            let sum_sq: f64 = samples.iter().map(|x| (x - mean).powi(2)).sum();
            (sum_sq / (n - 1.0)).sqrt()
        } else {
            0.0
        };

        let mut sorted = samples.to_vec();
        sorted.sort_by(f64::total_cmp);
        let mid = sorted.len() / 2;
        let median = if sorted.len() % 2 == 0 {
            (sorted[mid - 1] + sorted[mid]) / 2.0
        } else {
            sorted[mid]
        };

        Some(Self {
            mean,
            median,
            stddev,
            min: sorted[0],
            max: sorted[sorted.len() - 1],
            iterations: samples.to_vec(),
        })
    }

    /// Run-to-run variance as a percentage of the mean
    pub fn coefficient_of_variation(&self) -> Option<f64> {
        if self.mean == 0.0 {
            return None;
        }
        Some(self.stddev / self.mean * 100.0)
    }

    pub fn count(&self) -> usize {
        self.iterations.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_empty_series() {
        assert!(StatisticalSummary::from_samples(&[]).is_none());
    }

    #[test]
    fn test_single_sample_has_zero_stddev() {
        let s = StatisticalSummary::from_samples(&[1.5]).unwrap();
        assert_eq!(s.mean, 1.5);
        assert_eq!(s.median, 1.5);
        assert_eq!(s.stddev, 0.0);
        assert_eq!(s.min, 1.5);
        assert_eq!(s.max, 1.5);
    }

    #[test]
    fn test_odd_and_even_medians() {
        let odd = StatisticalSummary::from_samples(&[3.0, 1.0, 2.0]).unwrap();
        assert_eq!(odd.median, 2.0);
        assert_eq!(odd.iterations, vec![3.0, 1.0, 2.0]);

        let even = StatisticalSummary::from_samples(&[4.0, 1.0, 3.0, 2.0]).unwrap();
        assert_eq!(even.median, 2.5);
        assert_eq!(even.min, 1.0);
        assert_eq!(even.max, 4.0);
    }

    #[test]
    fn test_sample_stddev() {
        // mean 5, squared deviations sum 32, n-1 = 7
        let s = StatisticalSummary::from_samples(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0])
            .unwrap();
        assert!(approx(s.mean, 5.0));
        assert!(approx(s.stddev, (32.0f64 / 7.0).sqrt()));
    }

    #[test]
    fn test_coefficient_of_variation() {
        let s = StatisticalSummary::from_samples(&[1.0, 3.0]).unwrap();
        let cv = s.coefficient_of_variation().unwrap();
        assert!(approx(cv, 2.0f64.sqrt() / 2.0 * 100.0));

        let zero = StatisticalSummary::from_samples(&[0.0, 0.0]).unwrap();
        assert!(zero.coefficient_of_variation().is_none());
    }
}
