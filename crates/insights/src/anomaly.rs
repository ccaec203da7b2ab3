//! Whole-window z-score anomaly detection.
//!
//! Every verdict depends on the mean and standard deviation of the full
//! window, so adding points can change the verdict for earlier ones.

use crate::types::{AnomalyPoint, SeriesPoint};
use serde::{Deserialize, Serialize};

pub const DEFAULT_SENSITIVITY: f64 = 2.0;
const MIN_POINTS: usize = 3;

/// Population mean and standard deviation of a window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowStats {
    pub mean: f64,
    pub std_dev: f64,
}

impl WindowStats {
    pub fn of(values: impl Iterator<Item = f64> + Clone) -> Self {
        let (n, sum) = values
            .clone()
            .fold((0usize, 0.0), |(n, sum), v| (n + 1, sum + v));
        if n == 0 {
            return Self {
                mean: 0.0,
                std_dev: 0.0,
            };
        }
        let mean = sum / n as f64;
        let variance = values.map(|v| (v - mean).powi(2)).sum::<f64>() / n as f64;
        Self {
            mean,
            std_dev: variance.sqrt(),
        }
    }

    /// A spread within rounding noise of the mean counts as a flat window.
    pub fn is_flat(&self) -> bool {
        self.std_dev <= f64::EPSILON * self.mean.abs().max(1.0)
    }

    /// Distance of `value` from the mean in standard deviations; `0.0` for a
    /// flat window.
    pub fn z_score(&self, value: f64) -> f64 {
        if self.is_flat() {
            0.0
        } else {
            (value - self.mean).abs() / self.std_dev
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct AnomalyDetector {
    sensitivity: f64,
}

impl AnomalyDetector {
    pub fn new(sensitivity: f64) -> Self {
        Self { sensitivity }
    }

    pub fn sensitivity(&self) -> f64 {
        self.sensitivity
    }

    /// Score every point of `series`. Windows shorter than three points are
    /// reported as all-normal.
    pub fn detect(&self, series: &[SeriesPoint]) -> Vec<AnomalyPoint> {
        if series.len() < MIN_POINTS {
            return series
                .iter()
                .map(|p| AnomalyPoint {
                    timestamp: p.timestamp,
                    value: p.value,
                    is_anomaly: false,
                    score: 0.0,
                    description: "Insufficient data for anomaly detection".to_string(),
                })
                .collect();
        }

        let stats = WindowStats::of(series.iter().map(|p| p.value));
        series
            .iter()
            .map(|p| {
                let score = stats.z_score(p.value);
                let is_anomaly = score > self.sensitivity;
                let description = if is_anomaly {
                    let direction = if p.value > stats.mean { "spike" } else { "drop" };
                    format!("{} of {:.2}σ from mean", direction, score)
                } else {
                    "Within normal range".to_string()
                };
                AnomalyPoint {
                    timestamp: p.timestamp,
                    value: p.value,
                    is_anomaly,
                    score,
                    description,
                }
            })
            .collect()
    }
}

impl Default for AnomalyDetector {
    fn default() -> Self {
        Self::new(DEFAULT_SENSITIVITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn series(values: &[f64]) -> Vec<SeriesPoint> {
        let base = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        values
            .iter()
            .enumerate()
            .map(|(i, &value)| SeriesPoint {
                timestamp: base + Duration::days(i as i64),
                value,
            })
            .collect()
    }

    #[test]
    fn test_constant_series_has_no_anomalies() {
        let points = AnomalyDetector::default().detect(&series(&[0.02; 10]));
        assert_eq!(points.len(), 10);
        assert!(points.iter().all(|p| !p.is_anomaly && p.score == 0.0));
    }

    #[test]
    fn test_rounding_noise_in_flat_window_scores_zero() {
        for n in [3, 7] {
            let values = vec![0.1; n];
            let stats = WindowStats::of(values.iter().copied());
            assert!(stats.is_flat());
            assert_eq!(stats.z_score(0.1), 0.0);

            let points = AnomalyDetector::default().detect(&series(&values));
            assert!(points.iter().all(|p| p.score == 0.0 && !p.is_anomaly));
        }
    }

    #[test]
    fn test_short_series_is_insufficient() {
        let points = AnomalyDetector::default().detect(&series(&[1.0, 100.0]));
        assert_eq!(points.len(), 2);
        assert!(points.iter().all(|p| !p.is_anomaly));
        assert!(points[0].description.contains("Insufficient data"));
    }

    #[test]
    fn test_spike_is_flagged_with_direction() {
        let mut values = vec![10.0; 9];
        values.push(100.0);
        let points = AnomalyDetector::default().detect(&series(&values));

        let flagged: Vec<_> = points.iter().filter(|p| p.is_anomaly).collect();
        assert_eq!(flagged.len(), 1);
        assert_eq!(flagged[0].value, 100.0);
        assert!(flagged[0].description.starts_with("spike of"));
        assert!(flagged[0].description.ends_with("σ from mean"));
        // mean 19, std 27 -> z = 3.0
        assert!((flagged[0].score - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_drop_is_flagged_with_direction() {
        let mut values = vec![50.0; 9];
        values.push(0.0);
        let points = AnomalyDetector::default().detect(&series(&values));
        let flagged = points.iter().find(|p| p.is_anomaly).unwrap();
        assert!(flagged.description.starts_with("drop of"));
    }

    #[test]
    fn test_sensitivity_is_configurable() {
        let values = [1.0, 2.0, 3.0, 4.0, 10.0];
        let strict = AnomalyDetector::new(1.5).detect(&series(&values));
        let lax = AnomalyDetector::new(5.0).detect(&series(&values));
        assert!(strict.iter().any(|p| p.is_anomaly));
        assert!(lax.iter().all(|p| !p.is_anomaly));
    }

    #[test]
    fn test_window_stats_population_std_dev() {
        let stats = WindowStats::of([2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0].into_iter());
        assert!((stats.mean - 5.0).abs() < 1e-12);
        assert!((stats.std_dev - 2.0).abs() < 1e-12);
    }
}
