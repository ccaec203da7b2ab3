//! Trend direction from a least-squares slope over sequence index.

use crate::types::SeriesPoint;
use serde::{Deserialize, Serialize};

const SLOPE_THRESHOLD: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Improving,
    Stable,
    Declining,
}

impl TrendDirection {
    /// Classify a series by the OLS slope of value against index. Points are
    /// assumed evenly spaced; timestamps are not used.
    pub fn classify(series: &[SeriesPoint]) -> Self {
        let values: Vec<f64> = series.iter().map(|p| p.value).collect();
        Self::from_values(&values)
    }

    pub fn from_values(values: &[f64]) -> Self {
        match slope(values) {
            Some(s) if s > SLOPE_THRESHOLD => Self::Improving,
            Some(s) if s < -SLOPE_THRESHOLD => Self::Declining,
            _ => Self::Stable,
        }
    }
}

/// Ordinary least-squares slope with x = 0, 1, 2, ...; `None` for fewer
/// than two points.
pub fn slope(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }

    let n = values.len() as f64;
    let sum_x: f64 = (0..values.len()).map(|i| i as f64).sum();
    let sum_y: f64 = values.iter().sum();
    let sum_xy: f64 = values.iter().enumerate().map(|(i, &y)| i as f64 * y).sum();
    let sum_x2: f64 = (0..values.len()).map(|i| (i as f64).powi(2)).sum();

    let denominator = n * sum_x2 - sum_x.powi(2);
    if denominator.abs() < f64::EPSILON {
        return None;
    }
    Some((n * sum_xy - sum_x * sum_y) / denominator)
}
