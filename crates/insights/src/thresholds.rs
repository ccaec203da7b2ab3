//! Warning/critical threshold evaluation with per-metric polarity.

use crate::types::Severity;
use campaign_core::types::{MetricKind, PerformanceThresholds};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThresholdCheck {
    pub violated: bool,
    pub severity: Option<Severity>,
}

impl ThresholdCheck {
    pub const OK: Self = Self {
        violated: false,
        severity: None,
    };

    fn violated(severity: Severity) -> Self {
        Self {
            violated: true,
            severity: Some(severity),
        }
    }
}

pub struct ThresholdEvaluator;

impl ThresholdEvaluator {
    /// Compare `value` against the configured levels for `metric`. Critical
    /// takes precedence over warning; an unconfigured metric never fires.
    pub fn evaluate(
        metric: MetricKind,
        value: f64,
        thresholds: &PerformanceThresholds,
    ) -> ThresholdCheck {
        let Some(level) = thresholds.get(metric) else {
            return ThresholdCheck::OK;
        };

        if metric.higher_is_better() {
            if value <= level.critical {
                ThresholdCheck::violated(Severity::Critical)
            } else if value <= level.warning {
                ThresholdCheck::violated(Severity::Warning)
            } else {
                ThresholdCheck::OK
            }
        } else if value >= level.critical {
            ThresholdCheck::violated(Severity::Critical)
        } else if value >= level.warning {
            ThresholdCheck::violated(Severity::Warning)
        } else {
            ThresholdCheck::OK
        }
    }
}
