//! Composite 0–100 campaign health score.

use crate::types::HealthBreakdown;
use campaign_core::types::{MetricKind, PerformanceThresholds};

const COMPONENT_MAX: f64 = 25.0;
const REASONABLE_SPEND_CEILING: f64 = 10_000.0;

pub struct HealthScorer;

impl HealthScorer {
    /// Score CTR, CPA, ROI and spend independently on `[0, 25]` and return
    /// the rounded sum alongside the breakdown.
    pub fn score(
        ctr: f64,
        cpa: f64,
        roi: f64,
        spend: f64,
        thresholds: &PerformanceThresholds,
    ) -> (u8, HealthBreakdown) {
        let ctr_warning = thresholds.warning_or_default(MetricKind::Ctr);
        let cpa_warning = thresholds.warning_or_default(MetricKind::Cpa);
        let roi_warning = thresholds.warning_or_default(MetricKind::Roi);

        let ctr_score = (ratio(ctr, ctr_warning * 2.0) * COMPONENT_MAX).min(COMPONENT_MAX);
        // Lower CPA scores higher.
        let cpa_score = (COMPONENT_MAX - ratio(cpa, cpa_warning) * COMPONENT_MAX).max(0.0);
        let roi_score = (ratio(roi + 1.0, roi_warning + 1.0) * COMPONENT_MAX).min(COMPONENT_MAX);
        let spend_score = if spend > 0.0 && spend < REASONABLE_SPEND_CEILING {
            COMPONENT_MAX
        } else {
            (COMPONENT_MAX - spend / 1000.0).max(0.0)
        };

        let breakdown = HealthBreakdown {
            ctr: clamp_component(ctr_score),
            cpa: clamp_component(cpa_score),
            roi: clamp_component(roi_score),
            spend: clamp_component(spend_score),
        };
        let total = breakdown.ctr + breakdown.cpa + breakdown.roi + breakdown.spend;
        (total.round() as u8, breakdown)
    }
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

fn clamp_component(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, COMPONENT_MAX)
}
