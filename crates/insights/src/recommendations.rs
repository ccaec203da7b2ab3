//! Optimization recommendations derived from a performance analysis.

use crate::types::{
    AnomalySeverity, Effort, OptimizationRecommendation, PerformanceAnalysis, Priority,
    RecommendationType,
};
use campaign_core::types::{MetricKind, PerformanceThresholds};

const SCALE_UP_MIN_ROI: f64 = 0.5;
const SCALE_UP_MAX_SPEND: f64 = 1000.0;

/// Build recommendations for `analysis`, ordered by priority (high first).
/// Equal priorities keep generation order.
pub fn recommend(
    analysis: &PerformanceAnalysis,
    thresholds: &PerformanceThresholds,
) -> Vec<OptimizationRecommendation> {
    let summary = &analysis.summary;
    let mut recs = Vec::new();

    if let Some(level) = thresholds.get(MetricKind::Ctr) {
        if summary.avg_ctr < level.warning {
            recs.push(OptimizationRecommendation {
                recommendation_type: RecommendationType::Creative,
                priority: Priority::High,
                title: "Refresh ad creative".to_string(),
                description: format!(
                    "Average CTR of {:.2}% is below the {:.2}% target. Current creative is not earning clicks.",
                    summary.avg_ctr * 100.0,
                    level.warning * 100.0
                ),
                expected_impact: "15-30% CTR improvement".to_string(),
                action_items: vec![
                    "A/B test new headlines and calls to action".to_string(),
                    "Rotate in fresh imagery".to_string(),
                    "Retire the lowest-performing variants".to_string(),
                ],
                estimated_effort: Effort::Medium,
            });
        }
    }

    if let Some(level) = thresholds.get(MetricKind::Cpa) {
        if summary.avg_cpa > level.warning {
            recs.push(OptimizationRecommendation {
                recommendation_type: RecommendationType::Bidding,
                priority: Priority::High,
                title: "Adjust bidding strategy".to_string(),
                description: format!(
                    "Average CPA of ${:.2} exceeds the ${:.2} target.",
                    summary.avg_cpa, level.warning
                ),
                expected_impact: "10-25% CPA reduction".to_string(),
                action_items: vec![
                    "Switch to target-CPA bidding".to_string(),
                    "Lower bids on placements with no conversions".to_string(),
                    "Add negative keywords for irrelevant traffic".to_string(),
                ],
                estimated_effort: Effort::Low,
            });
        }
    }

    if summary.avg_roi > SCALE_UP_MIN_ROI && summary.total_spend < SCALE_UP_MAX_SPEND {
        recs.push(OptimizationRecommendation {
            recommendation_type: RecommendationType::Budget,
            priority: Priority::Medium,
            title: "Scale up budget".to_string(),
            description: format!(
                "ROI of {:.0}% on ${:.2} spend leaves room to grow.",
                summary.avg_roi * 100.0,
                summary.total_spend
            ),
            expected_impact: "Proportional revenue growth at similar ROI".to_string(),
            action_items: vec![
                "Increase daily budget by 20-50%".to_string(),
                "Monitor ROI for diminishing returns".to_string(),
            ],
            estimated_effort: Effort::Low,
        });
    }

    if analysis
        .anomalies
        .iter()
        .any(|a| a.severity == AnomalySeverity::High)
    {
        recs.push(OptimizationRecommendation {
            recommendation_type: RecommendationType::Targeting,
            priority: Priority::Medium,
            title: "Review audience targeting".to_string(),
            description: "Severe swings in CTR suggest the campaign is reaching inconsistent audiences."
                .to_string(),
            expected_impact: "More stable engagement".to_string(),
            action_items: vec![
                "Inspect placements and audiences active during anomalies".to_string(),
                "Tighten audience exclusions".to_string(),
            ],
            estimated_effort: Effort::Medium,
        });
    }

    // Vec::sort_by is stable, so ties keep generation order.
    recs.sort_by(|a, b| b.priority.weight().cmp(&a.priority.weight()));
    recs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Anomaly, PerformanceSummary};
    use campaign_core::types::Period;
    use chrono::Utc;

    fn analysis(avg_ctr: f64, avg_cpa: f64, avg_roi: f64, total_spend: f64) -> PerformanceAnalysis {
        PerformanceAnalysis {
            campaign_id: "cmp-1".to_string(),
            period: Period::trailing_days(7, Utc::now()).unwrap(),
            summary: PerformanceSummary {
                record_count: 7,
                total_impressions: 10_000,
                total_clicks: 100,
                total_conversions: 5,
                total_spend,
                total_revenue: 0.0,
                avg_ctr,
                avg_cpc: 1.0,
                avg_cpa,
                avg_roi,
                avg_roas: avg_roi + 1.0,
            },
            insights: Vec::new(),
            anomalies: Vec::new(),
        }
    }

    fn high_anomaly() -> Anomaly {
        Anomaly {
            timestamp: Utc::now(),
            metric: MetricKind::Ctr,
            value: 0.5,
            expected: 0.02,
            score: 4.2,
            severity: AnomalySeverity::High,
            description: "spike of 4.20σ from mean".to_string(),
        }
    }

    #[test]
    fn test_healthy_campaign_gets_nothing() {
        let recs = recommend(&analysis(0.03, 20.0, 0.3, 5000.0), &PerformanceThresholds::default());
        assert!(recs.is_empty());
    }

    #[test]
    fn test_high_priority_sorted_before_medium() {
        let mut a = analysis(0.002, 80.0, 0.8, 400.0);
        a.anomalies.push(high_anomaly());
        let recs = recommend(&a, &PerformanceThresholds::default());

        let types: Vec<_> = recs.iter().map(|r| r.recommendation_type).collect();
        assert_eq!(
            types,
            vec![
                RecommendationType::Creative,
                RecommendationType::Bidding,
                RecommendationType::Budget,
                RecommendationType::Targeting,
            ]
        );
        assert_eq!(recs[0].priority, Priority::High);
        assert_eq!(recs[1].priority, Priority::High);
        assert_eq!(recs[2].priority, Priority::Medium);
    }

    #[test]
    fn test_medium_anomalies_do_not_trigger_targeting() {
        let mut a = analysis(0.03, 20.0, 0.3, 5000.0);
        let mut anomaly = high_anomaly();
        anomaly.severity = AnomalySeverity::Medium;
        a.anomalies.push(anomaly);
        assert!(recommend(&a, &PerformanceThresholds::default()).is_empty());
    }

    #[test]
    fn test_scale_up_requires_small_spend() {
        let recs = recommend(&analysis(0.03, 20.0, 0.9, 1000.0), &PerformanceThresholds::default());
        assert!(recs.is_empty());
        let recs = recommend(&analysis(0.03, 20.0, 0.9, 999.0), &PerformanceThresholds::default());
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].recommendation_type, RecommendationType::Budget);
    }
}
