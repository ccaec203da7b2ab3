use crate::calculator::DerivedMetrics;
use crate::trend::TrendDirection;
use campaign_core::types::{MetricKind, Period};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Series
// ---------------------------------------------------------------------------

/// One point of a time-ordered metric series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

/// Per-point verdict produced by the anomaly detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyPoint {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
    pub is_anomaly: bool,
    /// Distance from the window mean in standard deviations.
    pub score: f64,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnomalySeverity {
    Medium,
    High,
}

/// A flagged point as reported in a performance analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anomaly {
    pub timestamp: DateTime<Utc>,
    pub metric: MetricKind,
    pub value: f64,
    /// Window mean the value was compared against.
    pub expected: f64,
    pub score: f64,
    pub severity: AnomalySeverity,
    pub description: String,
}

// ---------------------------------------------------------------------------
// Insights
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightType {
    LowCtr,
    HighCpa,
    LowRoi,
}

/// A threshold finding. `id` stays `None` until the store has persisted it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignInsight {
    pub id: Option<Uuid>,
    pub campaign_id: String,
    pub insight_type: InsightType,
    pub severity: Severity,
    pub title: String,
    pub description: String,
    pub current_value: f64,
    pub threshold_value: f64,
    pub recommendation: String,
    pub action_items: Vec<String>,
    pub detected_at: DateTime<Utc>,
    pub is_resolved: bool,
}

// ---------------------------------------------------------------------------
// Analysis
// ---------------------------------------------------------------------------

/// Window totals plus averages of the per-record ratios.
///
/// The averages are means of each record's own ratio, not ratios of the
/// summed totals, so `avg_ctr` generally differs from
/// `total_clicks / total_impressions`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSummary {
    pub record_count: usize,
    pub total_impressions: u64,
    pub total_clicks: u64,
    pub total_conversions: u64,
    pub total_spend: f64,
    pub total_revenue: f64,
    pub avg_ctr: f64,
    pub avg_cpc: f64,
    pub avg_cpa: f64,
    pub avg_roi: f64,
    pub avg_roas: f64,
}

impl PerformanceSummary {
    pub fn average_of(&self, metric: MetricKind) -> f64 {
        match metric {
            MetricKind::Ctr => self.avg_ctr,
            MetricKind::Cpc => self.avg_cpc,
            MetricKind::Cpa => self.avg_cpa,
            MetricKind::Roi => self.avg_roi,
            MetricKind::Roas => self.avg_roas,
        }
    }

    /// Aggregate derived ratios from a non-empty window.
    pub(crate) fn from_window(
        totals: &WindowTotals,
        derived: &[DerivedMetrics],
    ) -> Self {
        Self {
            record_count: derived.len(),
            total_impressions: totals.impressions,
            total_clicks: totals.clicks,
            total_conversions: totals.conversions,
            total_spend: totals.spend,
            total_revenue: totals.revenue,
            avg_ctr: mean_of(derived, |d| d.ctr),
            avg_cpc: mean_of(derived, |d| d.cpc),
            avg_cpa: mean_of(derived, |d| d.cpa),
            avg_roi: mean_of(derived, |d| d.roi),
            avg_roas: mean_of(derived, |d| d.roas),
        }
    }
}

fn mean_of(derived: &[DerivedMetrics], field: impl Fn(&DerivedMetrics) -> f64) -> f64 {
    if derived.is_empty() {
        return 0.0;
    }
    derived.iter().map(field).sum::<f64>() / derived.len() as f64
}

#[derive(Debug, Clone, Default)]
pub(crate) struct WindowTotals {
    pub impressions: u64,
    pub clicks: u64,
    pub conversions: u64,
    pub spend: f64,
    pub revenue: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceAnalysis {
    pub campaign_id: String,
    pub period: Period,
    pub summary: PerformanceSummary,
    pub insights: Vec<CampaignInsight>,
    pub anomalies: Vec<Anomaly>,
}

// ---------------------------------------------------------------------------
// Recommendations
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationType {
    Creative,
    Bidding,
    Budget,
    Targeting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn weight(self) -> u8 {
        match self {
            Priority::High => 3,
            Priority::Medium => 2,
            Priority::Low => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Effort {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationRecommendation {
    pub recommendation_type: RecommendationType,
    pub priority: Priority,
    pub title: String,
    pub description: String,
    pub expected_impact: String,
    pub action_items: Vec<String>,
    pub estimated_effort: Effort,
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

/// Per-dimension health components, each within `[0, 25]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HealthBreakdown {
    pub ctr: f64,
    pub cpa: f64,
    pub roi: f64,
    pub spend: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignHealthScore {
    pub campaign_id: String,
    /// Rounded sum of the breakdown, within `[0, 100]`.
    pub overall: u8,
    pub breakdown: HealthBreakdown,
    pub trend: TrendDirection,
}
