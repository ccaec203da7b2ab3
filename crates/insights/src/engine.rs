//! Insight engine. Fetches a campaign's metric window from the store,
//! summarizes it, flags anomalies and threshold violations, and derives
//! recommendations and a health score from the result.

use crate::anomaly::{AnomalyDetector, WindowStats};
use crate::calculator::DerivedMetrics;
use crate::health::HealthScorer;
use crate::recommendations;
use crate::store::MetricsStore;
use crate::thresholds::ThresholdEvaluator;
use crate::trend::TrendDirection;
use crate::types::{
    Anomaly, AnomalySeverity, CampaignHealthScore, CampaignInsight, InsightType,
    OptimizationRecommendation, PerformanceAnalysis, PerformanceSummary, SeriesPoint, Severity,
    WindowTotals,
};
use campaign_core::config::InsightsConfig;
use campaign_core::types::{MetricKind, MetricRecord, PerformanceThresholds, Period};
use campaign_core::{CampaignError, CampaignResult};
use chrono::{DateTime, Duration, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Days of ROI history the health trend is computed over.
const HEALTH_TREND_DAYS: i64 = 7;

/// Metrics checked against thresholds on every analysis, in report order.
const EVALUATED_METRICS: [MetricKind; 3] = [MetricKind::Ctr, MetricKind::Cpa, MetricKind::Roi];

pub struct InsightEngine {
    store: Arc<dyn MetricsStore>,
    thresholds: PerformanceThresholds,
    detector: AnomalyDetector,
    high_severity_score: f64,
    default_period_days: u32,
    fetch_timeout: std::time::Duration,
    initialized: AtomicBool,
}

impl InsightEngine {
    /// Build an engine over `store`. Threshold overrides in `config` are
    /// merged over the built-in defaults and fixed for the engine's lifetime.
    pub fn new(store: Arc<dyn MetricsStore>, config: &InsightsConfig) -> Self {
        Self {
            store,
            thresholds: PerformanceThresholds::default().with_overrides(&config.thresholds),
            detector: AnomalyDetector::new(config.anomaly_sensitivity),
            high_severity_score: config.high_severity_score,
            default_period_days: config.default_period_days,
            fetch_timeout: std::time::Duration::from_millis(config.fetch_timeout_ms),
            initialized: AtomicBool::new(false),
        }
    }

    pub fn thresholds(&self) -> &PerformanceThresholds {
        &self.thresholds
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    /// Open the store connection. Must be called before any analysis.
    pub async fn initialize(&self) -> CampaignResult<()> {
        self.store.connect().await.map_err(|e| {
            error!(error = %e, "Failed to connect metrics store");
            CampaignError::store(e)
        })?;
        self.initialized.store(true, Ordering::Release);
        info!("Insight engine initialized");
        Ok(())
    }

    pub async fn shutdown(&self) -> CampaignResult<()> {
        self.initialized.store(false, Ordering::Release);
        self.store.disconnect().await.map_err(CampaignError::store)?;
        info!("Insight engine shut down");
        Ok(())
    }

    /// Summarize the campaign over `period` (trailing default window when
    /// `None`), persist one insight per violated threshold, and report CTR
    /// anomalies.
    pub async fn analyze_campaign_performance(
        &self,
        campaign_id: &str,
        period: Option<Period>,
    ) -> CampaignResult<PerformanceAnalysis> {
        let (analysis, _) = self.run_analysis(campaign_id, period).await?;
        Ok(analysis)
    }

    pub async fn recommend_optimization(
        &self,
        campaign_id: &str,
    ) -> CampaignResult<Vec<OptimizationRecommendation>> {
        let (analysis, _) = self.run_analysis(campaign_id, None).await?;
        let recs = recommendations::recommend(&analysis, &self.thresholds);
        info!(
            campaign_id,
            count = recs.len(),
            "Generated optimization recommendations"
        );
        Ok(recs)
    }

    pub async fn get_campaign_health_score(
        &self,
        campaign_id: &str,
    ) -> CampaignResult<CampaignHealthScore> {
        let (analysis, records) = self.run_analysis(campaign_id, None).await?;
        let summary = &analysis.summary;

        let (overall, breakdown) = HealthScorer::score(
            summary.avg_ctr,
            summary.avg_cpa,
            summary.avg_roi,
            summary.total_spend,
            &self.thresholds,
        );

        let trend_start = analysis
            .period
            .end
            .checked_sub_signed(Duration::days(HEALTH_TREND_DAYS))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        let roi_series: Vec<SeriesPoint> = records
            .iter()
            .filter(|r| r.timestamp >= trend_start)
            .map(|r| SeriesPoint {
                timestamp: r.timestamp,
                value: DerivedMetrics::from_record(r).roi,
            })
            .collect();
        let trend = TrendDirection::classify(&roi_series);

        info!(campaign_id, overall, ?trend, "Computed campaign health score");
        Ok(CampaignHealthScore {
            campaign_id: campaign_id.to_string(),
            overall,
            breakdown,
            trend,
        })
    }

    // -- internal helpers ---------------------------------------------------

    async fn run_analysis(
        &self,
        campaign_id: &str,
        period: Option<Period>,
    ) -> CampaignResult<(PerformanceAnalysis, Vec<MetricRecord>)> {
        metrics::counter!("insights.analyses").increment(1);
        let result = self.analyze_window(campaign_id, period).await;
        if let Err(e) = &result {
            metrics::counter!("insights.failures").increment(1);
            warn!(campaign_id, error = %e, "Campaign analysis failed");
        }
        result
    }

    async fn analyze_window(
        &self,
        campaign_id: &str,
        period: Option<Period>,
    ) -> CampaignResult<(PerformanceAnalysis, Vec<MetricRecord>)> {
        if !self.is_initialized() {
            return Err(CampaignError::NotInitialized);
        }
        if campaign_id.trim().is_empty() {
            return Err(CampaignError::validation("campaign_id is required"));
        }
        let period = match period {
            Some(period) => period,
            None => Period::trailing_days(self.default_period_days, Utc::now())?,
        };
        period.validate()?;

        let records = self.fetch(campaign_id, &period).await?;
        if records.is_empty() {
            return Err(CampaignError::NoDataFound);
        }

        let derived: Vec<DerivedMetrics> = records.iter().map(DerivedMetrics::from_record).collect();
        let totals = records.iter().fold(WindowTotals::default(), |mut t, r| {
            t.impressions = t.impressions.saturating_add(r.impressions);
            t.clicks = t.clicks.saturating_add(r.clicks);
            t.conversions = t.conversions.saturating_add(r.conversions);
            t.spend += r.spend;
            t.revenue += r.revenue;
            t
        });
        let summary = PerformanceSummary::from_window(&totals, &derived);

        let ctr_series: Vec<SeriesPoint> = records
            .iter()
            .zip(&derived)
            .map(|(r, d)| SeriesPoint {
                timestamp: r.timestamp,
                value: d.ctr,
            })
            .collect();
        let anomalies = self.flag_anomalies(MetricKind::Ctr, &ctr_series);

        let mut insights = Vec::new();
        for insight in self.threshold_insights(campaign_id, &summary) {
            let saved = self.store.persist_insight(insight).await.map_err(|e| {
                error!(campaign_id, error = %e, "Failed to persist insight");
                CampaignError::store(e)
            })?;
            insights.push(saved);
        }
        metrics::counter!("insights.generated").increment(insights.len() as u64);

        info!(
            campaign_id,
            records = summary.record_count,
            insights = insights.len(),
            anomalies = anomalies.len(),
            "Campaign performance analyzed"
        );

        let analysis = PerformanceAnalysis {
            campaign_id: campaign_id.to_string(),
            period,
            summary,
            insights,
            anomalies,
        };
        Ok((analysis, records))
    }

    async fn fetch(&self, campaign_id: &str, period: &Period) -> CampaignResult<Vec<MetricRecord>> {
        match tokio::time::timeout(self.fetch_timeout, self.store.fetch_metrics(campaign_id, period))
            .await
        {
            Ok(Ok(records)) => {
                debug!(campaign_id, count = records.len(), "Metric window fetched");
                Ok(records)
            }
            Ok(Err(e)) => {
                error!(campaign_id, error = %e, "Metrics fetch failed");
                Err(CampaignError::store(e))
            }
            Err(_) => Err(CampaignError::StoreFailure(format!(
                "metrics fetch timed out after {}ms",
                self.fetch_timeout.as_millis()
            ))),
        }
    }

    fn flag_anomalies(&self, metric: MetricKind, series: &[SeriesPoint]) -> Vec<Anomaly> {
        let stats = WindowStats::of(series.iter().map(|p| p.value));
        self.detector
            .detect(series)
            .into_iter()
            .filter(|p| p.is_anomaly)
            .map(|p| Anomaly {
                timestamp: p.timestamp,
                metric,
                value: p.value,
                expected: stats.mean,
                score: p.score,
                severity: if p.score > self.high_severity_score {
                    AnomalySeverity::High
                } else {
                    AnomalySeverity::Medium
                },
                description: p.description,
            })
            .collect()
    }

    fn threshold_insights(
        &self,
        campaign_id: &str,
        summary: &PerformanceSummary,
    ) -> Vec<CampaignInsight> {
        let now = Utc::now();
        EVALUATED_METRICS
            .iter()
            .filter_map(|&metric| {
                let value = summary.average_of(metric);
                let check = ThresholdEvaluator::evaluate(metric, value, &self.thresholds);
                let severity = check.severity?;
                let level = self.thresholds.get(metric)?;
                let threshold_value = match severity {
                    Severity::Critical => level.critical,
                    Severity::Warning => level.warning,
                };

                warn!(
                    campaign_id,
                    metric = %metric,
                    value,
                    threshold = threshold_value,
                    ?severity,
                    "Performance threshold violated"
                );

                let template = InsightTemplate::for_metric(metric)?;
                Some(CampaignInsight {
                    id: None,
                    campaign_id: campaign_id.to_string(),
                    insight_type: template.insight_type,
                    severity,
                    title: template.title.to_string(),
                    description: format!(
                        "Average {} of {:.4} crossed the {:?} threshold of {:.4}",
                        metric.as_str().to_uppercase(),
                        value,
                        severity,
                        threshold_value
                    ),
                    current_value: value,
                    threshold_value,
                    recommendation: template.recommendation.to_string(),
                    action_items: template.action_items.iter().map(|s| s.to_string()).collect(),
                    detected_at: now,
                    is_resolved: false,
                })
            })
            .collect()
    }
}

struct InsightTemplate {
    insight_type: InsightType,
    title: &'static str,
    recommendation: &'static str,
    action_items: &'static [&'static str],
}

impl InsightTemplate {
    fn for_metric(metric: MetricKind) -> Option<Self> {
        match metric {
            MetricKind::Ctr => Some(Self {
                insight_type: InsightType::LowCtr,
                title: "Low click-through rate",
                recommendation: "Refresh ad creative and review audience relevance",
                action_items: &[
                    "Test new headlines and visuals",
                    "Narrow targeting to engaged segments",
                ],
            }),
            MetricKind::Cpa => Some(Self {
                insight_type: InsightType::HighCpa,
                title: "High cost per acquisition",
                recommendation: "Optimize bids and landing page conversion",
                action_items: &[
                    "Lower bids on non-converting placements",
                    "Audit landing page load time and checkout flow",
                ],
            }),
            MetricKind::Roi => Some(Self {
                insight_type: InsightType::LowRoi,
                title: "Low return on investment",
                recommendation: "Reallocate budget toward profitable channels",
                action_items: &[
                    "Pause the lowest-ROI ad sets",
                    "Review pricing and offer strategy",
                ],
            }),
            MetricKind::Cpc | MetricKind::Roas => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryMetricsStore;
    use crate::types::{Priority, RecommendationType};
    use async_trait::async_trait;

    fn record(campaign_id: &str, days_ago: i64, impressions: u64, clicks: u64, conversions: u64, spend: f64, revenue: f64) -> MetricRecord {
        MetricRecord {
            campaign_id: campaign_id.to_string(),
            timestamp: Utc::now() - Duration::days(days_ago) - Duration::minutes(1),
            impressions,
            clicks,
            conversions,
            spend,
            revenue,
        }
    }

    async fn engine_with(records: Vec<MetricRecord>) -> (InsightEngine, Arc<InMemoryMetricsStore>) {
        let store = Arc::new(InMemoryMetricsStore::with_records(records));
        let engine = InsightEngine::new(store.clone(), &InsightsConfig::default());
        engine.initialize().await.unwrap();
        (engine, store)
    }

    /// Six days of healthy traffic.
    fn healthy_week(campaign_id: &str) -> Vec<MetricRecord> {
        (0..6)
            .map(|d| record(campaign_id, d, 10_000, 300, 15, 300.0, 600.0))
            .collect()
    }

    #[tokio::test]
    async fn test_requires_initialization() {
        let store = Arc::new(InMemoryMetricsStore::with_records(healthy_week("c1")));
        let engine = InsightEngine::new(store, &InsightsConfig::default());

        let err = engine
            .analyze_campaign_performance("c1", None)
            .await
            .unwrap_err();
        assert!(matches!(err, CampaignError::NotInitialized));

        engine.initialize().await.unwrap();
        assert!(engine.analyze_campaign_performance("c1", None).await.is_ok());

        engine.shutdown().await.unwrap();
        assert!(matches!(
            engine.get_campaign_health_score("c1").await,
            Err(CampaignError::NotInitialized)
        ));
    }

    #[tokio::test]
    async fn test_empty_window_is_no_data() {
        let (engine, _) = engine_with(Vec::new()).await;
        let err = engine
            .analyze_campaign_performance("ghost", None)
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "No metrics found for the specified campaign and time period"
        );
    }

    #[tokio::test]
    async fn test_blank_campaign_id_is_rejected() {
        let (engine, _) = engine_with(Vec::new()).await;
        assert!(matches!(
            engine.analyze_campaign_performance("  ", None).await,
            Err(CampaignError::ValidationFailure(_))
        ));
    }

    #[tokio::test]
    async fn test_huge_counters_saturate_totals() {
        let records = vec![
            record("c1", 2, u64::MAX, u64::MAX, 1, 10.0, 20.0),
            record("c1", 1, u64::MAX, 5, 1, 10.0, 20.0),
        ];
        let (engine, _) = engine_with(records).await;
        let analysis = engine.analyze_campaign_performance("c1", None).await.unwrap();
        assert_eq!(analysis.summary.total_impressions, u64::MAX);
        assert_eq!(analysis.summary.total_clicks, u64::MAX);
        assert_eq!(analysis.summary.total_conversions, 2);
    }

    #[tokio::test]
    async fn test_unrepresentable_default_period_is_rejected() {
        let store = Arc::new(InMemoryMetricsStore::with_records(healthy_week("c1")));
        let config = InsightsConfig {
            default_period_days: 200_000_000,
            ..InsightsConfig::default()
        };
        let engine = InsightEngine::new(store, &config);
        engine.initialize().await.unwrap();

        assert!(matches!(
            engine.analyze_campaign_performance("c1", None).await,
            Err(CampaignError::ValidationFailure(_))
        ));
    }

    #[tokio::test]
    async fn test_summary_averages_per_record_ratios() {
        let records = vec![
            record("c1", 2, 1000, 10, 1, 10.0, 20.0),  // ctr 0.01
            record("c1", 1, 100, 10, 1, 10.0, 20.0),   // ctr 0.10
        ];
        let (engine, _) = engine_with(records).await;
        let analysis = engine.analyze_campaign_performance("c1", None).await.unwrap();

        let s = &analysis.summary;
        assert_eq!(s.record_count, 2);
        assert_eq!(s.total_impressions, 1100);
        assert_eq!(s.total_clicks, 20);
        assert!((s.total_spend - 20.0).abs() < 1e-12);
        // mean of ratios, not 20 / 1100
        assert!((s.avg_ctr - 0.055).abs() < 1e-12);
        assert!((s.avg_roi - 1.0).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_violations_are_persisted_as_insights() {
        // ctr 0.003 (critical), cpa 60 (warning), roi -0.5 (critical)
        let records: Vec<_> = (0..5)
            .map(|d| record("c2", d, 10_000, 30, 5, 300.0, 150.0))
            .collect();
        let (engine, store) = engine_with(records).await;
        let analysis = engine.analyze_campaign_performance("c2", None).await.unwrap();

        let kinds: Vec<_> = analysis
            .insights
            .iter()
            .map(|i| (i.insight_type, i.severity))
            .collect();
        assert_eq!(
            kinds,
            vec![
                (InsightType::LowCtr, Severity::Critical),
                (InsightType::HighCpa, Severity::Warning),
                (InsightType::LowRoi, Severity::Critical),
            ]
        );
        assert!(analysis.insights.iter().all(|i| i.id.is_some() && !i.is_resolved));
        assert_eq!(analysis.insights[1].threshold_value, 50.0);
        assert_eq!(store.insights_for("c2").len(), 3);
    }

    #[tokio::test]
    async fn test_ctr_spike_reported_as_high_anomaly() {
        let mut records: Vec<_> = (1..7)
            .map(|d| record("c3", d, 10_000, 200, 10, 100.0, 200.0))
            .collect();
        // 0 days ago: ctr 0.5 against a flat 0.02 baseline
        records.push(record("c3", 0, 1000, 500, 10, 100.0, 200.0));
        let (engine, _) = engine_with(records).await;

        let analysis = engine.analyze_campaign_performance("c3", None).await.unwrap();
        assert_eq!(analysis.anomalies.len(), 1);
        let anomaly = &analysis.anomalies[0];
        assert_eq!(anomaly.metric, MetricKind::Ctr);
        assert!(anomaly.description.starts_with("spike"));
        // 1 outlier among 7 points sits sqrt(6) ≈ 2.45σ out
        assert_eq!(anomaly.severity, AnomalySeverity::Medium);
    }

    #[tokio::test]
    async fn test_recommendations_rank_high_first() {
        // ctr 0.002 < 0.01, cpa 150 > 50, roi > 0.5 with spend < 1000
        let records: Vec<_> = (0..3)
            .map(|d| record("c4", d, 10_000, 20, 1, 150.0, 300.0))
            .collect();
        let (engine, _) = engine_with(records).await;

        let recs = engine.recommend_optimization("c4").await.unwrap();
        assert!(recs
            .iter()
            .any(|r| r.recommendation_type == RecommendationType::Creative && r.priority == Priority::High));
        assert!(recs
            .iter()
            .any(|r| r.recommendation_type == RecommendationType::Bidding && r.priority == Priority::High));
        let first_medium = recs.iter().position(|r| r.priority == Priority::Medium);
        let last_high = recs.iter().rposition(|r| r.priority == Priority::High);
        if let (Some(m), Some(h)) = (first_medium, last_high) {
            assert!(h < m);
        }
    }

    #[tokio::test]
    async fn test_health_score_with_improving_roi() {
        let records: Vec<_> = (0..6)
            .map(|d| {
                // older days earn less revenue
                let revenue = 300.0 + (6 - d) as f64 * 60.0;
                record("c5", d, 10_000, 300, 15, 300.0, revenue)
            })
            .collect();
        let (engine, _) = engine_with(records).await;

        let health = engine.get_campaign_health_score("c5").await.unwrap();
        assert_eq!(health.campaign_id, "c5");
        assert_eq!(health.trend, TrendDirection::Improving);
        assert!(health.overall <= 100);
        let b = health.breakdown;
        assert_eq!(health.overall, (b.ctr + b.cpa + b.roi + b.spend).round() as u8);
    }

    #[tokio::test]
    async fn test_healthy_campaign_has_no_insights() {
        let (engine, store) = engine_with(healthy_week("c6")).await;
        let analysis = engine.analyze_campaign_performance("c6", None).await.unwrap();
        assert!(analysis.insights.is_empty());
        assert!(analysis.anomalies.is_empty());
        assert!(store.insights_for("c6").is_empty());
    }

    struct FailingStore {
        fail_fetch: bool,
    }

    #[async_trait]
    impl MetricsStore for FailingStore {
        async fn fetch_metrics(&self, campaign_id: &str, _period: &Period) -> anyhow::Result<Vec<MetricRecord>> {
            if self.fail_fetch {
                anyhow::bail!("database unavailable");
            }
            Ok((0..3)
                .map(|d| record(campaign_id, d, 10_000, 10, 1, 500.0, 10.0))
                .collect())
        }

        async fn persist_insight(&self, _insight: CampaignInsight) -> anyhow::Result<CampaignInsight> {
            anyhow::bail!("write rejected")
        }
    }

    #[tokio::test]
    async fn test_store_errors_surface_as_store_failure() {
        let engine = InsightEngine::new(Arc::new(FailingStore { fail_fetch: true }), &InsightsConfig::default());
        engine.initialize().await.unwrap();
        let err = engine.analyze_campaign_performance("c7", None).await.unwrap_err();
        assert_eq!(err.to_string(), "Store error: database unavailable");
    }

    #[tokio::test]
    async fn test_persist_failure_fails_whole_analysis() {
        let engine = InsightEngine::new(Arc::new(FailingStore { fail_fetch: false }), &InsightsConfig::default());
        engine.initialize().await.unwrap();
        let err = engine.analyze_campaign_performance("c8", None).await.unwrap_err();
        assert!(matches!(err, CampaignError::StoreFailure(_)));
    }

    struct SlowStore;

    #[async_trait]
    impl MetricsStore for SlowStore {
        async fn fetch_metrics(&self, _campaign_id: &str, _period: &Period) -> anyhow::Result<Vec<MetricRecord>> {
            tokio::time::sleep(std::time::Duration::from_secs(5)).await;
            Ok(Vec::new())
        }

        async fn persist_insight(&self, insight: CampaignInsight) -> anyhow::Result<CampaignInsight> {
            Ok(insight)
        }
    }

    #[tokio::test]
    async fn test_fetch_timeout() {
        let config = InsightsConfig {
            fetch_timeout_ms: 20,
            ..InsightsConfig::default()
        };
        let engine = InsightEngine::new(Arc::new(SlowStore), &config);
        engine.initialize().await.unwrap();
        let err = engine.analyze_campaign_performance("c9", None).await.unwrap_err();
        assert!(err.to_string().contains("timed out after 20ms"));
    }

    #[tokio::test]
    async fn test_threshold_overrides_apply() {
        let mut config = InsightsConfig::default();
        config
            .thresholds
            .insert(MetricKind::Ctr, campaign_core::types::ThresholdLevel::new(0.05, 0.04));
        let store = Arc::new(InMemoryMetricsStore::with_records(healthy_week("c10")));
        let engine = InsightEngine::new(store, &config);
        engine.initialize().await.unwrap();

        // healthy ctr 0.03 is now below the overridden critical level
        let analysis = engine.analyze_campaign_performance("c10", None).await.unwrap();
        assert_eq!(analysis.insights.len(), 1);
        assert_eq!(analysis.insights[0].severity, Severity::Critical);
        assert_eq!(engine.thresholds().get(MetricKind::Cpa).unwrap().warning, 50.0);
    }
}
