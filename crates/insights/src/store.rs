//! Metrics storage port and an in-process implementation.

use crate::types::CampaignInsight;
use async_trait::async_trait;
use campaign_core::types::{MetricRecord, Period};
use dashmap::DashMap;
use tracing::debug;
use uuid::Uuid;

/// The storage collaborator the insight engine reads metrics from and
/// writes findings to. Implementations own their connection state.
#[async_trait]
pub trait MetricsStore: Send + Sync {
    async fn connect(&self) -> anyhow::Result<()> {
        Ok(())
    }

    async fn disconnect(&self) -> anyhow::Result<()> {
        Ok(())
    }

    /// Records for `campaign_id` inside `period`, ordered by timestamp
    /// ascending.
    async fn fetch_metrics(
        &self,
        campaign_id: &str,
        period: &Period,
    ) -> anyhow::Result<Vec<MetricRecord>>;

    /// Persist a new insight and return it with its assigned id.
    async fn persist_insight(&self, insight: CampaignInsight) -> anyhow::Result<CampaignInsight>;
}

/// Concurrent in-memory store backed by `DashMap`, used by the CLI and tests.
pub struct InMemoryMetricsStore {
    /// campaign_id -> metric records
    records: DashMap<String, Vec<MetricRecord>>,
    /// campaign_id -> persisted insights
    insights: DashMap<String, Vec<CampaignInsight>>,
}

impl InMemoryMetricsStore {
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
            insights: DashMap::new(),
        }
    }

    pub fn with_records(records: impl IntoIterator<Item = MetricRecord>) -> Self {
        let store = Self::new();
        for record in records {
            store.insert(record);
        }
        store
    }

    pub fn insert(&self, record: MetricRecord) {
        self.records
            .entry(record.campaign_id.clone())
            .or_default()
            .push(record);
    }

    /// Insights persisted so far for a campaign.
    pub fn insights_for(&self, campaign_id: &str) -> Vec<CampaignInsight> {
        self.insights
            .get(campaign_id)
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

impl Default for InMemoryMetricsStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MetricsStore for InMemoryMetricsStore {
    async fn fetch_metrics(
        &self,
        campaign_id: &str,
        period: &Period,
    ) -> anyhow::Result<Vec<MetricRecord>> {
        let mut records: Vec<MetricRecord> = self
            .records
            .get(campaign_id)
            .map(|r| {
                r.iter()
                    .filter(|m| period.contains(&m.timestamp))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        records.sort_by_key(|m| m.timestamp);

        debug!(campaign_id, count = records.len(), "Fetched metric records");
        Ok(records)
    }

    async fn persist_insight(&self, mut insight: CampaignInsight) -> anyhow::Result<CampaignInsight> {
        insight.id = Some(Uuid::new_v4());
        self.insights
            .entry(insight.campaign_id.clone())
            .or_default()
            .push(insight.clone());
        Ok(insight)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn record(campaign_id: &str, days_ago: i64) -> MetricRecord {
        MetricRecord {
            campaign_id: campaign_id.to_string(),
            timestamp: Utc::now() - Duration::days(days_ago),
            impressions: 100,
            clicks: 1,
            conversions: 0,
            spend: 1.0,
            revenue: 0.0,
        }
    }

    #[tokio::test]
    async fn test_fetch_filters_period_and_sorts() {
        let store = InMemoryMetricsStore::with_records([
            record("a", 1),
            record("a", 3),
            record("a", 30),
            record("b", 2),
        ]);

        let period = Period::trailing_days(7, Utc::now()).unwrap();
        let records = store.fetch_metrics("a", &period).await.unwrap();
        assert_eq!(records.len(), 2);
        assert!(records[0].timestamp < records[1].timestamp);
    }

    #[tokio::test]
    async fn test_unknown_campaign_is_empty() {
        let store = InMemoryMetricsStore::new();
        let period = Period::trailing_days(7, Utc::now()).unwrap();
        assert!(store.fetch_metrics("nope", &period).await.unwrap().is_empty());
    }
}
