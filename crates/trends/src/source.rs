//! Trend enrichment port. Platform scrapers and API clients live behind
//! this trait; the scoring code never talks to a platform directly.

use crate::types::TrendSnapshot;
use async_trait::async_trait;
use dashmap::DashMap;

#[async_trait]
pub trait TrendSource: Send + Sync {
    /// Current trends and engagement spikes for `platform`.
    async fn fetch_trends(&self, platform: &str) -> anyhow::Result<TrendSnapshot>;
}

/// Serves preloaded snapshots, keyed by platform. Unknown platforms yield
/// an empty snapshot.
pub struct StaticTrendSource {
    snapshots: DashMap<String, TrendSnapshot>,
}

impl StaticTrendSource {
    pub fn new() -> Self {
        Self {
            snapshots: DashMap::new(),
        }
    }

    pub fn set_snapshot(&self, platform: &str, snapshot: TrendSnapshot) {
        self.snapshots.insert(platform.to_lowercase(), snapshot);
    }

    /// Group a flat snapshot by each trend's and spike's own platform.
    pub fn from_snapshot(snapshot: TrendSnapshot) -> Self {
        let source = Self::new();
        for trend in snapshot.trends {
            source
                .snapshots
                .entry(trend.platform.to_lowercase())
                .or_default()
                .trends
                .push(trend);
        }
        for spike in snapshot.engagement_spikes {
            source
                .snapshots
                .entry(spike.platform.to_lowercase())
                .or_default()
                .engagement_spikes
                .push(spike);
        }
        source
    }
}

impl Default for StaticTrendSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TrendSource for StaticTrendSource {
    async fn fetch_trends(&self, platform: &str) -> anyhow::Result<TrendSnapshot> {
        Ok(self
            .snapshots
            .get(&platform.to_lowercase())
            .map(|s| s.clone())
            .unwrap_or_default())
    }
}
