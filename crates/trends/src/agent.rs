//! Trend agent. Scans platforms through a [`TrendSource`], scores what it
//! finds against the configured product profiles, and turns the latest
//! signals into ranked actions.

use crate::actions;
use crate::alignment::product_alignment;
use crate::source::TrendSource;
use crate::types::{ActionPriority, EngagementSpike, PlatformSignals, ScoredTrend, TrendAction};
use campaign_core::config::TrendsConfig;
use campaign_core::types::ProductProfile;
use campaign_core::{CampaignError, CampaignResult};
use chrono::Utc;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Per-platform cap on the spike history.
pub const MAX_RECORDED_SPIKES: usize = 256;

pub struct TrendAgent {
    source: Arc<dyn TrendSource>,
    profiles: Vec<ProductProfile>,
    top_trends: usize,
    /// platform -> most recent scan
    signals: DashMap<String, PlatformSignals>,
    /// platform -> every spike recorded across scans
    spikes: DashMap<String, Vec<EngagementSpike>>,
}

impl TrendAgent {
    pub fn new(source: Arc<dyn TrendSource>, config: &TrendsConfig) -> Self {
        Self {
            source,
            profiles: config.profiles.clone(),
            top_trends: config.top_trends,
            signals: DashMap::new(),
            spikes: DashMap::new(),
        }
    }

    pub fn profiles(&self) -> &[ProductProfile] {
        &self.profiles
    }

    /// Fetch and score the current trends for `platform`. Spikes accumulate
    /// per platform across scans; the returned signals carry all of them.
    pub async fn scan_trends(&self, platform: &str) -> CampaignResult<PlatformSignals> {
        let platform = platform.trim().to_lowercase();
        if platform.is_empty() {
            return Err(CampaignError::validation("platform is required"));
        }

        metrics::counter!("trends.scans").increment(1);
        let snapshot = self.source.fetch_trends(&platform).await.map_err(|e| {
            error!(platform = %platform, error = %e, "Trend fetch failed");
            CampaignError::store(e)
        })?;

        let trends: Vec<ScoredTrend> = snapshot
            .trends
            .into_iter()
            .map(|trend| {
                let alignment = product_alignment(&trend, &self.profiles);
                let priority = ActionPriority::from_score(trend.virality_index * alignment);
                debug!(trend_id = %trend.id, alignment, ?priority, "Scored trend");
                ScoredTrend {
                    trend,
                    product_alignment: alignment,
                    priority,
                }
            })
            .collect();

        let engagement_spikes = {
            let mut recorded = self.spikes.entry(platform.clone()).or_default();
            record_spikes(&mut recorded, snapshot.engagement_spikes);
            recorded.clone()
        };

        let signals = PlatformSignals {
            platform: platform.clone(),
            trends,
            engagement_spikes,
            scanned_at: Utc::now(),
        };
        self.signals.insert(platform.clone(), signals.clone());

        info!(
            platform = %platform,
            trends = signals.trends.len(),
            spikes = signals.engagement_spikes.len(),
            "Trend scan complete"
        );
        Ok(signals)
    }

    /// Rank actions for the given signals, or for the latest scan of every
    /// platform when none are given.
    pub fn recommend_trend_actions(
        &self,
        signals: Option<&[PlatformSignals]>,
    ) -> CampaignResult<Vec<TrendAction>> {
        let cached: Vec<PlatformSignals>;
        let signals = match signals {
            Some(s) => {
                if s.iter().any(|p| p.platform.trim().is_empty()) {
                    return Err(CampaignError::validation("signals must name a platform"));
                }
                s
            }
            None => {
                let mut latest: Vec<PlatformSignals> =
                    self.signals.iter().map(|e| e.value().clone()).collect();
                latest.sort_by(|a, b| a.platform.cmp(&b.platform));
                cached = latest;
                cached.as_slice()
            }
        };

        let actions = actions::recommend(signals, self.top_trends, Utc::now());
        metrics::counter!("trends.actions").increment(actions.len() as u64);
        info!(
            platforms = signals.len(),
            actions = actions.len(),
            "Trend actions recommended"
        );
        Ok(actions)
    }
}

/// Merge newly seen spikes into the platform history. A spike already
/// recorded (same timestamp and trend) is not counted twice, and only the
/// most recent [`MAX_RECORDED_SPIKES`] are kept.
fn record_spikes(recorded: &mut Vec<EngagementSpike>, incoming: Vec<EngagementSpike>) {
    for spike in incoming {
        let seen = recorded
            .iter()
            .any(|r| r.timestamp == spike.timestamp && r.trend_id == spike.trend_id);
        if !seen {
            recorded.push(spike);
        }
    }
    recorded.sort_by_key(|s| s.timestamp);
    if recorded.len() > MAX_RECORDED_SPIKES {
        let excess = recorded.len() - MAX_RECORDED_SPIKES;
        recorded.drain(..excess);
    }
}
