//! Ranked actions for exploiting detected trends.

use crate::types::{
    ActionPriority, EngagementSpike, PlatformSignals, ScoredTrend, TrendAction, TrendActionType,
};
use chrono::{DateTime, Timelike, Utc};
use std::collections::{BTreeMap, HashSet};

const CREATE_CONTENT_MIN_VIRALITY: f64 = 0.7;
const MAX_CONTENT_CONFIDENCE: f64 = 0.95;
const HASHTAG_MIN_ALIGNMENT: f64 = 0.5;
/// Spikes a platform must exceed before timing advice is given.
const TIMING_MIN_SPIKES: usize = 2;

/// Build actions for the `top_n` most viral trends across `signals`, plus
/// one timing action per platform with enough recorded spikes. Sorted by
/// priority then confidence, both descending.
pub fn recommend(signals: &[PlatformSignals], top_n: usize, now: DateTime<Utc>) -> Vec<TrendAction> {
    let mut ranked: Vec<&ScoredTrend> = signals.iter().flat_map(|s| s.trends.iter()).collect();
    ranked.sort_by(|a, b| b.trend.virality_index.total_cmp(&a.trend.virality_index));
    ranked.truncate(top_n);

    let mut actions = Vec::new();

    for scored in &ranked {
        let trend = &scored.trend;
        let alignment = scored.product_alignment;

        if trend.virality_index > CREATE_CONTENT_MIN_VIRALITY {
            let score = trend.virality_index * alignment;
            actions.push(TrendAction {
                action_type: TrendActionType::CreateContent,
                platform: trend.platform.clone(),
                trend_id: trend.id.clone(),
                title: format!("Create content for \"{}\"", trend.title),
                description: format!(
                    "Trend is spreading fast (virality {:.2}) and aligns {:.0}% with your products.",
                    trend.virality_index,
                    alignment * 100.0
                ),
                hashtags: trend.hashtags.clone(),
                priority: ActionPriority::from_score(score),
                confidence: score.min(MAX_CONTENT_CONFIDENCE),
                created_at: now,
            });
        }

        if !trend.hashtags.is_empty() && alignment > HASHTAG_MIN_ALIGNMENT {
            actions.push(TrendAction {
                action_type: TrendActionType::LeverageHashtag,
                platform: trend.platform.clone(),
                trend_id: trend.id.clone(),
                title: format!("Use trending hashtags from \"{}\"", trend.title),
                description: format!("Add {} to upcoming posts.", trend.hashtags.join(" ")),
                hashtags: trend.hashtags.clone(),
                priority: ActionPriority::Medium,
                confidence: alignment,
                created_at: now,
            });
        }
    }

    if let Some(top) = ranked.first() {
        let mut seen = HashSet::new();
        for platform_signals in signals {
            let spikes = &platform_signals.engagement_spikes;
            if spikes.len() <= TIMING_MIN_SPIKES || !seen.insert(platform_signals.platform.as_str()) {
                continue;
            }
            let description = match peak_hour(spikes) {
                Some(hour) => format!(
                    "{} engagement spikes recorded; engagement peaks around {:02}:00 UTC. Schedule posts on \"{}\" ahead of the peak.",
                    spikes.len(),
                    hour,
                    top.trend.title
                ),
                None => format!("{} engagement spikes recorded.", spikes.len()),
            };
            actions.push(TrendAction {
                action_type: TrendActionType::TimingOptimization,
                platform: platform_signals.platform.clone(),
                trend_id: top.trend.id.clone(),
                title: format!("Optimize posting time on {}", platform_signals.platform),
                description,
                hashtags: Vec::new(),
                priority: ActionPriority::Medium,
                confidence: (0.5 + 0.1 * spikes.len() as f64).min(0.9),
                created_at: now,
            });
        }
    }

    actions.sort_by(|a, b| {
        b.priority
            .weight()
            .cmp(&a.priority.weight())
            .then_with(|| b.confidence.total_cmp(&a.confidence))
    });
    actions
}

/// Hour of day (UTC) with the most spikes; earliest hour wins ties.
fn peak_hour(spikes: &[EngagementSpike]) -> Option<u32> {
    let mut counts: BTreeMap<u32, usize> = BTreeMap::new();
    for spike in spikes {
        *counts.entry(spike.timestamp.hour()).or_default() += 1;
    }
    let max = counts.values().copied().max()?;
    counts.into_iter().find(|(_, c)| *c == max).map(|(h, _)| h)
}
