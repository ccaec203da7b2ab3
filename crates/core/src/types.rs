use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{CampaignError, CampaignResult};

/// One observation of a campaign at a point in time, as delivered by the
/// metrics-ingestion side. Never mutated by the scoring pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRecord {
    pub campaign_id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub impressions: u64,
    #[serde(default)]
    pub clicks: u64,
    #[serde(default)]
    pub conversions: u64,
    #[serde(default)]
    pub spend: f64,
    #[serde(default)]
    pub revenue: f64,
}

/// Performance ratios that can be evaluated against thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    Ctr,
    Cpc,
    Cpa,
    Roi,
    Roas,
}

impl MetricKind {
    /// Cost metrics get worse as they grow; rate and return metrics get
    /// worse as they shrink.
    pub fn higher_is_better(self) -> bool {
        !matches!(self, MetricKind::Cpa | MetricKind::Cpc)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MetricKind::Ctr => "ctr",
            MetricKind::Cpc => "cpc",
            MetricKind::Cpa => "cpa",
            MetricKind::Roi => "roi",
            MetricKind::Roas => "roas",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdLevel {
    pub warning: f64,
    pub critical: f64,
}

impl ThresholdLevel {
    pub const fn new(warning: f64, critical: f64) -> Self {
        Self { warning, critical }
    }
}

/// Warning/critical levels per metric. Metrics without an entry are never
/// reported as violated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PerformanceThresholds {
    levels: BTreeMap<MetricKind, ThresholdLevel>,
}

pub const DEFAULT_CTR_THRESHOLD: ThresholdLevel = ThresholdLevel::new(0.01, 0.005);
pub const DEFAULT_CPA_THRESHOLD: ThresholdLevel = ThresholdLevel::new(50.0, 100.0);
pub const DEFAULT_ROI_THRESHOLD: ThresholdLevel = ThresholdLevel::new(0.2, 0.0);
pub const DEFAULT_ROAS_THRESHOLD: ThresholdLevel = ThresholdLevel::new(2.0, 1.0);

impl PerformanceThresholds {
    pub fn empty() -> Self {
        Self {
            levels: BTreeMap::new(),
        }
    }

    pub fn with(mut self, metric: MetricKind, level: ThresholdLevel) -> Self {
        self.levels.insert(metric, level);
        self
    }

    /// Apply per-instance overrides on top of these levels.
    pub fn with_overrides(mut self, overrides: &BTreeMap<MetricKind, ThresholdLevel>) -> Self {
        for (metric, level) in overrides {
            self.levels.insert(*metric, *level);
        }
        self
    }

    pub fn get(&self, metric: MetricKind) -> Option<&ThresholdLevel> {
        self.levels.get(&metric)
    }

    /// Warning level for `metric`, falling back to the built-in default when
    /// the metric has no configured entry.
    pub fn warning_or_default(&self, metric: MetricKind) -> f64 {
        self.get(metric)
            .map(|l| l.warning)
            .unwrap_or_else(|| default_level(metric).warning)
    }
}

fn default_level(metric: MetricKind) -> ThresholdLevel {
    match metric {
        MetricKind::Ctr => DEFAULT_CTR_THRESHOLD,
        MetricKind::Cpa => DEFAULT_CPA_THRESHOLD,
        MetricKind::Roi => DEFAULT_ROI_THRESHOLD,
        MetricKind::Roas => DEFAULT_ROAS_THRESHOLD,
        // Not part of the default set; only used when a caller asks for it.
        MetricKind::Cpc => ThresholdLevel::new(2.0, 5.0),
    }
}

impl Default for PerformanceThresholds {
    fn default() -> Self {
        Self::empty()
            .with(MetricKind::Ctr, DEFAULT_CTR_THRESHOLD)
            .with(MetricKind::Cpa, DEFAULT_CPA_THRESHOLD)
            .with(MetricKind::Roi, DEFAULT_ROI_THRESHOLD)
            .with(MetricKind::Roas, DEFAULT_ROAS_THRESHOLD)
    }
}

/// Inclusive time window used when fetching metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Period {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// The `days` days leading up to `end`. Fails when the start would fall
    /// outside the representable date range.
    pub fn trailing_days(days: u32, end: DateTime<Utc>) -> CampaignResult<Self> {
        let start = end
            .checked_sub_signed(Duration::days(i64::from(days)))
            .ok_or_else(|| {
                CampaignError::validation(format!("period of {} days before {} is out of range", days, end))
            })?;
        Ok(Self { start, end })
    }

    pub fn contains(&self, ts: &DateTime<Utc>) -> bool {
        *ts >= self.start && *ts <= self.end
    }

    pub fn validate(&self) -> CampaignResult<()> {
        if self.start > self.end {
            return Err(CampaignError::validation(format!(
                "period start {} is after end {}",
                self.start, self.end
            )));
        }
        Ok(())
    }
}

/// A product/audience profile that discovered trends are matched against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductProfile {
    pub name: String,
    pub category: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub target_demographics: Vec<String>,
}
