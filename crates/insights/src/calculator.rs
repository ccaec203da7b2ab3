//! Derived performance ratios for a single metric record.

use campaign_core::types::MetricRecord;
use serde::{Deserialize, Serialize};

/// Ratios computed from one record's raw counters. Every zero denominator
/// resolves to `0.0`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DerivedMetrics {
    pub ctr: f64,
    pub cpc: f64,
    pub cpa: f64,
    pub roi: f64,
    pub roas: f64,
}

impl DerivedMetrics {
    pub fn from_record(record: &MetricRecord) -> Self {
        let impressions = record.impressions as f64;
        let clicks = record.clicks as f64;
        let conversions = record.conversions as f64;
        let spend = record.spend;
        let revenue = record.revenue;

        Self {
            ctr: if record.impressions > 0 {
                clicks / impressions
            } else {
                0.0
            },
            cpc: if record.clicks > 0 { spend / clicks } else { 0.0 },
            cpa: if record.conversions > 0 {
                spend / conversions
            } else {
                0.0
            },
            roi: if spend > 0.0 {
                (revenue - spend) / spend
            } else {
                0.0
            },
            roas: if spend > 0.0 { revenue / spend } else { 0.0 },
        }
    }
}
