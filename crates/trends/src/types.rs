use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A content trend detected on a social platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trend {
    pub id: String,
    pub platform: String,
    pub title: String,
    #[serde(default)]
    pub hashtags: Vec<String>,
    pub category: String,
    /// Normalized engagement, 0.0–1.0.
    pub engagement_score: f64,
    /// Normalized spread velocity, 0.0–1.0.
    pub virality_index: f64,
    pub detected_at: DateTime<Utc>,
}

impl Trend {
    /// Lowercased title and hashtags, the text keyword matching runs against.
    pub fn search_text(&self) -> String {
        let mut text = self.title.to_lowercase();
        for tag in &self.hashtags {
            text.push(' ');
            text.push_str(&tag.to_lowercase());
        }
        text
    }
}

/// A burst of engagement observed on a platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngagementSpike {
    pub platform: String,
    pub timestamp: DateTime<Utc>,
    /// Engagement relative to the platform baseline (1.0 = baseline).
    pub magnitude: f64,
    #[serde(default)]
    pub trend_id: Option<String>,
}

/// Raw output of a trend source for one platform.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrendSnapshot {
    #[serde(default)]
    pub trends: Vec<Trend>,
    #[serde(default)]
    pub engagement_spikes: Vec<EngagementSpike>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionPriority {
    Low,
    Medium,
    High,
    Urgent,
}

impl ActionPriority {
    /// Priority from `virality × alignment`.
    pub fn from_score(score: f64) -> Self {
        if score > 0.8 {
            Self::Urgent
        } else if score > 0.6 {
            Self::High
        } else if score > 0.4 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    pub fn weight(self) -> u8 {
        match self {
            Self::Urgent => 4,
            Self::High => 3,
            Self::Medium => 2,
            Self::Low => 1,
        }
    }
}

/// A trend annotated with how well it fits the configured products.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredTrend {
    #[serde(flatten)]
    pub trend: Trend,
    pub product_alignment: f64,
    pub priority: ActionPriority,
}

/// Everything learned about one platform in a scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformSignals {
    pub platform: String,
    pub trends: Vec<ScoredTrend>,
    /// All spikes recorded for the platform so far, oldest first.
    pub engagement_spikes: Vec<EngagementSpike>,
    pub scanned_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendActionType {
    CreateContent,
    LeverageHashtag,
    TimingOptimization,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendAction {
    pub action_type: TrendActionType,
    pub platform: String,
    pub trend_id: String,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub hashtags: Vec<String>,
    pub priority: ActionPriority,
    pub confidence: f64,
    pub created_at: DateTime<Utc>,
}
