use crate::types::{MetricKind, ProductProfile, ThresholdLevel};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Root application configuration. Loaded from an optional TOML file and
/// environment variables with the prefix `CAMPAIGN_INSIGHTS__`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub insights: InsightsConfig,
    #[serde(default)]
    pub trends: TrendsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InsightsConfig {
    /// Length of the analysis window when the caller gives no period.
    #[serde(default = "default_period_days")]
    pub default_period_days: u32,
    /// z-score above which a point is flagged as anomalous.
    #[serde(default = "default_anomaly_sensitivity")]
    pub anomaly_sensitivity: f64,
    /// z-score above which a flagged point is reported as high severity.
    #[serde(default = "default_high_severity_score")]
    pub high_severity_score: f64,
    #[serde(default = "default_fetch_timeout_ms")]
    pub fetch_timeout_ms: u64,
    /// Per-metric overrides merged over the built-in thresholds.
    #[serde(default)]
    pub thresholds: BTreeMap<MetricKind, ThresholdLevel>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrendsConfig {
    /// How many trends (by virality) are considered for content actions.
    #[serde(default = "default_top_trends")]
    pub top_trends: usize,
    #[serde(default)]
    pub profiles: Vec<ProductProfile>,
}

// Default functions
fn default_period_days() -> u32 {
    7
}
fn default_anomaly_sensitivity() -> f64 {
    2.0
}
fn default_high_severity_score() -> f64 {
    3.0
}
fn default_fetch_timeout_ms() -> u64 {
    5000
}
fn default_top_trends() -> usize {
    5
}

impl Default for InsightsConfig {
    fn default() -> Self {
        Self {
            default_period_days: default_period_days(),
            anomaly_sensitivity: default_anomaly_sensitivity(),
            high_severity_score: default_high_severity_score(),
            fetch_timeout_ms: default_fetch_timeout_ms(),
            thresholds: BTreeMap::new(),
        }
    }
}

impl Default for TrendsConfig {
    fn default() -> Self {
        Self {
            top_trends: default_top_trends(),
            profiles: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables only.
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration from an optional TOML file, then environment
    /// variables (which take precedence).
    pub fn load_from(path: Option<&Path>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(
                config::File::from(path)
                    .format(config::FileFormat::Toml)
                    .required(true),
            );
        }

        let builder = builder.add_source(
            config::Environment::with_prefix("CAMPAIGN_INSIGHTS")
                .separator("__")
                .try_parsing(true)
                .list_separator(","),
        );

        let config = builder.build()?;
        let config: AppConfig = config.try_deserialize()?;
        tracing::debug!(
            profiles = config.trends.profiles.len(),
            threshold_overrides = config.insights.thresholds.len(),
            "Configuration loaded"
        );
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_documented_values() {
        let config = AppConfig::default();
        assert_eq!(config.insights.default_period_days, 7);
        assert_eq!(config.insights.anomaly_sensitivity, 2.0);
        assert_eq!(config.insights.fetch_timeout_ms, 5000);
        assert_eq!(config.trends.top_trends, 5);
        assert!(config.trends.profiles.is_empty());
    }

    #[test]
    fn test_toml_file_overrides_defaults() {
        let dir = std::env::temp_dir().join(format!("campaign-insights-cfg-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("insights.toml");
        std::fs::write(
            &path,
            r#"
[insights]
anomaly_sensitivity = 2.5

[insights.thresholds.ctr]
warning = 0.02
critical = 0.01

[[trends.profiles]]
name = "Runner Pro"
category = "fitness"
keywords = ["running", "marathon"]
target_demographics = ["gen z"]
"#,
        )
        .unwrap();

        let config = AppConfig::load_from(Some(&path)).unwrap();
        assert_eq!(config.insights.anomaly_sensitivity, 2.5);
        assert_eq!(config.insights.default_period_days, 7);
        assert_eq!(
            config.insights.thresholds.get(&MetricKind::Ctr),
            Some(&ThresholdLevel::new(0.02, 0.01))
        );
        assert_eq!(config.trends.profiles.len(), 1);
        assert_eq!(config.trends.profiles[0].keywords, vec!["running", "marathon"]);

        std::fs::remove_dir_all(&dir).ok();
    }
}
