//! Campaign performance analysis: derived metrics, threshold checks,
//! anomaly detection, trend classification, health scoring, and the
//! insight engine that ties them together over a fetched metric window.

pub mod anomaly;
pub mod calculator;
pub mod engine;
pub mod health;
pub mod recommendations;
pub mod store;
pub mod thresholds;
pub mod trend;
pub mod types;

pub use anomaly::AnomalyDetector;
pub use calculator::DerivedMetrics;
pub use engine::InsightEngine;
pub use health::HealthScorer;
pub use store::{InMemoryMetricsStore, MetricsStore};
pub use thresholds::{ThresholdCheck, ThresholdEvaluator};
pub use trend::TrendDirection;
