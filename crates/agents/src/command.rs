//! Agent commands, tagged by `task` on the wire.

use campaign_core::types::Period;
use campaign_trends::PlatformSignals;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "task", rename_all = "snake_case")]
pub enum AgentCommand {
    AnalyzePerformance {
        campaign_id: String,
        #[serde(default)]
        period: Option<Period>,
    },
    RecommendOptimization {
        campaign_id: String,
    },
    HealthScore {
        campaign_id: String,
    },
    ScanTrends {
        platform: String,
    },
    RecommendTrendActions {
        #[serde(default)]
        signals: Option<Vec<PlatformSignals>>,
    },
}

impl AgentCommand {
    pub fn task_name(&self) -> &'static str {
        match self {
            AgentCommand::AnalyzePerformance { .. } => "analyze_performance",
            AgentCommand::RecommendOptimization { .. } => "recommend_optimization",
            AgentCommand::HealthScore { .. } => "health_score",
            AgentCommand::ScanTrends { .. } => "scan_trends",
            AgentCommand::RecommendTrendActions { .. } => "recommend_trend_actions",
        }
    }
}
