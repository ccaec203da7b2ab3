//! Command dispatcher: owns the insight engine and trend agent and
//! resolves each [`AgentCommand`] to exactly one operation.

use crate::command::AgentCommand;
use campaign_core::config::AppConfig;
use campaign_core::types::Period;
use campaign_core::{AgentResponse, CampaignError, CampaignResult};
use campaign_insights::types::{CampaignHealthScore, OptimizationRecommendation, PerformanceAnalysis};
use campaign_insights::{InsightEngine, MetricsStore};
use campaign_trends::{PlatformSignals, TrendAction, TrendAgent, TrendSource};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

pub struct Dispatcher {
    insights: Arc<InsightEngine>,
    trends: Arc<TrendAgent>,
}

impl Dispatcher {
    pub fn new(insights: Arc<InsightEngine>, trends: Arc<TrendAgent>) -> Self {
        Self { insights, trends }
    }

    /// Wire both agents from configuration and their collaborators.
    pub fn from_config(
        config: &AppConfig,
        store: Arc<dyn MetricsStore>,
        source: Arc<dyn TrendSource>,
    ) -> Self {
        Self::new(
            Arc::new(InsightEngine::new(store, &config.insights)),
            Arc::new(TrendAgent::new(source, &config.trends)),
        )
    }

    pub fn insights(&self) -> &InsightEngine {
        &self.insights
    }

    pub fn trends(&self) -> &TrendAgent {
        &self.trends
    }

    pub async fn start(&self) -> CampaignResult<()> {
        self.insights.initialize().await
    }

    pub async fn stop(&self) -> CampaignResult<()> {
        self.insights.shutdown().await
    }

    /// Decode a JSON command payload.
    pub fn parse(payload: &[u8]) -> CampaignResult<AgentCommand> {
        serde_json::from_slice(payload)
            .map_err(|e| CampaignError::validation(format!("invalid command: {}", e)))
    }

    /// Decode and run a JSON command; malformed payloads become a failure
    /// envelope like any other error.
    pub async fn dispatch_json(&self, payload: &[u8]) -> AgentResponse<Value> {
        match Self::parse(payload) {
            Ok(command) => self.dispatch(command).await,
            Err(e) => {
                warn!(error = %e, "Rejected malformed command");
                AgentResponse::failure(e.to_string())
            }
        }
    }

    pub async fn dispatch(&self, command: AgentCommand) -> AgentResponse<Value> {
        let task = command.task_name();
        let start = Instant::now();

        let response = match command {
            AgentCommand::AnalyzePerformance {
                campaign_id,
                period,
            } => to_value(self.analyze_campaign_performance(&campaign_id, period).await),
            AgentCommand::RecommendOptimization { campaign_id } => {
                to_value(self.recommend_optimization(&campaign_id).await)
            }
            AgentCommand::HealthScore { campaign_id } => {
                to_value(self.get_campaign_health_score(&campaign_id).await)
            }
            AgentCommand::ScanTrends { platform } => to_value(self.scan_trends(&platform).await),
            AgentCommand::RecommendTrendActions { signals } => {
                to_value(self.recommend_trend_actions(signals.as_deref()))
            }
        };

        metrics::counter!("agents.commands").increment(1);
        info!(
            task,
            success = response.success,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Command dispatched"
        );
        response
    }

    pub async fn analyze_campaign_performance(
        &self,
        campaign_id: &str,
        period: Option<Period>,
    ) -> AgentResponse<PerformanceAnalysis> {
        self.insights
            .analyze_campaign_performance(campaign_id, period)
            .await
            .into()
    }

    pub async fn recommend_optimization(
        &self,
        campaign_id: &str,
    ) -> AgentResponse<Vec<OptimizationRecommendation>> {
        self.insights.recommend_optimization(campaign_id).await.into()
    }

    pub async fn get_campaign_health_score(
        &self,
        campaign_id: &str,
    ) -> AgentResponse<CampaignHealthScore> {
        self.insights.get_campaign_health_score(campaign_id).await.into()
    }

    pub async fn scan_trends(&self, platform: &str) -> AgentResponse<PlatformSignals> {
        self.trends.scan_trends(platform).await.into()
    }

    pub fn recommend_trend_actions(
        &self,
        signals: Option<&[PlatformSignals]>,
    ) -> AgentResponse<Vec<TrendAction>> {
        self.trends.recommend_trend_actions(signals).into()
    }
}

fn to_value<T: Serialize>(response: AgentResponse<T>) -> AgentResponse<Value> {
    match response.data {
        Some(data) => match serde_json::to_value(data) {
            Ok(value) => AgentResponse::ok(value),
            Err(e) => AgentResponse::failure(CampaignError::from(e).to_string()),
        },
        None => AgentResponse::failure(response.error.unwrap_or_default()),
    }
}
