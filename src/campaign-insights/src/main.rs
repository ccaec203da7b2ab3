//! Campaign Insights — campaign performance analysis and trend action
//! ranking from the command line.
//!
//! Metric records and trend snapshots are read from JSON files into the
//! in-memory collaborators; every result is printed as a
//! `{success, data | error}` envelope.

use anyhow::Context;
use campaign_agents::{AgentCommand, Dispatcher};
use campaign_core::config::AppConfig;
use campaign_core::types::{MetricRecord, Period};
use campaign_core::AgentResponse;
use campaign_insights::InMemoryMetricsStore;
use campaign_trends::source::StaticTrendSource;
use campaign_trends::types::TrendSnapshot;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "campaign-insights")]
#[command(about = "Campaign performance analysis and trend action ranking")]
#[command(version)]
struct Cli {
    /// TOML configuration file (environment variables still take precedence)
    #[arg(long, env = "CAMPAIGN_INSIGHTS_CONFIG")]
    config: Option<PathBuf>,

    /// JSON array of metric records
    #[arg(long, global = true)]
    metrics: Option<PathBuf>,

    /// JSON trend snapshot ({"trends": [...], "engagement_spikes": [...]})
    #[arg(long, global = true)]
    trends: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Summarize a campaign's metrics, flag anomalies and threshold violations
    Analyze {
        #[arg(long)]
        campaign: String,
        /// Window length in days (defaults to the configured period)
        #[arg(long)]
        days: Option<u32>,
        /// End of the window, RFC 3339 (defaults to now)
        #[arg(long)]
        end: Option<DateTime<Utc>>,
    },
    /// Rank optimization recommendations for a campaign
    Recommend {
        #[arg(long)]
        campaign: String,
    },
    /// Compute the 0-100 health score for a campaign
    Health {
        #[arg(long)]
        campaign: String,
    },
    /// Scan the given platforms and rank trend actions
    Trends {
        #[arg(long = "platform", required = true)]
        platforms: Vec<String>,
    },
    /// Run a raw JSON command, e.g. '{"task": "health_score", "campaign_id": "c1"}'
    Dispatch { payload: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Results go to stdout, logs to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "campaign_insights=info,campaign_trends=info,campaign_agents=info".into()),
        )
        .with_writer(std::io::stderr)
        .json()
        .init();

    let cli = Cli::parse();

    let config = AppConfig::load_from(cli.config.as_deref()).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to load config, using defaults");
        AppConfig::default()
    });

    let records: Vec<MetricRecord> = match &cli.metrics {
        Some(path) => read_json(path)?,
        None => Vec::new(),
    };
    let snapshot: TrendSnapshot = match &cli.trends {
        Some(path) => read_json(path)?,
        None => TrendSnapshot::default(),
    };

    info!(
        records = records.len(),
        trends = snapshot.trends.len(),
        profiles = config.trends.profiles.len(),
        "Inputs loaded"
    );

    let dispatcher = Dispatcher::from_config(
        &config,
        Arc::new(InMemoryMetricsStore::with_records(records)),
        Arc::new(StaticTrendSource::from_snapshot(snapshot)),
    );
    dispatcher.start().await?;

    let response = match cli.command {
        Command::Analyze {
            campaign,
            days,
            end,
        } => {
            let period = match (days, end) {
                (None, None) => Ok(None),
                (days, end) => Period::trailing_days(
                    days.unwrap_or(config.insights.default_period_days),
                    end.unwrap_or_else(Utc::now),
                )
                .map(Some),
            };
            match period {
                Ok(period) => {
                    dispatcher
                        .dispatch(AgentCommand::AnalyzePerformance {
                            campaign_id: campaign,
                            period,
                        })
                        .await
                }
                Err(e) => AgentResponse::failure(e.to_string()),
            }
        }
        Command::Recommend { campaign } => {
            dispatcher
                .dispatch(AgentCommand::RecommendOptimization {
                    campaign_id: campaign,
                })
                .await
        }
        Command::Health { campaign } => {
            dispatcher
                .dispatch(AgentCommand::HealthScore {
                    campaign_id: campaign,
                })
                .await
        }
        Command::Trends { platforms } => scan_and_rank(&dispatcher, &platforms).await,
        Command::Dispatch { payload } => dispatcher.dispatch_json(payload.as_bytes()).await,
    };

    dispatcher.stop().await?;

    println!("{}", serde_json::to_string_pretty(&response)?);
    if !response.success {
        std::process::exit(1);
    }
    Ok(())
}

/// Scan every platform, then rank actions over the fresh signals. The first
/// failed scan short-circuits.
async fn scan_and_rank(dispatcher: &Dispatcher, platforms: &[String]) -> AgentResponse<serde_json::Value> {
    for platform in platforms {
        let scan = dispatcher
            .dispatch(AgentCommand::ScanTrends {
                platform: platform.clone(),
            })
            .await;
        if !scan.success {
            return scan;
        }
    }
    dispatcher
        .dispatch(AgentCommand::RecommendTrendActions { signals: None })
        .await
}

fn read_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
}
