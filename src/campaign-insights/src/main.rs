//! Campaign Insights — predictive analytics over campaign performance.
//!
//! Runs a single engine action against a seeded campaign store and prints
//! the `{success, data, error}` envelope to stdout.

use anyhow::Context;
use campaign_core::config::AppConfig;
use campaign_management::{ManagementStore, DEMO_USER};
use campaign_predictive::{ActionRequest, PredictiveEngine, SyntheticSeriesProvider};
use clap::Parser;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "campaign-insights")]
#[command(about = "Predictive analytics for marketing campaigns")]
#[command(version)]
struct Cli {
    /// Action to run (analyze_trends, predict_performance, calculate_health_score,
    /// recommend_budget, detect_anomalies, forecast_revenue)
    #[arg(long)]
    action: String,

    /// Action parameters as a JSON object
    #[arg(long, default_value = "{}")]
    params: String,

    /// Requesting user; campaign reads are scoped to this id
    #[arg(long, env = "CAMPAIGN_INSIGHTS__USER", default_value = DEMO_USER)]
    user: String,

    /// TOML configuration file
    #[arg(long, env = "CAMPAIGN_INSIGHTS__CONFIG")]
    config: Option<String>,

    /// JSON array of campaigns to load (overrides config)
    #[arg(long, env = "CAMPAIGN_INSIGHTS__STORE__SEED_FILE")]
    campaigns: Option<String>,

    /// Load the built-in demo portfolio
    #[arg(long, default_value_t = false)]
    demo: bool,

    /// Average revenue per conversion (overrides config)
    #[arg(long)]
    conversion_value: Option<f64>,

    /// Pretty-print the response
    #[arg(long, default_value_t = false)]
    pretty: bool,
}

fn main() -> anyhow::Result<()> {
    // Initialize tracing; stdout is reserved for the response envelope.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "campaign_insights=info,campaign_predictive=info".into()),
        )
        .with_writer(std::io::stderr)
        .json()
        .init();

    let cli = Cli::parse();

    // Load configuration
    let mut config = match AppConfig::load_from(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) if cli.config.is_some() => {
            return Err(e).context("failed to load configuration file");
        }
        Err(e) => {
            warn!(error = %e, "Failed to load config, using defaults");
            AppConfig::default()
        }
    };

    // Apply CLI overrides
    if let Some(path) = cli.campaigns {
        config.store.seed_file = Some(path);
    }
    if cli.demo {
        config.store.demo_data = true;
    }
    if let Some(value) = cli.conversion_value {
        config.predictive.revenue.average_conversion_value = value;
    }
    config
        .predictive
        .validate()
        .context("invalid configuration after command-line overrides")?;

    let store = if config.store.demo_data {
        ManagementStore::with_demo_data()
    } else {
        ManagementStore::new()
    };
    if let Some(path) = &config.store.seed_file {
        store
            .load_json_file(path)
            .with_context(|| format!("failed to seed campaigns from {}", path))?;
    }

    info!(
        campaigns = store.len(),
        user = %cli.user,
        action = %cli.action,
        "Configuration loaded"
    );

    let params: serde_json::Value =
        serde_json::from_str(&cli.params).context("--params must be a JSON object")?;

    let engine = PredictiveEngine::new(
        Arc::new(store),
        Arc::new(SyntheticSeriesProvider::new(config.predictive.series.clone())),
        config.predictive,
    );

    let response = engine.execute(&cli.user, &ActionRequest::new(cli.action, params));
    let rendered = if cli.pretty {
        serde_json::to_string_pretty(&response)?
    } else {
        serde_json::to_string(&response)?
    };
    println!("{}", rendered);

    Ok(())
}
