//! Action dispatch for the predictive analytics engine.
//!
//! A single entry point accepts `{action, params}` and always answers with a
//! `{success, data?, error?}` envelope. Every call fetches the campaign and
//! its series once, runs the matching analysis, and keeps no state.

use crate::anomaly::{AnomalyDetector, AnomalyReport};
use crate::budget::{BudgetRecommendation, BudgetRecommender, TargetMetric};
use crate::forecast::{overall_trend, ForecastMethod, Forecaster, Prediction};
use crate::health::{HealthScore, HealthScorer};
use crate::revenue::{RevenueForecast, RevenueForecaster};
use crate::series::MetricSeriesProvider;
use crate::trend::{TrendAnalyzer, TrendDirection, TrendResult};
use campaign_core::config::PredictiveConfig;
use campaign_core::{
    Campaign, CampaignError, CampaignResult, CampaignStatus, CampaignStore, Metric, MetricSeries,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

// ─── Envelope ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionRequest {
    pub action: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

impl ActionRequest {
    pub fn new(action: impl Into<String>, params: serde_json::Value) -> Self {
        Self {
            action: action.into(),
            params,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActionResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ActionResponse {
    pub fn ok(data: serde_json::Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(err: &CampaignError) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(err.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    AnalyzeTrends,
    PredictPerformance,
    CalculateHealthScore,
    RecommendBudget,
    DetectAnomalies,
    ForecastRevenue,
}

impl Action {
    pub const ALL: [Action; 6] = [
        Action::AnalyzeTrends,
        Action::PredictPerformance,
        Action::CalculateHealthScore,
        Action::RecommendBudget,
        Action::DetectAnomalies,
        Action::ForecastRevenue,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::AnalyzeTrends => "analyze_trends",
            Action::PredictPerformance => "predict_performance",
            Action::CalculateHealthScore => "calculate_health_score",
            Action::RecommendBudget => "recommend_budget",
            Action::DetectAnomalies => "detect_anomalies",
            Action::ForecastRevenue => "forecast_revenue",
        }
    }
}

impl FromStr for Action {
    type Err = CampaignError;

    fn from_str(s: &str) -> CampaignResult<Self> {
        Action::ALL
            .iter()
            .copied()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| CampaignError::Validation(format!("unknown action: {}", s)))
    }
}

// ─── Parameters ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendParams {
    pub campaign_id: Option<Uuid>,
    pub days: Option<u32>,
    /// Preset such as `"7d"`; overrides `days`.
    pub date_range: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictParams {
    pub campaign_id: Option<Uuid>,
    pub periods: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignParams {
    pub campaign_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetParams {
    pub campaign_id: Option<Uuid>,
    pub target_metric: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenueParams {
    pub days: Option<u32>,
}

pub const DEFAULT_PERIODS: u32 = 7;

fn parse_params<T: DeserializeOwned + Default>(params: &serde_json::Value) -> CampaignResult<T> {
    if params.is_null() {
        return Ok(T::default());
    }
    serde_json::from_value(params.clone())
        .map_err(|e| CampaignError::Validation(format!("invalid params: {}", e)))
}

fn require_campaign_id(id: Option<Uuid>) -> CampaignResult<Uuid> {
    id.ok_or_else(|| CampaignError::Validation("campaignId is required".to_string()))
}

fn preset_days(preset: &str) -> CampaignResult<u32> {
    match preset {
        "7d" => Ok(7),
        "14d" => Ok(14),
        "30d" => Ok(30),
        "90d" => Ok(90),
        other => Err(CampaignError::Validation(format!(
            "unknown dateRange '{}' (expected 7d, 14d, 30d or 90d)",
            other
        ))),
    }
}

// ─── Reports ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrendReport {
    pub campaign_id: Uuid,
    pub days: u32,
    pub sample_count: usize,
    pub trends: BTreeMap<Metric, TrendResult>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceForecast {
    pub campaign_id: Uuid,
    pub periods: u32,
    pub predictions: Vec<Prediction>,
    pub overall_trend: TrendDirection,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub campaign_id: Uuid,
    pub conversion_trend: TrendResult,
    #[serde(flatten)]
    pub score: HealthScore,
}

// ─── Engine ─────────────────────────────────────────────────────────────

/// Metrics forecast by `predict_performance`.
const PREDICTED_METRICS: [Metric; 4] = [
    Metric::Impressions,
    Metric::Clicks,
    Metric::Conversions,
    Metric::Cpc,
];

/// Stateless predictive analytics engine over a campaign store and a
/// metric series source.
pub struct PredictiveEngine {
    store: Arc<dyn CampaignStore>,
    series: Arc<dyn MetricSeriesProvider>,
    config: PredictiveConfig,
    trend: TrendAnalyzer,
    forecaster: Forecaster,
    anomaly: AnomalyDetector,
    health: HealthScorer,
    budget: BudgetRecommender,
}

impl PredictiveEngine {
    pub fn new(
        store: Arc<dyn CampaignStore>,
        series: Arc<dyn MetricSeriesProvider>,
        config: PredictiveConfig,
    ) -> Self {
        info!(
            default_window_days = config.series.default_window_days,
            z_threshold = config.anomaly.z_threshold,
            average_conversion_value = config.revenue.average_conversion_value,
            "Predictive engine initialized"
        );
        Self {
            trend: TrendAnalyzer::new(config.trend.clone()),
            forecaster: Forecaster::new(config.forecast.clone()),
            anomaly: AnomalyDetector::new(config.anomaly.clone()),
            health: HealthScorer::new(config.health.clone()),
            budget: BudgetRecommender::new(
                config.budget.clone(),
                config.revenue.average_conversion_value,
            ),
            store,
            series,
            config,
        }
    }

    /// Run one action on behalf of `user_id`. Never fails: errors are
    /// reported inside the envelope.
    pub fn execute(&self, user_id: &str, request: &ActionRequest) -> ActionResponse {
        let start = Instant::now();

        let action = match request.action.parse::<Action>() {
            Ok(action) => action,
            Err(e) => {
                metrics::counter!("predictive.actions.failed", "action" => "unknown", "kind" => e.kind())
                    .increment(1);
                warn!(action = %request.action, error = %e, "Rejected unknown action");
                return ActionResponse::failure(&e);
            }
        };

        let result = self.dispatch(user_id, action, &request.params);
        let latency_us = start.elapsed().as_micros() as u64;
        metrics::histogram!("predictive.action.latency_us", "action" => action.as_str())
            .record(latency_us as f64);

        match result {
            Ok(data) => {
                metrics::counter!("predictive.actions.executed", "action" => action.as_str())
                    .increment(1);
                info!(action = action.as_str(), user_id, latency_us, "Action completed");
                ActionResponse::ok(data)
            }
            Err(e) => {
                metrics::counter!("predictive.actions.failed", "action" => action.as_str(), "kind" => e.kind())
                    .increment(1);
                warn!(action = action.as_str(), user_id, kind = e.kind(), error = %e, "Action failed");
                ActionResponse::failure(&e)
            }
        }
    }

    fn dispatch(
        &self,
        user_id: &str,
        action: Action,
        params: &serde_json::Value,
    ) -> CampaignResult<serde_json::Value> {
        let data = match action {
            Action::AnalyzeTrends => {
                serde_json::to_value(self.analyze_trends(user_id, parse_params(params)?)?)?
            }
            Action::PredictPerformance => {
                serde_json::to_value(self.predict_performance(user_id, parse_params(params)?)?)?
            }
            Action::CalculateHealthScore => {
                serde_json::to_value(self.calculate_health_score(user_id, parse_params(params)?)?)?
            }
            Action::RecommendBudget => {
                serde_json::to_value(self.recommend_budget(user_id, parse_params(params)?)?)?
            }
            Action::DetectAnomalies => {
                serde_json::to_value(self.detect_anomalies(user_id, parse_params(params)?)?)?
            }
            Action::ForecastRevenue => {
                serde_json::to_value(self.forecast_revenue(user_id, parse_params(params)?)?)?
            }
        };
        Ok(data)
    }

    pub fn analyze_trends(&self, user_id: &str, params: TrendParams) -> CampaignResult<TrendReport> {
        let campaign_id = require_campaign_id(params.campaign_id)?;
        let days = match params.date_range.as_deref() {
            Some(preset) => preset_days(preset)?,
            None => params.days.unwrap_or(self.config.series.default_window_days),
        };
        let days = self.validate_days(days)?;
        let (_, series) = self.load(user_id, campaign_id, days)?;

        let trends = Metric::ALL
            .iter()
            .map(|metric| {
                let result = self.trend.analyze(&series.values(*metric));
                debug!(%campaign_id, metric = metric.as_str(), direction = ?result.direction, "Trend analyzed");
                (*metric, result)
            })
            .collect();

        Ok(TrendReport {
            campaign_id,
            days,
            sample_count: series.len(),
            trends,
        })
    }

    pub fn predict_performance(
        &self,
        user_id: &str,
        params: PredictParams,
    ) -> CampaignResult<PerformanceForecast> {
        let campaign_id = require_campaign_id(params.campaign_id)?;
        let periods = params.periods.unwrap_or(DEFAULT_PERIODS);
        if periods == 0 || periods > self.config.forecast.max_periods {
            return Err(CampaignError::Validation(format!(
                "periods must be between 1 and {}",
                self.config.forecast.max_periods
            )));
        }
        let (_, series) = self.load(user_id, campaign_id, self.config.series.default_window_days)?;

        let predictions: Vec<Prediction> = PREDICTED_METRICS
            .iter()
            .map(|metric| {
                self.forecaster.predict(
                    *metric,
                    &series.values(*metric),
                    ForecastMethod::for_metric(*metric),
                    periods,
                )
            })
            .collect();
        let overall_trend = overall_trend(&predictions, self.trend.stability_band_pct());

        Ok(PerformanceForecast {
            campaign_id,
            periods,
            predictions,
            overall_trend,
        })
    }

    pub fn calculate_health_score(
        &self,
        user_id: &str,
        params: CampaignParams,
    ) -> CampaignResult<HealthReport> {
        let campaign_id = require_campaign_id(params.campaign_id)?;
        let (campaign, series) =
            self.load(user_id, campaign_id, self.config.series.default_window_days)?;

        let conversion_trend = self.trend.analyze(&series.values(Metric::Conversions));
        let score = self.health.score(&campaign, &conversion_trend);

        Ok(HealthReport {
            campaign_id,
            conversion_trend,
            score,
        })
    }

    pub fn recommend_budget(
        &self,
        user_id: &str,
        params: BudgetParams,
    ) -> CampaignResult<BudgetRecommendation> {
        let campaign_id = require_campaign_id(params.campaign_id)?;
        let target = match params.target_metric.as_deref() {
            Some(raw) => raw.parse::<TargetMetric>()?,
            None => TargetMetric::default(),
        };
        let (campaign, series) =
            self.load(user_id, campaign_id, self.config.series.default_window_days)?;

        Ok(self.budget.recommend(&campaign, &series, target))
    }

    pub fn detect_anomalies(
        &self,
        user_id: &str,
        params: CampaignParams,
    ) -> CampaignResult<AnomalyReport> {
        let campaign_id = require_campaign_id(params.campaign_id)?;
        let (_, series) = self.load(user_id, campaign_id, self.config.series.default_window_days)?;

        Ok(self.anomaly.report(&series))
    }

    /// Forecast over all of the user's active and paused campaigns.
    pub fn forecast_revenue(
        &self,
        user_id: &str,
        params: RevenueParams,
    ) -> CampaignResult<RevenueForecast> {
        let days = self.validate_days(params.days.unwrap_or(self.config.series.default_window_days))?;
        let campaigns = self
            .store
            .list_campaigns(user_id, &[CampaignStatus::Active, CampaignStatus::Paused])?;

        let portfolio = campaigns
            .into_iter()
            .map(|campaign| {
                let series = self.series_for(&campaign, days)?;
                Ok((campaign, series))
            })
            .collect::<CampaignResult<Vec<_>>>()?;

        let forecaster =
            RevenueForecaster::new(&self.forecaster, self.config.revenue.average_conversion_value);
        Ok(forecaster.forecast(&portfolio, days))
    }

    // -- internal helpers ---------------------------------------------------

    fn validate_days(&self, days: u32) -> CampaignResult<u32> {
        let max = self.config.series.max_window_days;
        if days == 0 || days > max {
            return Err(CampaignError::Validation(format!(
                "days must be between 1 and {}",
                max
            )));
        }
        Ok(days)
    }

    fn load(
        &self,
        user_id: &str,
        campaign_id: Uuid,
        days: u32,
    ) -> CampaignResult<(Campaign, MetricSeries)> {
        let campaign = self.store.get_campaign(user_id, campaign_id)?;
        let series = self.series_for(&campaign, days)?;
        Ok((campaign, series))
    }

    fn series_for(&self, campaign: &Campaign, days: u32) -> CampaignResult<MetricSeries> {
        let series = self.series.get_series(campaign, days)?;
        if series.campaign_id != campaign.id {
            return Err(CampaignError::Computation(format!(
                "series for campaign {} returned for campaign {}",
                series.campaign_id, campaign.id
            )));
        }
        if series.len() > days as usize {
            return Err(CampaignError::Computation(format!(
                "series has {} samples for a {}-day window",
                series.len(),
                days
            )));
        }
        Ok(series)
    }
}
