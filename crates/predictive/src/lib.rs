//! Predictive campaign analytics — trend classification, short-horizon
//! forecasts, anomaly flags, health scoring, budget recommendations and
//! portfolio revenue forecasts over daily metric series.

pub mod anomaly;
pub mod budget;
pub mod engine;
pub mod forecast;
pub mod health;
pub mod revenue;
pub mod series;
mod stats;
pub mod trend;

pub use anomaly::{Anomaly, AnomalyDetector, AnomalyReport, AnomalySeverity};
pub use budget::{BudgetRecommendation, BudgetRecommender, TargetMetric};
pub use engine::{Action, ActionRequest, ActionResponse, PredictiveEngine};
pub use forecast::{overall_trend, ForecastMethod, Forecaster, Prediction};
pub use health::{HealthScore, HealthScorer, HealthStatus};
pub use revenue::{RevenueForecast, RevenueForecaster};
pub use series::{MetricSeriesProvider, StaticSeriesProvider, SyntheticSeriesProvider};
pub use trend::{TrendAnalyzer, TrendDirection, TrendResult};
