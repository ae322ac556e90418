use crate::error::{CampaignError, CampaignResult};
use crate::types::Metric;
use serde::Deserialize;

/// Root application configuration. Loaded from an optional TOML file and
/// environment variables with the prefix `CAMPAIGN_INSIGHTS__`.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub predictive: PredictiveConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

/// Tunable business rules of the predictive engine. Defaults reproduce the
/// reference behavior exactly.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct PredictiveConfig {
    #[serde(default)]
    pub series: SeriesConfig,
    #[serde(default)]
    pub trend: TrendConfig,
    #[serde(default)]
    pub forecast: ForecastConfig,
    #[serde(default)]
    pub anomaly: AnomalyConfig,
    #[serde(default)]
    pub health: HealthConfig,
    #[serde(default)]
    pub budget: BudgetConfig,
    #[serde(default)]
    pub revenue: RevenueConfig,
}

/// Largest accepted `series.max_window_days`; keeps window arithmetic on
/// calendar dates far from chrono's representable range.
pub const WINDOW_DAYS_LIMIT: u32 = 3650;

// ─── Series Config ──────────────────────────────────────────────────────
#[derive(Debug, Clone, Deserialize)]
pub struct SeriesConfig {
    #[serde(default = "default_window_days")]
    pub default_window_days: u32,
    #[serde(default = "default_max_window_days")]
    pub max_window_days: u32,
    /// Fraction of the current value the synthetic series starts from.
    #[serde(default = "default_ramp_start")]
    pub ramp_start: f64,
    /// Relative amplitude of the synthetic day-to-day noise.
    #[serde(default = "default_jitter")]
    pub jitter: f64,
}

fn default_window_days() -> u32 {
    30
}

fn default_max_window_days() -> u32 {
    365
}

fn default_ramp_start() -> f64 {
    0.85
}

fn default_jitter() -> f64 {
    0.05
}

impl Default for SeriesConfig {
    fn default() -> Self {
        Self {
            default_window_days: default_window_days(),
            max_window_days: default_max_window_days(),
            ramp_start: default_ramp_start(),
            jitter: default_jitter(),
        }
    }
}

// ─── Trend Config ───────────────────────────────────────────────────────
#[derive(Debug, Clone, Deserialize)]
pub struct TrendConfig {
    /// |change| below this percentage is classified as stable.
    #[serde(default = "default_stability_band_pct")]
    pub stability_band_pct: f64,
    /// Change reported when the earlier half averages zero but the later does not.
    #[serde(default = "default_zero_baseline_change_pct")]
    pub zero_baseline_change_pct: f64,
    /// Sample count at which confidence saturates.
    #[serde(default = "default_full_confidence_samples")]
    pub full_confidence_samples: usize,
}

fn default_stability_band_pct() -> f64 {
    5.0
}

fn default_zero_baseline_change_pct() -> f64 {
    100.0
}

fn default_full_confidence_samples() -> usize {
    30
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            stability_band_pct: default_stability_band_pct(),
            zero_baseline_change_pct: default_zero_baseline_change_pct(),
            full_confidence_samples: default_full_confidence_samples(),
        }
    }
}

// ─── Forecast Config ────────────────────────────────────────────────────
#[derive(Debug, Clone, Deserialize)]
pub struct ForecastConfig {
    /// Trailing samples averaged by the moving-average method.
    #[serde(default = "default_moving_average_window")]
    pub moving_average_window: usize,
    #[serde(default = "default_moving_average_confidence")]
    pub moving_average_confidence: f64,
    #[serde(default = "default_regression_confidence")]
    pub regression_confidence: f64,
    #[serde(default = "default_max_periods")]
    pub max_periods: u32,
}

fn default_moving_average_window() -> usize {
    7
}

fn default_moving_average_confidence() -> f64 {
    0.75
}

fn default_regression_confidence() -> f64 {
    0.65
}

fn default_max_periods() -> u32 {
    90
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            moving_average_window: default_moving_average_window(),
            moving_average_confidence: default_moving_average_confidence(),
            regression_confidence: default_regression_confidence(),
            max_periods: default_max_periods(),
        }
    }
}

// ─── Anomaly Config ─────────────────────────────────────────────────────
#[derive(Debug, Clone, Deserialize)]
pub struct AnomalyConfig {
    #[serde(default = "default_z_threshold")]
    pub z_threshold: f64,
    #[serde(default = "default_monitored_metrics")]
    pub monitored_metrics: Vec<Metric>,
}

fn default_z_threshold() -> f64 {
    2.0
}

fn default_monitored_metrics() -> Vec<Metric> {
    vec![Metric::Impressions, Metric::Cpc, Metric::Conversions]
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self {
            z_threshold: default_z_threshold(),
            monitored_metrics: default_monitored_metrics(),
        }
    }
}

// ─── Health Config ──────────────────────────────────────────────────────
#[derive(Debug, Clone, Deserialize)]
pub struct HealthConfig {
    #[serde(default = "default_baseline")]
    pub baseline: f64,
    #[serde(default = "default_performance_weight")]
    pub performance_weight: f64,
    #[serde(default = "default_efficiency_weight")]
    pub efficiency_weight: f64,
    #[serde(default = "default_growth_weight")]
    pub growth_weight: f64,
    /// Industry average CPC the efficiency score compares against.
    #[serde(default = "default_cpc_benchmark")]
    pub cpc_benchmark: f64,
    /// Upper bound on the growth bonus from an increasing conversion trend.
    #[serde(default = "default_growth_cap_pct")]
    pub growth_cap_pct: f64,
    #[serde(default = "default_healthy_threshold")]
    pub healthy_threshold: u32,
    #[serde(default = "default_warning_threshold")]
    pub warning_threshold: u32,
}

fn default_baseline() -> f64 {
    50.0
}

fn default_performance_weight() -> f64 {
    0.40
}

fn default_efficiency_weight() -> f64 {
    0.35
}

fn default_growth_weight() -> f64 {
    0.25
}

fn default_cpc_benchmark() -> f64 {
    3.5
}

fn default_growth_cap_pct() -> f64 {
    25.0
}

fn default_healthy_threshold() -> u32 {
    60
}

fn default_warning_threshold() -> u32 {
    40
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            baseline: default_baseline(),
            performance_weight: default_performance_weight(),
            efficiency_weight: default_efficiency_weight(),
            growth_weight: default_growth_weight(),
            cpc_benchmark: default_cpc_benchmark(),
            growth_cap_pct: default_growth_cap_pct(),
            healthy_threshold: default_healthy_threshold(),
            warning_threshold: default_warning_threshold(),
        }
    }
}

// ─── Budget Config ──────────────────────────────────────────────────────
#[derive(Debug, Clone, Deserialize)]
pub struct BudgetConfig {
    #[serde(default = "default_high_efficiency")]
    pub high_efficiency: f64,
    #[serde(default = "default_good_efficiency")]
    pub good_efficiency: f64,
    #[serde(default = "default_low_efficiency")]
    pub low_efficiency: f64,
    #[serde(default = "default_high_efficiency_adjustment_pct")]
    pub high_efficiency_adjustment_pct: f64,
    #[serde(default = "default_good_efficiency_adjustment_pct")]
    pub good_efficiency_adjustment_pct: f64,
    #[serde(default = "default_low_efficiency_adjustment_pct")]
    pub low_efficiency_adjustment_pct: f64,
    #[serde(default = "default_underutilization_threshold_pct")]
    pub underutilization_threshold_pct: f64,
    #[serde(default = "default_underutilization_adjustment_pct")]
    pub underutilization_adjustment_pct: f64,
}

fn default_high_efficiency() -> f64 {
    0.5
}

fn default_good_efficiency() -> f64 {
    0.2
}

fn default_low_efficiency() -> f64 {
    0.1
}

fn default_high_efficiency_adjustment_pct() -> f64 {
    30.0
}

fn default_good_efficiency_adjustment_pct() -> f64 {
    15.0
}

fn default_low_efficiency_adjustment_pct() -> f64 {
    -20.0
}

fn default_underutilization_threshold_pct() -> f64 {
    70.0
}

fn default_underutilization_adjustment_pct() -> f64 {
    -10.0
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            high_efficiency: default_high_efficiency(),
            good_efficiency: default_good_efficiency(),
            low_efficiency: default_low_efficiency(),
            high_efficiency_adjustment_pct: default_high_efficiency_adjustment_pct(),
            good_efficiency_adjustment_pct: default_good_efficiency_adjustment_pct(),
            low_efficiency_adjustment_pct: default_low_efficiency_adjustment_pct(),
            underutilization_threshold_pct: default_underutilization_threshold_pct(),
            underutilization_adjustment_pct: default_underutilization_adjustment_pct(),
        }
    }
}

// ─── Revenue Config ─────────────────────────────────────────────────────
#[derive(Debug, Clone, Deserialize)]
pub struct RevenueConfig {
    /// Assumed revenue per conversion. Not derived from order data.
    #[serde(default = "default_average_conversion_value")]
    pub average_conversion_value: f64,
}

fn default_average_conversion_value() -> f64 {
    50.0
}

impl Default for RevenueConfig {
    fn default() -> Self {
        Self {
            average_conversion_value: default_average_conversion_value(),
        }
    }
}

// ─── Store Config ───────────────────────────────────────────────────────
#[derive(Debug, Clone, Deserialize, Default)]
pub struct StoreConfig {
    /// JSON array of campaigns loaded into the in-memory store at startup.
    #[serde(default)]
    pub seed_file: Option<String>,
    #[serde(default)]
    pub demo_data: bool,
}

impl AppConfig {
    /// Load configuration from an optional TOML file, then environment
    /// variables, which take precedence. The result is validated.
    pub fn load_from(path: Option<&str>) -> CampaignResult<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(
                config::File::with_name(path).format(config::FileFormat::Toml),
            );
        }
        builder = builder.add_source(
            config::Environment::with_prefix("CAMPAIGN_INSIGHTS")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("predictive.anomaly.monitored_metrics"),
        );

        Self::from_config(builder.build()?)
    }

    fn from_config(config: config::Config) -> CampaignResult<Self> {
        let app: Self = config.try_deserialize()?;
        app.predictive.validate()?;
        Ok(app)
    }
}

impl PredictiveConfig {
    /// Reject settings the engine cannot compute with.
    pub fn validate(&self) -> CampaignResult<()> {
        let series = &self.series;
        ensure(
            (1..=WINDOW_DAYS_LIMIT).contains(&series.max_window_days),
            "series.max_window_days",
            &format!("between 1 and {}", WINDOW_DAYS_LIMIT),
        )?;
        ensure(
            (1..=series.max_window_days).contains(&series.default_window_days),
            "series.default_window_days",
            "between 1 and series.max_window_days",
        )?;
        ensure((0.0..=1.0).contains(&series.ramp_start), "series.ramp_start", "in [0, 1]")?;
        ensure((0.0..1.0).contains(&series.jitter), "series.jitter", "in [0, 1)")?;

        let trend = &self.trend;
        ensure(non_negative(trend.stability_band_pct), "trend.stability_band_pct", "finite and >= 0")?;
        ensure(trend.zero_baseline_change_pct.is_finite(), "trend.zero_baseline_change_pct", "finite")?;
        ensure(trend.full_confidence_samples > 0, "trend.full_confidence_samples", "at least 1")?;

        let forecast = &self.forecast;
        ensure(forecast.moving_average_window > 0, "forecast.moving_average_window", "at least 1")?;
        ensure(
            (0.0..=1.0).contains(&forecast.moving_average_confidence),
            "forecast.moving_average_confidence",
            "in [0, 1]",
        )?;
        ensure(
            (0.0..=1.0).contains(&forecast.regression_confidence),
            "forecast.regression_confidence",
            "in [0, 1]",
        )?;
        ensure(forecast.max_periods > 0, "forecast.max_periods", "at least 1")?;

        let z = self.anomaly.z_threshold;
        ensure(z.is_finite() && z > 0.0, "anomaly.z_threshold", "finite and > 0")?;

        let health = &self.health;
        for (key, weight) in [
            ("health.performance_weight", health.performance_weight),
            ("health.efficiency_weight", health.efficiency_weight),
            ("health.growth_weight", health.growth_weight),
            ("health.growth_cap_pct", health.growth_cap_pct),
        ] {
            ensure(non_negative(weight), key, "finite and >= 0")?;
        }
        ensure(health.baseline.is_finite(), "health.baseline", "finite")?;
        ensure(
            health.cpc_benchmark.is_finite() && health.cpc_benchmark > 0.0,
            "health.cpc_benchmark",
            "finite and > 0",
        )?;
        ensure(
            health.warning_threshold <= health.healthy_threshold && health.healthy_threshold <= 100,
            "health.warning_threshold",
            "<= health.healthy_threshold <= 100",
        )?;

        let budget = &self.budget;
        for (key, value) in [
            ("budget.high_efficiency", budget.high_efficiency),
            ("budget.good_efficiency", budget.good_efficiency),
            ("budget.low_efficiency", budget.low_efficiency),
            ("budget.high_efficiency_adjustment_pct", budget.high_efficiency_adjustment_pct),
            ("budget.good_efficiency_adjustment_pct", budget.good_efficiency_adjustment_pct),
            ("budget.low_efficiency_adjustment_pct", budget.low_efficiency_adjustment_pct),
            ("budget.underutilization_threshold_pct", budget.underutilization_threshold_pct),
            ("budget.underutilization_adjustment_pct", budget.underutilization_adjustment_pct),
        ] {
            ensure(value.is_finite(), key, "finite")?;
        }

        ensure(
            non_negative(self.revenue.average_conversion_value),
            "revenue.average_conversion_value",
            "finite and >= 0",
        )
    }
}

fn non_negative(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}

fn ensure(valid: bool, key: &str, rule: &str) -> CampaignResult<()> {
    if valid {
        Ok(())
    } else {
        Err(CampaignError::Config(format!("predictive.{} must be {}", key, rule)))
    }
}
