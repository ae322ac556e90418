//! Short-horizon metric forecasts by moving average or linear regression.

use crate::stats;
use crate::trend::TrendDirection;
use campaign_core::config::ForecastConfig;
use campaign_core::Metric;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ForecastMethod {
    MovingAverage,
    LinearRegression,
}

impl ForecastMethod {
    /// Fixed metric-to-method mapping: erratic metrics use the moving
    /// average, funnel outcomes are extrapolated by regression.
    pub fn for_metric(metric: Metric) -> Self {
        match metric {
            Metric::Clicks | Metric::Conversions => ForecastMethod::LinearRegression,
            Metric::Impressions | Metric::Spend | Metric::Cpc | Metric::Ctr => {
                ForecastMethod::MovingAverage
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Prediction {
    pub metric: Metric,
    pub current_value: f64,
    pub predicted_value: f64,
    pub horizon_label: String,
    pub confidence: f64,
    pub method: ForecastMethod,
}

pub struct Forecaster {
    config: ForecastConfig,
}

impl Forecaster {
    pub fn new(config: ForecastConfig) -> Self {
        Self { config }
    }

    /// Mean of the trailing `moving_average_window` samples.
    /// Returns `(predicted, confidence)`.
    pub fn moving_average(&self, values: &[f64]) -> (f64, f64) {
        if values.is_empty() {
            return (0.0, 0.0);
        }
        let k = self.config.moving_average_window.max(1).min(values.len());
        let window = &values[values.len() - k..];
        (stats::mean(window).max(0.0), self.config.moving_average_confidence)
    }

    /// OLS line over the sample index, evaluated `horizon` steps past the
    /// last sample (`x = n + horizon - 1`). With fewer than two samples the
    /// last known value is returned with zero confidence.
    pub fn linear_regression(&self, values: &[f64], horizon: u32) -> (f64, f64) {
        match stats::linear_fit(values) {
            Some((slope, intercept)) => {
                let x = (values.len() + horizon.max(1) as usize - 1) as f64;
                ((slope * x + intercept).max(0.0), self.config.regression_confidence)
            }
            None => (values.last().copied().unwrap_or(0.0), 0.0),
        }
    }

    pub fn predict(
        &self,
        metric: Metric,
        values: &[f64],
        method: ForecastMethod,
        horizon: u32,
    ) -> Prediction {
        let (predicted_value, confidence) = match method {
            ForecastMethod::MovingAverage => self.moving_average(values),
            ForecastMethod::LinearRegression => self.linear_regression(values, horizon),
        };

        Prediction {
            metric,
            current_value: values.last().copied().unwrap_or(0.0),
            predicted_value,
            horizon_label: horizon_label(horizon),
            confidence,
            method,
        }
    }
}

impl Default for Forecaster {
    fn default() -> Self {
        Self::new(ForecastConfig::default())
    }
}

pub fn horizon_label(horizon: u32) -> String {
    match horizon.max(1) {
        1 => "1 day ahead".to_string(),
        h => format!("{} days ahead", h),
    }
}

/// Confidence-weighted plurality vote over the direction each prediction
/// implies (predicted vs current, classified with `stability_band_pct`).
///
/// A zero current value counts as an increase when the prediction is
/// positive. Ties between the leading directions resolve to `Stable`.
pub fn overall_trend(predictions: &[Prediction], stability_band_pct: f64) -> TrendDirection {
    let mut increasing = 0.0;
    let mut decreasing = 0.0;
    let mut stable = 0.0;

    for p in predictions {
        let change = if p.current_value == 0.0 {
            if p.predicted_value > 0.0 {
                100.0
            } else {
                0.0
            }
        } else {
            (p.predicted_value - p.current_value) / p.current_value * 100.0
        };

        match TrendDirection::classify(change, stability_band_pct) {
            TrendDirection::Increasing => increasing += p.confidence,
            TrendDirection::Decreasing => decreasing += p.confidence,
            TrendDirection::Stable => stable += p.confidence,
        }
    }

    if increasing > decreasing && increasing > stable {
        TrendDirection::Increasing
    } else if decreasing > increasing && decreasing > stable {
        TrendDirection::Decreasing
    } else {
        TrendDirection::Stable
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prediction(current: f64, predicted: f64, confidence: f64) -> Prediction {
        Prediction {
            metric: Metric::Clicks,
            current_value: current,
            predicted_value: predicted,
            horizon_label: horizon_label(1),
            confidence,
            method: ForecastMethod::LinearRegression,
        }
    }

    // 1. Moving average ------------------------------------------------------

    #[test]
    fn test_moving_average_uses_trailing_window() {
        let forecaster = Forecaster::default();
        let values: Vec<f64> = (1..=10).map(|v| v as f64).collect();
        let (predicted, confidence) = forecaster.moving_average(&values);

        // trailing 7: 4..=10 -> 7.0
        assert!((predicted - 7.0).abs() < 1e-12);
        assert!((confidence - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn test_moving_average_short_and_empty() {
        let forecaster = Forecaster::default();
        let (predicted, _) = forecaster.moving_average(&[2.0, 4.0]);
        assert!((predicted - 3.0).abs() < 1e-12);
        assert_eq!(forecaster.moving_average(&[]), (0.0, 0.0));
    }

    // 2. Linear regression ---------------------------------------------------

    #[test]
    fn test_regression_extrapolates_one_step() {
        let forecaster = Forecaster::default();
        let (predicted, confidence) = forecaster.linear_regression(&[10.0, 12.0, 14.0, 16.0], 1);
        assert!((predicted - 18.0).abs() < 1e-9);
        assert!((confidence - 0.65).abs() < f64::EPSILON);
    }

    #[test]
    fn test_regression_multi_day_horizon() {
        let forecaster = Forecaster::default();
        let (predicted, _) = forecaster.linear_regression(&[10.0, 12.0, 14.0, 16.0], 7);
        // x = 4 + 7 - 1 = 10 -> 10 + 2 * 10
        assert!((predicted - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_regression_undefined_for_single_sample() {
        let forecaster = Forecaster::default();
        assert_eq!(forecaster.linear_regression(&[9.0], 3), (9.0, 0.0));
        assert_eq!(forecaster.linear_regression(&[], 3), (0.0, 0.0));
    }

    #[test]
    fn test_regression_never_negative() {
        let forecaster = Forecaster::default();
        let (predicted, _) = forecaster.linear_regression(&[30.0, 20.0, 10.0], 5);
        assert_eq!(predicted, 0.0);
    }

    #[test]
    fn test_moving_average_more_confident_than_regression() {
        let cfg = ForecastConfig::default();
        assert!(cfg.moving_average_confidence >= cfg.regression_confidence);
    }

    // 3. Predictions ---------------------------------------------------------

    #[test]
    fn test_predict_fills_fields() {
        let forecaster = Forecaster::default();
        let p = forecaster.predict(
            Metric::Conversions,
            &[1.0, 2.0, 3.0],
            ForecastMethod::for_metric(Metric::Conversions),
            7,
        );
        assert_eq!(p.method, ForecastMethod::LinearRegression);
        assert_eq!(p.current_value, 3.0);
        assert!((p.predicted_value - 10.0).abs() < 1e-9);
        assert_eq!(p.horizon_label, "7 days ahead");
    }

    #[test]
    fn test_method_mapping() {
        assert_eq!(ForecastMethod::for_metric(Metric::Impressions), ForecastMethod::MovingAverage);
        assert_eq!(ForecastMethod::for_metric(Metric::Cpc), ForecastMethod::MovingAverage);
        assert_eq!(ForecastMethod::for_metric(Metric::Clicks), ForecastMethod::LinearRegression);
        assert_eq!(ForecastMethod::for_metric(Metric::Conversions), ForecastMethod::LinearRegression);
    }

    // 4. Overall trend vote --------------------------------------------------

    #[test]
    fn test_overall_trend_majority_by_confidence() {
        let predictions = vec![
            prediction(100.0, 120.0, 0.65),
            prediction(100.0, 130.0, 0.65),
            prediction(100.0, 80.0, 0.75),
        ];
        assert_eq!(overall_trend(&predictions, 5.0), TrendDirection::Increasing);
    }

    #[test]
    fn test_overall_trend_confidence_outweighs_count() {
        let predictions = vec![
            prediction(100.0, 120.0, 0.1),
            prediction(100.0, 125.0, 0.1),
            prediction(100.0, 50.0, 0.9),
        ];
        assert_eq!(overall_trend(&predictions, 5.0), TrendDirection::Decreasing);
    }

    #[test]
    fn test_overall_trend_tie_and_empty_are_stable() {
        let tie = vec![prediction(100.0, 120.0, 0.5), prediction(100.0, 80.0, 0.5)];
        assert_eq!(overall_trend(&tie, 5.0), TrendDirection::Stable);
        assert_eq!(overall_trend(&[], 5.0), TrendDirection::Stable);
    }

    #[test]
    fn test_overall_trend_zero_current() {
        let predictions = vec![prediction(0.0, 4.0, 0.65)];
        assert_eq!(overall_trend(&predictions, 5.0), TrendDirection::Increasing);
        let flat = vec![prediction(0.0, 0.0, 0.65)];
        assert_eq!(overall_trend(&flat, 5.0), TrendDirection::Stable);
    }
}
