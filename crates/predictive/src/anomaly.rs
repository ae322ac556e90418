//! Mean/deviation outlier detection over monitored metrics.

use crate::stats;
use campaign_core::config::AnomalyConfig;
use campaign_core::{Metric, MetricSeries};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Anomaly {
    pub metric: Metric,
    pub date: NaiveDate,
    pub value: f64,
    /// `[max(0, mean - k*sd), mean + k*sd]`
    pub expected_range: (f64, f64),
    /// `|value - mean|`
    pub deviation: f64,
    pub z_score: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AnomalySeverity {
    Low,
    Medium,
    High,
}

impl AnomalySeverity {
    pub fn from_count(count: usize) -> Self {
        match count {
            0 => AnomalySeverity::Low,
            1 | 2 => AnomalySeverity::Medium,
            _ => AnomalySeverity::High,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnomalyReport {
    pub campaign_id: Uuid,
    pub anomalies_detected: usize,
    pub anomalies: Vec<Anomaly>,
    pub severity: AnomalySeverity,
}

pub struct AnomalyDetector {
    config: AnomalyConfig,
}

impl AnomalyDetector {
    pub fn new(config: AnomalyConfig) -> Self {
        Self { config }
    }

    /// The most deviant sample of `metric`, if it lies more than
    /// `z_threshold` standard deviations from the series mean. A constant
    /// series never produces an anomaly.
    pub fn detect(&self, series: &MetricSeries, metric: Metric) -> Option<Anomaly> {
        let values = series.values(metric);
        let mean = stats::mean(&values);
        let sd = stats::std_dev(&values);
        if sd == 0.0 {
            return None;
        }

        let (index, deviation) = values
            .iter()
            .map(|v| (v - mean).abs())
            .enumerate()
            .fold(None, |best: Option<(usize, f64)>, (i, d)| match best {
                Some((_, best_d)) if best_d >= d => best,
                _ => Some((i, d)),
            })?;

        let k = self.config.z_threshold;
        if deviation <= k * sd {
            return None;
        }

        Some(Anomaly {
            metric,
            date: series.samples()[index].date,
            value: values[index],
            expected_range: ((mean - k * sd).max(0.0), mean + k * sd),
            deviation,
            z_score: deviation / sd,
        })
    }

    /// Run [`detect`](Self::detect) for every monitored metric.
    pub fn report(&self, series: &MetricSeries) -> AnomalyReport {
        let anomalies: Vec<Anomaly> = self
            .config
            .monitored_metrics
            .iter()
            .filter_map(|metric| self.detect(series, *metric))
            .collect();

        AnomalyReport {
            campaign_id: series.campaign_id,
            anomalies_detected: anomalies.len(),
            severity: AnomalySeverity::from_count(anomalies.len()),
            anomalies,
        }
    }
}

impl Default for AnomalyDetector {
    fn default() -> Self {
        Self::new(AnomalyConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use campaign_core::MetricSample;

    fn series(metric: Metric, values: &[f64]) -> MetricSeries {
        let start = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let samples = values
            .iter()
            .enumerate()
            .map(|(i, v)| {
                let mut s = MetricSample::zero(start + chrono::Duration::days(i as i64));
                s.set(metric, *v);
                s
            })
            .collect();
        MetricSeries::new(Uuid::nil(), samples)
    }

    // 1. Constant series -----------------------------------------------------

    #[test]
    fn test_constant_series_never_anomalous() {
        let detector = AnomalyDetector::default();
        for level in [0.0, 1.0, 1e9] {
            let s = series(Metric::Cpc, &[level; 14]);
            assert!(detector.detect(&s, Metric::Cpc).is_none());
        }
    }

    // 2. Spike detection -----------------------------------------------------

    #[test]
    fn test_spike_flagged_with_details() {
        let detector = AnomalyDetector::default();
        let s = series(
            Metric::Impressions,
            &[100.0, 102.0, 98.0, 101.0, 99.0, 100.0, 100.0, 400.0, 101.0, 99.0],
        );

        let anomaly = detector.detect(&s, Metric::Impressions).unwrap();
        assert_eq!(anomaly.value, 400.0);
        assert_eq!(anomaly.date, NaiveDate::from_ymd_opt(2024, 5, 8).unwrap());
        assert!(anomaly.z_score > 2.0);
        assert!(anomaly.expected_range.0 <= anomaly.expected_range.1);
        assert!(anomaly.value > anomaly.expected_range.1);
    }

    #[test]
    fn test_mild_variation_not_flagged() {
        let detector = AnomalyDetector::default();
        let s = series(Metric::Conversions, &[10.0, 12.0, 11.0, 9.0, 10.0, 12.0, 11.0]);
        assert!(detector.detect(&s, Metric::Conversions).is_none());
    }

    #[test]
    fn test_short_series_cannot_exceed_threshold() {
        // with population sd, two points sit exactly one sd from the mean
        let detector = AnomalyDetector::default();
        let s = series(Metric::Cpc, &[1.0, 50.0]);
        assert!(detector.detect(&s, Metric::Cpc).is_none());
    }

    // 3. Report --------------------------------------------------------------

    #[test]
    fn test_report_counts_and_severity() {
        let detector = AnomalyDetector::default();
        let mut s = series(
            Metric::Impressions,
            &[100.0, 100.0, 100.0, 100.0, 100.0, 100.0, 100.0, 900.0],
        );
        // spend is not monitored
        let mut samples = s.samples().to_vec();
        samples[3].spend = 1_000_000.0;
        s = MetricSeries::new(Uuid::nil(), samples);

        let report = detector.report(&s);
        assert_eq!(report.anomalies_detected, 1);
        assert_eq!(report.anomalies[0].metric, Metric::Impressions);
        assert_eq!(report.severity, AnomalySeverity::Medium);
    }

    #[test]
    fn test_severity_thresholds() {
        assert_eq!(AnomalySeverity::from_count(0), AnomalySeverity::Low);
        assert_eq!(AnomalySeverity::from_count(1), AnomalySeverity::Medium);
        assert_eq!(AnomalySeverity::from_count(2), AnomalySeverity::Medium);
        assert_eq!(AnomalySeverity::from_count(3), AnomalySeverity::High);
    }
}
