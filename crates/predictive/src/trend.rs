//! Half-over-half trend classification of a metric series.

use crate::stats;
use campaign_core::config::TrendConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Increasing,
    Decreasing,
    Stable,
}

impl TrendDirection {
    /// Classify a percentage change against a symmetric stability band.
    pub fn classify(change_pct: f64, stability_band_pct: f64) -> Self {
        if change_pct.abs() < stability_band_pct {
            TrendDirection::Stable
        } else if change_pct > 0.0 {
            TrendDirection::Increasing
        } else {
            TrendDirection::Decreasing
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrendResult {
    pub direction: TrendDirection,
    pub change_percentage: f64,
    /// Heuristic in `[0, 1]`, not a statistical significance.
    pub confidence: f64,
    pub sample_count: usize,
}

impl TrendResult {
    pub fn flat(sample_count: usize) -> Self {
        Self {
            direction: TrendDirection::Stable,
            change_percentage: 0.0,
            confidence: 0.0,
            sample_count,
        }
    }
}

pub struct TrendAnalyzer {
    config: TrendConfig,
}

impl TrendAnalyzer {
    pub fn new(config: TrendConfig) -> Self {
        Self { config }
    }

    pub fn stability_band_pct(&self) -> f64 {
        self.config.stability_band_pct
    }

    /// Compare the mean of the later half of `values` with the earlier half.
    ///
    /// The earlier half holds the first `n / 2` samples; an odd extra sample
    /// belongs to the later half.
    pub fn analyze(&self, values: &[f64]) -> TrendResult {
        let n = values.len();
        if n < 2 {
            return TrendResult::flat(n);
        }

        let (earlier, later) = values.split_at(n / 2);
        let earlier_mean = stats::mean(earlier);
        let later_mean = stats::mean(later);

        let change_percentage = self.percent_change(earlier_mean, later_mean);

        TrendResult {
            direction: TrendDirection::classify(change_percentage, self.config.stability_band_pct),
            change_percentage,
            confidence: self.confidence(values),
            sample_count: n,
        }
    }

    /// Percent change from `from` to `to`; a zero baseline reports either no
    /// change or the configured fixed increase.
    pub fn percent_change(&self, from: f64, to: f64) -> f64 {
        if from == 0.0 {
            if to == 0.0 {
                0.0
            } else {
                self.config.zero_baseline_change_pct
            }
        } else {
            (to - from) / from * 100.0
        }
    }

    // Grows with sample count, shrinks with the coefficient of variation.
    fn confidence(&self, values: &[f64]) -> f64 {
        let full = self.config.full_confidence_samples.max(1) as f64;
        let coverage = (values.len() as f64 / full).min(1.0);

        let mean = stats::mean(values);
        let cv = if mean == 0.0 {
            0.0
        } else {
            stats::std_dev(values) / mean.abs()
        };

        (coverage / (1.0 + cv)).clamp(0.0, 1.0)
    }
}

impl Default for TrendAnalyzer {
    fn default() -> Self {
        Self::new(TrendConfig::default())
    }
}
