//! Metric series sources.
//!
//! The engine reads history through [`MetricSeriesProvider`] so production
//! deployments can plug in a real time-series store. [`SyntheticSeriesProvider`]
//! manufactures a series from a campaign's aggregate counters and exists as
//! the default for environments without stored history.

use campaign_core::config::SeriesConfig;
use campaign_core::{Campaign, CampaignResult, Metric, MetricSample, MetricSeries};
use chrono::{Duration, NaiveDate, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

/// Produces the daily metric history of a campaign.
///
/// Implementations return a date-ascending series ending on the anchor day
/// ("today") and covering at most `window_days` days.
pub trait MetricSeriesProvider: Send + Sync {
    fn get_series(&self, campaign: &Campaign, window_days: u32) -> CampaignResult<MetricSeries>;
}

fn window_dates(anchor: NaiveDate, window_days: u32) -> impl Iterator<Item = NaiveDate> {
    let n = window_days as i64;
    (0..n).filter_map(move |i| anchor.checked_sub_signed(Duration::days(n - 1 - i)))
}

/// Noise amplitude actually sampled. Clamped below 1; non-finite settings
/// disable noise.
fn noise_amplitude(jitter: f64) -> f64 {
    if jitter.is_finite() {
        jitter.abs().min(MAX_NOISE_AMPLITUDE)
    } else {
        0.0
    }
}

const MAX_NOISE_AMPLITUDE: f64 = 0.99;

// ---------------------------------------------------------------------------
// Synthetic
// ---------------------------------------------------------------------------

/// SYNTHETIC data source: derives a plausible history from current counters.
///
/// Count metrics (impressions, clicks, conversions, spend) are spread evenly
/// over the window; rate metrics (cpc, ctr) start from the current value.
/// Each day ramps linearly from `ramp_start` of that level up to the full
/// level on the last day, with seeded noise on every day except the last, so
/// the final sample equals the current state and repeated calls are
/// bit-identical. An all-zero campaign yields an all-zero series.
pub struct SyntheticSeriesProvider {
    config: SeriesConfig,
    anchor: Option<NaiveDate>,
}

impl SyntheticSeriesProvider {
    pub fn new(config: SeriesConfig) -> Self {
        Self {
            config,
            anchor: None,
        }
    }

    /// Pin "today" to a fixed date.
    pub fn with_anchor(mut self, anchor: NaiveDate) -> Self {
        self.anchor = Some(anchor);
        self
    }

    fn seed(campaign_id: Uuid, window_days: u32) -> u64 {
        let raw = campaign_id.as_u128();
        ((raw >> 64) as u64) ^ (raw as u64) ^ u64::from(window_days)
    }
}

impl Default for SyntheticSeriesProvider {
    fn default() -> Self {
        Self::new(SeriesConfig::default())
    }
}

impl MetricSeriesProvider for SyntheticSeriesProvider {
    fn get_series(&self, campaign: &Campaign, window_days: u32) -> CampaignResult<MetricSeries> {
        let anchor = self.anchor.unwrap_or_else(|| Utc::now().date_naive());
        let n = window_days as usize;
        let jitter = noise_amplitude(self.config.jitter);
        let ramp_start = self.config.ramp_start;
        let mut rng = StdRng::seed_from_u64(Self::seed(campaign.id, window_days));

        let samples: Vec<MetricSample> = window_dates(anchor, window_days)
            .enumerate()
            .map(|(i, date)| {
                let progress = if n > 1 { i as f64 / (n - 1) as f64 } else { 1.0 };
                let ramp = ramp_start + (1.0 - ramp_start) * progress;
                let is_last = i + 1 == n;

                let mut sample = MetricSample::zero(date);
                for metric in Metric::ALL {
                    let level = if metric.is_rate() {
                        campaign.metric(metric)
                    } else {
                        campaign.metric(metric) / n as f64
                    };
                    let noise = if is_last || jitter == 0.0 {
                        0.0
                    } else {
                        rng.gen_range(-jitter..=jitter)
                    };
                    sample.set(metric, (level * ramp * (1.0 + noise)).max(0.0));
                }
                sample
            })
            .collect();

        debug!(
            campaign_id = %campaign.id,
            window_days,
            samples = samples.len(),
            "Generated synthetic metric series"
        );
        Ok(MetricSeries::new(campaign.id, samples))
    }
}

// ---------------------------------------------------------------------------
// Static
// ---------------------------------------------------------------------------

/// Serves explicitly supplied per-campaign histories.
///
/// Returns the trailing `window_days` samples on record. Campaigns without
/// stored history get a flat zero series anchored at `anchor`.
pub struct StaticSeriesProvider {
    anchor: NaiveDate,
    series: HashMap<Uuid, Vec<MetricSample>>,
}

impl StaticSeriesProvider {
    pub fn new(anchor: NaiveDate) -> Self {
        Self {
            anchor,
            series: HashMap::new(),
        }
    }

    /// Register a recorded history; samples are kept in date order.
    pub fn with_samples(mut self, campaign_id: Uuid, mut samples: Vec<MetricSample>) -> Self {
        samples.sort_by_key(|s| s.date);
        self.series.insert(campaign_id, samples);
        self
    }

    /// Register one metric as a daily series ending on the anchor day;
    /// other metrics stay at zero unless set by earlier calls.
    pub fn with_metric(mut self, campaign_id: Uuid, metric: Metric, values: &[f64]) -> Self {
        let dates: Vec<NaiveDate> = window_dates(self.anchor, values.len() as u32).collect();
        let samples = self.series.entry(campaign_id).or_default();
        for (date, value) in dates.into_iter().zip(values) {
            match samples.iter_mut().find(|s| s.date == date) {
                Some(existing) => existing.set(metric, *value),
                None => {
                    let mut sample = MetricSample::zero(date);
                    sample.set(metric, *value);
                    samples.push(sample);
                }
            }
        }
        samples.sort_by_key(|s| s.date);
        self
    }
}

impl MetricSeriesProvider for StaticSeriesProvider {
    fn get_series(&self, campaign: &Campaign, window_days: u32) -> CampaignResult<MetricSeries> {
        let samples = match self.series.get(&campaign.id) {
            Some(stored) => {
                let skip = stored.len().saturating_sub(window_days as usize);
                stored[skip..].to_vec()
            }
            None => window_dates(self.anchor, window_days)
                .map(MetricSample::zero)
                .collect(),
        };
        Ok(MetricSeries::new(campaign.id, samples))
    }
}
