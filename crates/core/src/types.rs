use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A marketing campaign with its current aggregate counters.
///
/// Owned by the campaign store; the predictive engine only reads it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Campaign {
    pub id: Uuid,
    /// Owning user. Every store read is scoped by this field.
    pub user_id: String,
    pub name: String,
    pub status: CampaignStatus,
    #[serde(default)]
    pub impressions: u64,
    #[serde(default)]
    pub clicks: u64,
    #[serde(default)]
    pub conversions: u64,
    #[serde(default)]
    pub spend: f64,
    #[serde(default)]
    pub cpc: f64,
    /// Click-through rate in percent (2.5 means 2.5%).
    #[serde(default)]
    pub ctr: f64,
    #[serde(default)]
    pub budget_total: f64,
    #[serde(default)]
    pub budget_spent: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CampaignStatus {
    Draft,
    Active,
    Paused,
    Completed,
    Archived,
}

/// The six core metrics tracked per day.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Impressions,
    Clicks,
    Conversions,
    Spend,
    Cpc,
    Ctr,
}

impl Metric {
    pub const ALL: [Metric; 6] = [
        Metric::Impressions,
        Metric::Clicks,
        Metric::Conversions,
        Metric::Spend,
        Metric::Cpc,
        Metric::Ctr,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Impressions => "impressions",
            Metric::Clicks => "clicks",
            Metric::Conversions => "conversions",
            Metric::Spend => "spend",
            Metric::Cpc => "cpc",
            Metric::Ctr => "ctr",
        }
    }

    /// Rate metrics describe a ratio, count metrics accumulate per day.
    pub fn is_rate(&self) -> bool {
        matches!(self, Metric::Cpc | Metric::Ctr)
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Campaign {
    /// Current aggregate value for a metric.
    pub fn metric(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Impressions => self.impressions as f64,
            Metric::Clicks => self.clicks as f64,
            Metric::Conversions => self.conversions as f64,
            Metric::Spend => self.spend,
            Metric::Cpc => self.cpc,
            Metric::Ctr => self.ctr,
        }
    }
}

/// One day of metric values.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MetricSample {
    pub date: NaiveDate,
    pub impressions: f64,
    pub clicks: f64,
    pub conversions: f64,
    pub spend: f64,
    pub cpc: f64,
    pub ctr: f64,
}

impl MetricSample {
    pub fn zero(date: NaiveDate) -> Self {
        Self {
            date,
            impressions: 0.0,
            clicks: 0.0,
            conversions: 0.0,
            spend: 0.0,
            cpc: 0.0,
            ctr: 0.0,
        }
    }

    pub fn value(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Impressions => self.impressions,
            Metric::Clicks => self.clicks,
            Metric::Conversions => self.conversions,
            Metric::Spend => self.spend,
            Metric::Cpc => self.cpc,
            Metric::Ctr => self.ctr,
        }
    }

    pub fn set(&mut self, metric: Metric, value: f64) {
        match metric {
            Metric::Impressions => self.impressions = value,
            Metric::Clicks => self.clicks = value,
            Metric::Conversions => self.conversions = value,
            Metric::Spend => self.spend = value,
            Metric::Cpc => self.cpc = value,
            Metric::Ctr => self.ctr = value,
        }
    }
}

/// Date-ascending daily samples for one campaign.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MetricSeries {
    pub campaign_id: Uuid,
    samples: Vec<MetricSample>,
}

impl MetricSeries {
    /// Build a series, sorting samples by date.
    pub fn new(campaign_id: Uuid, mut samples: Vec<MetricSample>) -> Self {
        samples.sort_by_key(|s| s.date);
        Self {
            campaign_id,
            samples,
        }
    }

    pub fn samples(&self) -> &[MetricSample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn last(&self) -> Option<&MetricSample> {
        self.samples.last()
    }

    /// Values of one metric in date order.
    pub fn values(&self, metric: Metric) -> Vec<f64> {
        self.samples.iter().map(|s| s.value(metric)).collect()
    }

    /// Sum of one metric over the whole series.
    pub fn total(&self, metric: Metric) -> f64 {
        self.samples.iter().map(|s| s.value(metric)).sum()
    }
}
