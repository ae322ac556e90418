//! Portfolio-level revenue forecast.

use crate::forecast::Forecaster;
use campaign_core::{Campaign, Metric, MetricSeries};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CampaignRevenueForecast {
    pub campaign_id: Uuid,
    pub name: String,
    pub predicted_conversions: f64,
    pub predicted_revenue: f64,
    pub predicted_spend: f64,
    /// `revenue / spend`, 0 when spend is 0.
    pub roi: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RevenueForecast {
    pub window_days: u32,
    pub average_conversion_value: f64,
    pub total_predicted_revenue: f64,
    pub total_predicted_spend: f64,
    #[serde(rename = "predictedROI")]
    pub predicted_roi: f64,
    pub campaigns: Vec<CampaignRevenueForecast>,
}

pub struct RevenueForecaster<'a> {
    forecaster: &'a Forecaster,
    average_conversion_value: f64,
}

impl<'a> RevenueForecaster<'a> {
    pub fn new(forecaster: &'a Forecaster, average_conversion_value: f64) -> Self {
        Self {
            forecaster,
            average_conversion_value,
        }
    }

    /// Next-day revenue and spend per campaign, summed over the portfolio.
    ///
    /// Conversions are extrapolated by linear regression and valued at the
    /// fixed average conversion value; spend uses the moving average.
    pub fn forecast(&self, portfolio: &[(Campaign, MetricSeries)], window_days: u32) -> RevenueForecast {
        let campaigns: Vec<CampaignRevenueForecast> = portfolio
            .iter()
            .map(|(campaign, series)| {
                let (predicted_conversions, _) = self
                    .forecaster
                    .linear_regression(&series.values(Metric::Conversions), 1);
                let (predicted_spend, _) = self.forecaster.moving_average(&series.values(Metric::Spend));
                let predicted_revenue = predicted_conversions * self.average_conversion_value;

                CampaignRevenueForecast {
                    campaign_id: campaign.id,
                    name: campaign.name.clone(),
                    predicted_conversions,
                    predicted_revenue,
                    predicted_spend,
                    roi: ratio(predicted_revenue, predicted_spend),
                }
            })
            .collect();

        let total_predicted_revenue: f64 = campaigns.iter().map(|c| c.predicted_revenue).sum();
        let total_predicted_spend: f64 = campaigns.iter().map(|c| c.predicted_spend).sum();

        RevenueForecast {
            window_days,
            average_conversion_value: self.average_conversion_value,
            total_predicted_revenue,
            total_predicted_spend,
            predicted_roi: ratio(total_predicted_revenue, total_predicted_spend),
            campaigns,
        }
    }
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}
