//! Budget adjustment recommendations from spend efficiency and utilization.

use campaign_core::config::BudgetConfig;
use campaign_core::{Campaign, CampaignError, CampaignResult, Metric, MetricSeries};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// Outcome the efficiency ratio is measured against.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TargetMetric {
    #[default]
    Conversions,
    Clicks,
}

impl FromStr for TargetMetric {
    type Err = CampaignError;

    fn from_str(s: &str) -> CampaignResult<Self> {
        match s {
            "conversions" => Ok(TargetMetric::Conversions),
            "clicks" => Ok(TargetMetric::Clicks),
            other => Err(CampaignError::Validation(format!(
                "unsupported targetMetric '{}' (expected conversions or clicks)",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SupportingMetrics {
    /// Target outcomes per unit of spend.
    pub efficiency: f64,
    /// `spend / budget * 100`, 0 without a budget.
    pub utilization_rate: f64,
    pub cost_per_conversion: f64,
    /// Conversions per click over the series.
    pub conversion_rate: f64,
    /// Spend per click over the series.
    pub average_cpc: f64,
    pub expected_conversions: f64,
    pub expected_revenue: f64,
    #[serde(rename = "expectedROI")]
    pub expected_roi: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BudgetRecommendation {
    pub campaign_id: Uuid,
    pub target_metric: TargetMetric,
    pub current_budget: f64,
    pub recommended_budget: f64,
    pub change_percent: f64,
    pub reasoning: Vec<String>,
    pub supporting_metrics: SupportingMetrics,
}

pub struct BudgetRecommender {
    config: BudgetConfig,
    average_conversion_value: f64,
}

impl BudgetRecommender {
    pub fn new(config: BudgetConfig, average_conversion_value: f64) -> Self {
        Self {
            config,
            average_conversion_value,
        }
    }

    /// Recommend a budget for `campaign`.
    ///
    /// The efficiency rule and the underutilization rule compose
    /// multiplicatively. `series` only feeds the supporting metrics.
    pub fn recommend(
        &self,
        campaign: &Campaign,
        series: &MetricSeries,
        target: TargetMetric,
    ) -> BudgetRecommendation {
        let cfg = &self.config;
        let spend = campaign.spend;
        let current_budget = campaign.budget_total.max(0.0);
        let outcomes = match target {
            TargetMetric::Conversions => campaign.conversions as f64,
            TargetMetric::Clicks => campaign.clicks as f64,
        };

        let efficiency = if spend > 0.0 { outcomes / spend } else { 0.0 };
        let mut multiplier = 1.0;
        let mut reasoning = Vec::new();

        if efficiency > cfg.high_efficiency {
            multiplier *= 1.0 + cfg.high_efficiency_adjustment_pct / 100.0;
            reasoning.push(format!(
                "High efficiency ({:.2} {} per unit spend): increase budget by {:.0}%.",
                efficiency,
                target_label(target),
                cfg.high_efficiency_adjustment_pct
            ));
        } else if efficiency > cfg.good_efficiency {
            multiplier *= 1.0 + cfg.good_efficiency_adjustment_pct / 100.0;
            reasoning.push(format!(
                "Good efficiency ({:.2} {} per unit spend): increase budget by {:.0}%.",
                efficiency,
                target_label(target),
                cfg.good_efficiency_adjustment_pct
            ));
        } else if efficiency < cfg.low_efficiency && spend > 0.0 {
            multiplier *= 1.0 + cfg.low_efficiency_adjustment_pct / 100.0;
            reasoning.push(format!(
                "Low efficiency ({:.2} {} per unit spend): reduce budget by {:.0}% and optimize targeting before scaling again.",
                efficiency,
                target_label(target),
                cfg.low_efficiency_adjustment_pct.abs()
            ));
        } else if spend > 0.0 {
            reasoning.push(format!(
                "Moderate efficiency ({:.2} {} per unit spend): keep the current budget.",
                efficiency,
                target_label(target)
            ));
        } else {
            reasoning.push("No spend recorded yet; efficiency cannot be assessed.".to_string());
        }

        let utilization_rate = if current_budget > 0.0 {
            spend / current_budget * 100.0
        } else {
            0.0
        };
        if current_budget > 0.0 && utilization_rate < cfg.underutilization_threshold_pct {
            multiplier *= 1.0 + cfg.underutilization_adjustment_pct / 100.0;
            reasoning.push(format!(
                "Only {:.1}% of the budget is used: adjust by a further {:.0}%.",
                utilization_rate, cfg.underutilization_adjustment_pct
            ));
        }

        let recommended_budget = (current_budget * multiplier).max(0.0);
        let change_percent = if current_budget > 0.0 {
            (recommended_budget - current_budget) / current_budget * 100.0
        } else {
            0.0
        };

        BudgetRecommendation {
            campaign_id: campaign.id,
            target_metric: target,
            current_budget,
            recommended_budget,
            change_percent,
            reasoning,
            supporting_metrics: self.supporting_metrics(
                campaign,
                series,
                efficiency,
                utilization_rate,
                recommended_budget,
            ),
        }
    }

    fn supporting_metrics(
        &self,
        campaign: &Campaign,
        series: &MetricSeries,
        efficiency: f64,
        utilization_rate: f64,
        recommended_budget: f64,
    ) -> SupportingMetrics {
        let clicks = series.total(Metric::Clicks);
        let conversions = series.total(Metric::Conversions);
        let spend = series.total(Metric::Spend);

        let conversion_rate = if clicks > 0.0 { conversions / clicks } else { 0.0 };
        let average_cpc = if clicks > 0.0 { spend / clicks } else { 0.0 };
        let expected_conversions = if average_cpc > 0.0 {
            recommended_budget / average_cpc * conversion_rate
        } else {
            0.0
        };
        let expected_revenue = expected_conversions * self.average_conversion_value;
        let expected_roi = if recommended_budget > 0.0 {
            expected_revenue / recommended_budget
        } else {
            0.0
        };

        SupportingMetrics {
            efficiency,
            utilization_rate,
            cost_per_conversion: if campaign.conversions > 0 {
                campaign.spend / campaign.conversions as f64
            } else {
                0.0
            },
            conversion_rate,
            average_cpc,
            expected_conversions,
            expected_revenue,
            expected_roi,
        }
    }
}

fn target_label(target: TargetMetric) -> &'static str {
    match target {
        TargetMetric::Conversions => "conversions",
        TargetMetric::Clicks => "clicks",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use campaign_core::{CampaignStatus, MetricSample};
    use chrono::NaiveDate;

    fn campaign(conversions: u64, spend: f64, budget: f64) -> Campaign {
        Campaign {
            id: Uuid::from_u128(7),
            user_id: "u-1".to_string(),
            name: "Retargeting".to_string(),
            status: CampaignStatus::Active,
            impressions: 50_000,
            clicks: 1_000,
            conversions,
            spend,
            cpc: 1.0,
            ctr: 2.0,
            budget_total: budget,
            budget_spent: spend,
        }
    }

    fn series(clicks: f64, conversions: f64, spend: f64) -> MetricSeries {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let samples = (0..10)
            .map(|i| {
                let mut s = MetricSample::zero(start + chrono::Duration::days(i));
                s.clicks = clicks;
                s.conversions = conversions;
                s.spend = spend;
                s
            })
            .collect();
        MetricSeries::new(Uuid::from_u128(7), samples)
    }

    fn recommender() -> BudgetRecommender {
        BudgetRecommender::new(BudgetConfig::default(), 50.0)
    }

    // 1. Efficiency rules ----------------------------------------------------

    #[test]
    fn test_high_efficiency_scales_up() {
        // 600 conversions / 1000 spend = 0.6, utilization 80%
        let rec = recommender().recommend(&campaign(600, 1000.0, 1250.0), &series(10.0, 1.0, 10.0), TargetMetric::Conversions);
        assert!((rec.supporting_metrics.efficiency - 0.6).abs() < 1e-12);
        assert!((rec.recommended_budget - 1625.0).abs() < 1e-9);
        assert!((rec.change_percent - 30.0).abs() < 1e-9);
        assert_eq!(rec.reasoning.len(), 1);
    }

    #[test]
    fn test_good_efficiency() {
        let rec = recommender().recommend(&campaign(300, 1000.0, 1000.0), &series(10.0, 1.0, 10.0), TargetMetric::Conversions);
        assert!((rec.change_percent - 15.0).abs() < 1e-9);
    }

    #[test]
    fn test_low_efficiency_and_underutilization_compose() {
        // 50 / 1000 = 0.05 -> -20%, utilization 50% -> further -10%
        let rec = recommender().recommend(&campaign(50, 1000.0, 2000.0), &series(10.0, 1.0, 10.0), TargetMetric::Conversions);
        assert!((rec.recommended_budget - 2000.0 * 0.8 * 0.9).abs() < 1e-9);
        assert!((rec.change_percent - (-28.0)).abs() < 1e-9);
        assert_eq!(rec.reasoning.len(), 2);
        assert!(rec.reasoning[0].contains("optimize"));
    }

    #[test]
    fn test_zero_spend_guard() {
        let rec = recommender().recommend(&campaign(40, 0.0, 1000.0), &series(0.0, 0.0, 0.0), TargetMetric::Conversions);
        assert_eq!(rec.supporting_metrics.efficiency, 0.0);
        assert!(!rec.reasoning.iter().any(|r| r.contains("reduce budget by 20%")));
        // underutilization still applies: 0% of budget used
        assert!((rec.recommended_budget - 900.0).abs() < 1e-9);
        assert!(rec.recommended_budget.is_finite());
    }

    #[test]
    fn test_click_target() {
        // 1000 clicks / 1000 spend = 1.0
        let rec = recommender().recommend(&campaign(1, 1000.0, 1000.0), &series(10.0, 1.0, 10.0), TargetMetric::Clicks);
        assert_eq!(rec.target_metric, TargetMetric::Clicks);
        assert!((rec.change_percent - 30.0).abs() < 1e-9);
    }

    // 2. Guards --------------------------------------------------------------

    #[test]
    fn test_zero_budget_never_negative() {
        let rec = recommender().recommend(&campaign(10, 500.0, 0.0), &series(10.0, 1.0, 10.0), TargetMetric::Conversions);
        assert_eq!(rec.recommended_budget, 0.0);
        assert_eq!(rec.change_percent, 0.0);
        assert_eq!(rec.supporting_metrics.utilization_rate, 0.0);
    }

    #[test]
    fn test_parse_target_metric() {
        assert_eq!("clicks".parse::<TargetMetric>().unwrap(), TargetMetric::Clicks);
        let err = "revenue".parse::<TargetMetric>().unwrap_err();
        assert_eq!(err.kind(), "validation");
    }

    // 3. Supporting metrics --------------------------------------------------

    #[test]
    fn test_supporting_metrics() {
        // per day: 20 clicks, 2 conversions, 40 spend -> cvr 0.1, cpc 2.0
        let rec = recommender().recommend(&campaign(300, 1000.0, 1000.0), &series(20.0, 2.0, 40.0), TargetMetric::Conversions);
        let m = &rec.supporting_metrics;
        assert!((m.cost_per_conversion - 1000.0 / 300.0).abs() < 1e-9);
        assert!((m.conversion_rate - 0.1).abs() < 1e-12);
        assert!((m.average_cpc - 2.0).abs() < 1e-12);
        // 1150 / 2.0 * 0.1 = 57.5 conversions -> 2875 revenue
        assert!((m.expected_conversions - 57.5).abs() < 1e-9);
        assert!((m.expected_revenue - 2875.0).abs() < 1e-9);
        assert!((m.expected_roi - 2875.0 / 1150.0).abs() < 1e-9);
    }

    #[test]
    fn test_expected_roi_serialized_name() {
        let rec = recommender().recommend(&campaign(300, 1000.0, 1000.0), &series(20.0, 2.0, 40.0), TargetMetric::Conversions);
        let json = serde_json::to_value(&rec).unwrap();
        assert!(json["supportingMetrics"]["expectedROI"].is_number());
        assert!(json["recommendedBudget"].is_number());
    }
}
