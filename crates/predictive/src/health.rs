//! Composite campaign health score.
//!
//! Three sub-scores start from a neutral baseline, move by fixed rule
//! increments, and are clamped to `[0, 100]`:
//!
//! - performance: CTR, CPC and conversion volume
//! - efficiency: budget utilization and CPC against the benchmark
//! - growth: the conversion trend
//!
//! The overall score is their weighted blend.

use crate::trend::{TrendDirection, TrendResult};
use campaign_core::config::HealthConfig;
use campaign_core::Campaign;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Warning,
    Critical,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HealthScore {
    pub overall: u32,
    pub performance: u32,
    pub efficiency: u32,
    pub growth: u32,
    pub warnings: Vec<String>,
    pub recommendations: Vec<String>,
    pub status: HealthStatus,
}

pub const FALLBACK_RECOMMENDATION: &str =
    "Campaign is performing within expectations; continue monitoring.";

pub struct HealthScorer {
    config: HealthConfig,
}

#[derive(Default)]
struct Notes {
    warnings: Vec<String>,
    recommendations: Vec<String>,
}

impl Notes {
    fn warn(&mut self, warning: String, recommendation: &str) {
        self.warnings.push(warning);
        self.recommendations.push(recommendation.to_string());
    }
}

impl HealthScorer {
    pub fn new(config: HealthConfig) -> Self {
        Self { config }
    }

    pub fn score(&self, campaign: &Campaign, conversion_trend: &TrendResult) -> HealthScore {
        let mut notes = Notes::default();

        let performance = clamp_score(self.performance(campaign, &mut notes));
        let efficiency = clamp_score(self.efficiency(campaign, &mut notes));
        let growth = clamp_score(self.growth(conversion_trend, &mut notes));

        let overall = clamp_score(
            self.config.performance_weight * performance as f64
                + self.config.efficiency_weight * efficiency as f64
                + self.config.growth_weight * growth as f64,
        );

        if notes.recommendations.is_empty() {
            notes.recommendations.push(FALLBACK_RECOMMENDATION.to_string());
        }

        HealthScore {
            overall,
            performance,
            efficiency,
            growth,
            warnings: notes.warnings,
            recommendations: notes.recommendations,
            status: self.status(overall),
        }
    }

    pub fn status(&self, overall: u32) -> HealthStatus {
        if overall >= self.config.healthy_threshold {
            HealthStatus::Healthy
        } else if overall >= self.config.warning_threshold {
            HealthStatus::Warning
        } else {
            HealthStatus::Critical
        }
    }

    fn performance(&self, campaign: &Campaign, notes: &mut Notes) -> f64 {
        let mut score = self.config.baseline;

        if campaign.ctr > 3.0 {
            score += 15.0;
        } else if campaign.ctr > 2.0 {
            score += 10.0;
        } else if campaign.ctr < 1.0 {
            score -= 10.0;
            notes.warn(
                format!("CTR too low ({:.2}%)", campaign.ctr),
                "Refresh ad creatives and tighten audience targeting to lift CTR.",
            );
        }

        if campaign.cpc < 2.0 {
            score += 10.0;
        } else if campaign.cpc > 5.0 {
            score -= 10.0;
            notes.warn(
                format!("CPC too high ({:.2})", campaign.cpc),
                "Review keyword bids and add negative keywords to bring CPC down.",
            );
        }

        if campaign.conversions > 50 {
            score += 15.0;
        } else if campaign.conversions > 20 {
            score += 10.0;
        } else if campaign.conversions < 5 {
            score -= 15.0;
            notes.warn(
                format!("Too few conversions ({})", campaign.conversions),
                "Audit the landing page and conversion tracking.",
            );
        }

        score
    }

    fn efficiency(&self, campaign: &Campaign, notes: &mut Notes) -> f64 {
        let mut score = self.config.baseline;

        if campaign.budget_total > 0.0 {
            let utilization = campaign.budget_spent / campaign.budget_total * 100.0;
            if utilization > 80.0 && utilization < 100.0 {
                score += 20.0;
            } else if utilization < 50.0 {
                score -= 10.0;
                notes.warn(
                    format!("Budget underutilized ({:.1}% spent)", utilization),
                    "Broaden targeting or raise bids to use the allocated budget.",
                );
            }
        }

        let benchmark = self.config.cpc_benchmark;
        if campaign.cpc < benchmark {
            score += 15.0;
        } else if campaign.cpc >= benchmark * 1.5 {
            score -= 15.0;
        }

        score
    }

    fn growth(&self, trend: &TrendResult, notes: &mut Notes) -> f64 {
        let mut score = self.config.baseline;
        let change = trend.change_percentage;

        match trend.direction {
            TrendDirection::Increasing => {
                score += change.min(self.config.growth_cap_pct);
                notes.recommendations.push(format!(
                    "Conversions are up {:.1}%; consider scaling the budget.",
                    change
                ));
            }
            TrendDirection::Decreasing => {
                score -= change.abs();
                notes.warnings.push(format!("Conversions declining ({:.1}%)", change));
                notes
                    .recommendations
                    .push("Investigate the conversion drop before increasing spend.".to_string());
            }
            TrendDirection::Stable => {}
        }

        score
    }
}

impl Default for HealthScorer {
    fn default() -> Self {
        Self::new(HealthConfig::default())
    }
}

fn clamp_score(raw: f64) -> u32 {
    if raw.is_nan() {
        return 0;
    }
    raw.clamp(0.0, 100.0).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use campaign_core::CampaignStatus;
    use uuid::Uuid;

    fn campaign(ctr: f64, cpc: f64, conversions: u64, total: f64, spent: f64) -> Campaign {
        Campaign {
            id: Uuid::nil(),
            user_id: "u-1".to_string(),
            name: "Test".to_string(),
            status: CampaignStatus::Active,
            impressions: 10_000,
            clicks: 100,
            conversions,
            spend: spent,
            cpc,
            ctr,
            budget_total: total,
            budget_spent: spent,
        }
    }

    fn trend(direction: TrendDirection, change: f64) -> TrendResult {
        TrendResult {
            direction,
            change_percentage: change,
            confidence: 0.8,
            sample_count: 30,
        }
    }

    // 1. Critical campaign ---------------------------------------------------

    #[test]
    fn test_poor_campaign_is_critical_with_warnings() {
        let c = campaign(0.8, 6.0, 3, 1000.0, 300.0);
        let score = HealthScorer::default().score(&c, &trend(TrendDirection::Stable, 0.0));

        assert!(score.warnings.iter().any(|w| w.contains("CTR too low")));
        assert!(score.warnings.iter().any(|w| w.contains("CPC too high")));
        assert!(score.warnings.iter().any(|w| w.contains("Too few conversions")));
        assert!(score.warnings.iter().any(|w| w.contains("Budget underutilized")));
        // performance 50-10-10-15, efficiency 50-10-15, growth 50
        assert_eq!(score.performance, 15);
        assert_eq!(score.efficiency, 25);
        assert_eq!(score.growth, 50);
        assert_eq!(score.overall, 27);
        assert_eq!(score.status, HealthStatus::Critical);
    }

    #[test]
    fn test_poor_campaign_stays_critical_even_when_growing() {
        let c = campaign(0.8, 6.0, 3, 1000.0, 300.0);
        let score = HealthScorer::default().score(&c, &trend(TrendDirection::Increasing, 400.0));
        assert_eq!(score.growth, 75);
        assert!(score.overall < 40);
        assert_eq!(score.status, HealthStatus::Critical);
    }

    // 2. Healthy campaign ----------------------------------------------------

    #[test]
    fn test_strong_campaign_is_healthy() {
        let c = campaign(3.5, 1.5, 80, 1000.0, 900.0);
        let score = HealthScorer::default().score(&c, &trend(TrendDirection::Increasing, 12.0));

        // performance 50+15+10+15, efficiency 50+20+15, growth 50+12
        assert_eq!(score.performance, 90);
        assert_eq!(score.efficiency, 85);
        assert_eq!(score.growth, 62);
        assert_eq!(score.overall, 81);
        assert_eq!(score.status, HealthStatus::Healthy);
        assert!(score.warnings.is_empty());
        assert!(score.recommendations.iter().any(|r| r.contains("scaling")));
    }

    #[test]
    fn test_fallback_recommendation() {
        let c = campaign(2.5, 3.0, 30, 1000.0, 600.0);
        let score = HealthScorer::default().score(&c, &trend(TrendDirection::Stable, 1.0));
        assert_eq!(score.recommendations, vec![FALLBACK_RECOMMENDATION.to_string()]);
    }

    // 3. Guards and clamping -------------------------------------------------

    #[test]
    fn test_zero_budget_skips_utilization() {
        let c = campaign(2.5, 3.0, 30, 0.0, 0.0);
        let score = HealthScorer::default().score(&c, &trend(TrendDirection::Stable, 0.0));
        assert_eq!(score.efficiency, 65);
        assert!(!score.warnings.iter().any(|w| w.contains("Budget")));
    }

    #[test]
    fn test_scores_clamped() {
        let c = campaign(0.1, 50.0, 0, 1000.0, 10.0);
        let score = HealthScorer::default().score(&c, &trend(TrendDirection::Decreasing, -900.0));
        assert_eq!(score.growth, 0);
        for s in [score.overall, score.performance, score.efficiency, score.growth] {
            assert!(s <= 100);
        }
        assert!(score.warnings.iter().any(|w| w.contains("declining")));
    }

    #[test]
    fn test_status_thresholds() {
        let scorer = HealthScorer::default();
        assert_eq!(scorer.status(60), HealthStatus::Healthy);
        assert_eq!(scorer.status(59), HealthStatus::Warning);
        assert_eq!(scorer.status(40), HealthStatus::Warning);
        assert_eq!(scorer.status(39), HealthStatus::Critical);
    }
}
