//! In-memory campaign store backed by DashMap.
//!
//! Production: replace with the managed database the ad-platform sync jobs
//! write into. This provides the same read API for development and testing.

use campaign_core::{Campaign, CampaignError, CampaignResult, CampaignStatus, CampaignStore};
use dashmap::DashMap;
use std::path::Path;
use tracing::{debug, info};
use uuid::Uuid;

/// Owner used for the built-in demo campaigns.
pub const DEMO_USER: &str = "demo-user";

/// Thread-safe, user-scoped campaign store.
pub struct ManagementStore {
    campaigns: DashMap<Uuid, Campaign>,
}

impl ManagementStore {
    pub fn new() -> Self {
        info!("Management store initialized (in-memory, development mode)");
        Self {
            campaigns: DashMap::new(),
        }
    }

    /// Store pre-populated with the demo portfolio owned by [`DEMO_USER`].
    pub fn with_demo_data() -> Self {
        let store = Self::new();
        store.seed_demo_data();
        store
    }

    /// Load a JSON array of campaigns from disk.
    pub fn load_json_file(&self, path: impl AsRef<Path>) -> CampaignResult<usize> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let count = self.load_json(&raw)?;
        info!(path = %path.as_ref().display(), campaigns = count, "Seeded campaign store");
        Ok(count)
    }

    /// Insert every campaign from a JSON array. Returns the number loaded.
    pub fn load_json(&self, raw: &str) -> CampaignResult<usize> {
        let campaigns: Vec<Campaign> = serde_json::from_str(raw)?;
        let count = campaigns.len();
        for campaign in campaigns {
            self.upsert(campaign);
        }
        Ok(count)
    }

    /// Insert or replace a campaign. Used by seeding and by sync jobs.
    pub fn upsert(&self, campaign: Campaign) {
        debug!(campaign_id = %campaign.id, user_id = %campaign.user_id, "Upserting campaign");
        self.campaigns.insert(campaign.id, campaign);
    }

    pub fn len(&self) -> usize {
        self.campaigns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.campaigns.is_empty()
    }

    fn seed_demo_data(&self) {
        let campaigns = vec![
            ("Holiday Season Push", CampaignStatus::Active, 50_000.0, 42_000.0, 1_250_000, 37_500, 625, 18_750.0),
            ("Back to School", CampaignStatus::Active, 25_000.0, 12_450.0, 890_000, 26_700, 445, 12_450.0),
            ("Summer Clearance", CampaignStatus::Completed, 15_000.0, 14_800.0, 2_100_000, 63_000, 1050, 14_800.0),
            ("New User Acquisition", CampaignStatus::Active, 75_000.0, 42_500.0, 3_400_000, 85_000, 1700, 42_500.0),
            ("VIP Loyalty Rewards", CampaignStatus::Active, 10_000.0, 6_750.0, 450_000, 22_500, 900, 6_750.0),
            ("Flash Sale Weekend", CampaignStatus::Paused, 8_000.0, 4_200.0, 320_000, 12_800, 384, 4_200.0),
            ("Brand Awareness Q1", CampaignStatus::Draft, 30_000.0, 0.0, 0, 0, 0, 0.0),
        ];

        for (i, (name, status, budget, spent, imps, clicks, convs, spend)) in
            campaigns.into_iter().enumerate()
        {
            let ctr = if imps > 0 { clicks as f64 / imps as f64 * 100.0 } else { 0.0 };
            let cpc = if clicks > 0 { spend / clicks as f64 } else { 0.0 };
            self.upsert(Campaign {
                id: Uuid::from_u128(i as u128 + 1),
                user_id: DEMO_USER.to_string(),
                name: name.to_string(),
                status,
                impressions: imps,
                clicks,
                conversions: convs,
                spend,
                cpc,
                ctr,
                budget_total: budget,
                budget_spent: spent,
            });
        }
    }
}

impl CampaignStore for ManagementStore {
    fn get_campaign(&self, user_id: &str, campaign_id: Uuid) -> CampaignResult<Campaign> {
        self.campaigns
            .get(&campaign_id)
            .filter(|entry| entry.value().user_id == user_id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| CampaignError::NotFound(format!("campaign {} not found", campaign_id)))
    }

    fn list_campaigns(
        &self,
        user_id: &str,
        statuses: &[CampaignStatus],
    ) -> CampaignResult<Vec<Campaign>> {
        let mut campaigns: Vec<Campaign> = self
            .campaigns
            .iter()
            .filter(|r| r.value().user_id == user_id && statuses.contains(&r.value().status))
            .map(|r| r.value().clone())
            .collect();
        // Stable order keeps portfolio aggregation reproducible.
        campaigns.sort_by_key(|c| c.id);
        Ok(campaigns)
    }
}

impl Default for ManagementStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn campaign(id: u128, user: &str, status: CampaignStatus) -> Campaign {
        Campaign {
            id: Uuid::from_u128(id),
            user_id: user.to_string(),
            name: format!("Campaign {}", id),
            status,
            impressions: 1000,
            clicks: 30,
            conversions: 3,
            spend: 60.0,
            cpc: 2.0,
            ctr: 3.0,
            budget_total: 100.0,
            budget_spent: 60.0,
        }
    }

    #[test]
    fn test_get_campaign_scoped_by_user() {
        let store = ManagementStore::new();
        store.upsert(campaign(1, "alice", CampaignStatus::Active));

        assert!(store.get_campaign("alice", Uuid::from_u128(1)).is_ok());
        let err = store.get_campaign("bob", Uuid::from_u128(1)).unwrap_err();
        assert_eq!(err.kind(), "not_found");
        let err = store.get_campaign("alice", Uuid::from_u128(2)).unwrap_err();
        assert_eq!(err.kind(), "not_found");
    }

    #[test]
    fn test_list_filters_status_and_owner() {
        let store = ManagementStore::new();
        store.upsert(campaign(3, "alice", CampaignStatus::Paused));
        store.upsert(campaign(1, "alice", CampaignStatus::Active));
        store.upsert(campaign(2, "alice", CampaignStatus::Draft));
        store.upsert(campaign(4, "bob", CampaignStatus::Active));

        let listed = store
            .list_campaigns("alice", &[CampaignStatus::Active, CampaignStatus::Paused])
            .unwrap();
        let ids: Vec<Uuid> = listed.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![Uuid::from_u128(1), Uuid::from_u128(3)]);
    }

    #[test]
    fn test_load_json() {
        let store = ManagementStore::new();
        let raw = serde_json::to_string(&vec![
            campaign(1, "alice", CampaignStatus::Active),
            campaign(2, "alice", CampaignStatus::Paused),
        ])
        .unwrap();

        assert_eq!(store.load_json(&raw).unwrap(), 2);
        assert_eq!(store.len(), 2);
        assert!(store.load_json("{not json").is_err());
    }

    #[test]
    fn test_demo_data_seeded() {
        let store = ManagementStore::with_demo_data();
        assert_eq!(store.len(), 7);
        let holiday = store.get_campaign(DEMO_USER, Uuid::from_u128(1)).unwrap();
        assert_eq!(holiday.name, "Holiday Season Push");
        assert!((holiday.ctr - 3.0).abs() < 1e-9);
        assert!((holiday.cpc - 0.5).abs() < 1e-9);
    }
}
