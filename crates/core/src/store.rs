//! Read-only boundary to the persistent campaign store.

use crate::error::CampaignResult;
use crate::types::{Campaign, CampaignStatus};
use uuid::Uuid;

/// Source of campaign records, scoped to the requesting user.
///
/// Implementations return `CampaignError::NotFound` when the id does not
/// resolve for `user_id`, including ids owned by other users.
pub trait CampaignStore: Send + Sync {
    fn get_campaign(&self, user_id: &str, campaign_id: Uuid) -> CampaignResult<Campaign>;

    /// All of the user's campaigns whose status is in `statuses`.
    fn list_campaigns(
        &self,
        user_id: &str,
        statuses: &[CampaignStatus],
    ) -> CampaignResult<Vec<Campaign>>;
}
