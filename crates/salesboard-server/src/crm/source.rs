use async_trait::async_trait;

use super::models::{
    DealObject, GoalTargetObject, OwnerRecord, DEAL_PROPERTIES, GOAL_NAME_PROPERTIES,
    GOAL_TARGET_PROPERTIES,
};
use super::paging::{FetchOutcome, PagedFetcher};

pub const OWNERS_PATH: &str = "/crm/v3/owners";
pub const DEALS_PATH: &str = "/crm/v3/objects/deals";
pub const GOAL_TARGETS_PATH: &str = "/crm/v3/objects/goal_targets";

/// Listings the dashboard reads from the CRM.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CrmSource: Send + Sync {
    async fn owners(&self) -> FetchOutcome<OwnerRecord>;

    async fn deals(&self) -> FetchOutcome<DealObject>;

    async fn goal_targets(&self) -> FetchOutcome<GoalTargetObject>;

    /// First page of goal targets carrying only their names.
    async fn goal_target_names(&self) -> FetchOutcome<GoalTargetObject>;
}

/// HubSpot v3 implementation on top of [`PagedFetcher`].
#[derive(Clone)]
pub struct HubSpotClient {
    fetcher: PagedFetcher,
}

impl HubSpotClient {
    pub fn new(fetcher: PagedFetcher) -> Self {
        Self { fetcher }
    }
}

#[async_trait]
impl CrmSource for HubSpotClient {
    async fn owners(&self) -> FetchOutcome<OwnerRecord> {
        self.fetcher.fetch_all(OWNERS_PATH, &[]).await
    }

    async fn deals(&self) -> FetchOutcome<DealObject> {
        self.fetcher.fetch_all(DEALS_PATH, DEAL_PROPERTIES).await
    }

    async fn goal_targets(&self) -> FetchOutcome<GoalTargetObject> {
        self.fetcher
            .fetch_all(GOAL_TARGETS_PATH, GOAL_TARGET_PROPERTIES)
            .await
    }

    async fn goal_target_names(&self) -> FetchOutcome<GoalTargetObject> {
        self.fetcher
            .fetch_first(GOAL_TARGETS_PATH, GOAL_NAME_PROPERTIES)
            .await
    }
}
