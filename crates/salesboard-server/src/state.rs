use anyhow::Result;
use axum::extract::FromRef;
use std::sync::Arc;
use tracing::info;

use crate::config::Settings;
use crate::crm::{CrmSource, HubSpotClient, OwnerDirectory, PagedFetcher};
use crate::roster::{MediaStore, RosterStore};
use crate::services::{GoalService, RosterService, SalesService};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub owners: Arc<OwnerDirectory>,
    pub sales_service: Arc<SalesService>,
    pub goal_service: Arc<GoalService>,
    pub roster_service: Arc<RosterService>,
}

impl AppState {
    /// Wire services against the live CRM.
    pub async fn new(settings: Settings) -> Result<Self> {
        let fetcher = PagedFetcher::new(&settings.crm);
        Self::with_source(settings, Arc::new(HubSpotClient::new(fetcher))).await
    }

    /// Prepare storage (roster document, media directories) and wire services.
    pub async fn with_source(settings: Settings, source: Arc<dyn CrmSource>) -> Result<Self> {
        let roster = Arc::new(RosterStore::open(&settings.roster.data_file).await?);
        info!("✅ Roster store at {}", roster.path().display());

        let media = Arc::new(MediaStore::new(&settings.media));
        media.ensure_dirs().await?;
        info!("✅ Media directories ready");

        let owners = Arc::new(OwnerDirectory::new(source.clone()));

        let sales_service = Arc::new(SalesService::new(
            source.clone(),
            owners.clone(),
            roster.clone(),
            settings.crm.closed_won_stage.clone(),
        ));
        let goal_service = Arc::new(GoalService::new(source, owners.clone(), roster.clone()));
        let roster_service = Arc::new(RosterService::new(roster, media));

        Ok(Self {
            settings: Arc::new(settings),
            owners,
            sales_service,
            goal_service,
            roster_service,
        })
    }
}

impl FromRef<AppState> for Arc<RosterService> {
    fn from_ref(state: &AppState) -> Self {
        state.roster_service.clone()
    }
}
