use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{info, warn};

use crate::crm::models::GoalTargetObject;
use crate::crm::{CrmSource, OwnerDirectory, OwnerMap};
use crate::roster::{assigned_goal_names, Roster, RosterStore};
use crate::utils::error::ApiError;

/// Goal target assigned to someone on the roster, keyed the way the
/// dashboard reads it.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GoalRow {
    #[serde(rename = "Goal Name")]
    pub goal_name: String,
    #[serde(rename = "Target")]
    pub target: Option<String>,
    #[serde(rename = "Start")]
    pub start: Option<String>,
    #[serde(rename = "End")]
    pub end: Option<String>,
    #[serde(rename = "Created By")]
    pub created_by: String,
}

/// Keep targets whose name is exactly some roster entry's goal, in CRM order.
pub fn select_goals(targets: &[GoalTargetObject], roster: &Roster, owners: &OwnerMap) -> Vec<GoalRow> {
    let wanted = assigned_goal_names(roster);

    targets
        .iter()
        .map(|target| &target.properties)
        .filter_map(|props| {
            let name = props.hs_goal_name.as_deref()?;
            if !wanted.contains(name) {
                return None;
            }
            Some(GoalRow {
                goal_name: name.to_string(),
                target: props.hs_target_amount.clone(),
                start: props.hs_start_datetime.clone(),
                end: props.hs_end_datetime.clone(),
                created_by: owners
                    .resolve(props.hs_created_by_user_id.as_deref().unwrap_or_default())
                    .to_string(),
            })
        })
        .collect()
}

pub struct GoalService {
    source: Arc<dyn CrmSource>,
    owners: Arc<OwnerDirectory>,
    roster: Arc<RosterStore>,
}

impl GoalService {
    pub fn new(
        source: Arc<dyn CrmSource>,
        owners: Arc<OwnerDirectory>,
        roster: Arc<RosterStore>,
    ) -> Self {
        Self {
            source,
            owners,
            roster,
        }
    }

    /// Goal targets of roster members. Unlike the sales view, a failed
    /// listing is an error here rather than a shorter list.
    pub async fn matched_goals(&self) -> Result<Vec<GoalRow>, ApiError> {
        let roster = self
            .roster
            .load()
            .await
            .map_err(|e| ApiError::StorageError(e.to_string()))?;

        let targets = self
            .source
            .goal_targets()
            .await
            .into_result()
            .map_err(|halt| ApiError::Upstream {
                status: halt.upstream_status(),
                context: "Failed to fetch goals".to_string(),
                detail: halt.to_string(),
            })?;

        let owners = self.owners.snapshot().await;
        let rows = select_goals(&targets, &roster, &owners);
        info!("{} of {} goal targets assigned on the roster", rows.len(), targets.len());
        Ok(rows)
    }

    /// Distinct goal names offered in the admin form, sorted.
    pub async fn goal_names(&self) -> Vec<String> {
        let outcome = self.source.goal_target_names().await;
        if let Some(halt) = &outcome.halt {
            warn!("Could not list goal names: {}", halt);
        }

        outcome
            .records
            .into_iter()
            .filter_map(|target| target.properties.hs_goal_name)
            .filter(|name| !name.is_empty())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}
