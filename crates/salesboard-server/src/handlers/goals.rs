use axum::{extract::State, Json};
use tracing::info;

use crate::services::GoalRow;
use crate::state::AppState;
use crate::utils::error::ApiError;

/// GET /goals - goal targets assigned to roster members.
pub async fn goals_handler(State(state): State<AppState>) -> Result<Json<Vec<GoalRow>>, ApiError> {
    info!("Goal targets requested");

    let rows = state.goal_service.matched_goals().await?;
    Ok(Json(rows))
}
