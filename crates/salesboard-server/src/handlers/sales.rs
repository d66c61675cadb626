use axum::{extract::State, Json};
use tracing::info;

use crate::services::SalesRow;
use crate::state::AppState;
use crate::utils::error::ApiError;

/// GET /data - closed-won sales of the current month per roster member.
pub async fn monthly_sales_handler(
    State(state): State<AppState>,
) -> Result<Json<Vec<SalesRow>>, ApiError> {
    info!("Monthly sales requested");

    let summary = state.sales_service.monthly_sales().await?;
    Ok(Json(summary.rows))
}
