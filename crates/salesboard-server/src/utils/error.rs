use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::roster::RosterError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// The CRM answered with a failure the caller must see.
    #[error("{context}: {detail}")]
    Upstream {
        status: StatusCode,
        context: String,
        detail: String,
    },

    #[error("Storage error: {0}")]
    StorageError(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self {
            ApiError::BadRequest(msg) => {
                tracing::warn!("Bad request: {}", msg);
                (StatusCode::BAD_REQUEST, "BadRequest".to_string(), msg)
            }
            ApiError::NotFound(msg) => {
                tracing::warn!("Not found: {}", msg);
                (StatusCode::NOT_FOUND, "NotFound".to_string(), msg)
            }
            ApiError::Upstream {
                status,
                context,
                detail,
            } => {
                tracing::error!("{}: {}", context, detail);
                (status, context, detail)
            }
            ApiError::StorageError(msg) => {
                tracing::error!("Storage error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "StorageError".to_string(), msg)
            }
        };

        let body = Json(ErrorResponse {
            error: error_type,
            message,
        });

        (status, body).into_response()
    }
}

impl From<RosterError> for ApiError {
    fn from(err: RosterError) -> Self {
        match err {
            RosterError::NotFound(name) => ApiError::NotFound(format!("Person not found: {}", name)),
            RosterError::Validation(msg) => ApiError::BadRequest(msg),
            other => ApiError::StorageError(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_keeps_crm_status() {
        let err = ApiError::Upstream {
            status: StatusCode::UNAUTHORIZED,
            context: "Failed to fetch goals".to_string(),
            detail: "CRM responded 401".to_string(),
        };
        assert_eq!(err.into_response().status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_roster_errors_map_to_client_statuses() {
        let not_found: ApiError = RosterError::NotFound("Jane".to_string()).into();
        assert_eq!(not_found.into_response().status(), StatusCode::NOT_FOUND);

        let invalid: ApiError = RosterError::Validation("file id is empty".to_string()).into();
        assert_eq!(invalid.into_response().status(), StatusCode::BAD_REQUEST);
    }
}
