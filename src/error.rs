use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::backend::BackendError;

/// AppError
///
/// Every failure a BFF handler can surface to the browser. The gate never produces one of
/// these: a missing or mismatched role is answered with a redirect instead.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("authentication required")]
    Unauthorized,

    #[error("insufficient permissions for this resource")]
    Forbidden,

    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Backend(BackendError::Status { status, .. }) if status.is_client_error() => {
                *status
            }
            AppError::Backend(BackendError::Rejected(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Backend(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Backend client errors carry a message meant for the user; anything else is an
        // upstream outage and only the logs get the details.
        let message = match &self {
            AppError::Backend(BackendError::Status { message, .. }) if status.is_client_error() => {
                message.clone()
            }
            AppError::Backend(BackendError::Rejected(message)) => message.clone(),
            AppError::Backend(e) => {
                tracing::error!(error = %e, "backend request failed");
                "Backend service unavailable".to_string()
            }
            other => other.to_string(),
        };

        (
            status,
            Json(json!({
                "success": false,
                "code": status.as_u16(),
                "message": message,
            })),
        )
            .into_response()
    }
}
