use axum::{Json, http::StatusCode, response::{IntoResponse, Response}};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::backend::BackendError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized")]
    Unauthorized,

    /// Generic failure of a task action; the backend's own message stays in the logs.
    #[error("{0}")]
    ActionFailed(&'static str),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl AppError {
    /// Message safe to show to the user.
    pub fn public_message(&self) -> String {
        match self {
            AppError::BadRequest(msg) => msg.clone(),
            AppError::ActionFailed(msg) => msg.to_string(),
            AppError::Unauthorized => "You need to sign in first".to_string(),
            AppError::Backend(_) | AppError::Config(_) => "Something went wrong".to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            AppError::ActionFailed(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.to_string()),
            AppError::Backend(e) => {
                error!("backend error: {}", e);
                (
                    StatusCode::BAD_GATEWAY,
                    "Backend request failed".to_string(),
                )
            }
            AppError::Config(e) => {
                error!("configuration error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(ErrorResponse {
            error: status.to_string(),
            message: error_message,
        });

        (status, body).into_response()
    }
}
