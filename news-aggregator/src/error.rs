use crate::types::AggregatorError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

/// Errors as seen by HTTP clients. Bodies are always `{ "error": message }`.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Internal(String),
}

impl AppError {
    /// Maps a domain error, replacing the message of anything that ends up
    /// as a 500 with `message`.
    pub fn or_internal(message: &'static str) -> impl Fn(AggregatorError) -> AppError {
        move |err| match AppError::from(err) {
            AppError::Internal(_) => AppError::Internal(message.to_string()),
            other => other,
        }
    }
}

impl From<AggregatorError> for AppError {
    fn from(err: AggregatorError) -> Self {
        match err {
            AggregatorError::Validation(message) => AppError::BadRequest(message),
            AggregatorError::ParentNotFound { .. } => AppError::BadRequest(err.to_string()),
            AggregatorError::PostNotFound { .. } => AppError::NotFound(err.to_string()),
            other => {
                error!("Request failed: {}", other);
                AppError::Internal("Internal Server Error".to_string())
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
