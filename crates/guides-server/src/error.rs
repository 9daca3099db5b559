use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::json;
use tracing::error;

use crate::markdown::CompileError;
use crate::repository::RepositoryError;
use crate::validation::ValidationErrors;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(String),

    #[error("{0}")]
    NotFound(&'static str),

    #[error("Validation failed")]
    Validation(ValidationErrors),

    #[error("{0}")]
    BadRequest(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Admin access required")]
    Forbidden,

    #[error("Rate limit exceeded")]
    RateLimited { reset_at_ms: i64 },

    #[error("Guide was modified since it was loaded")]
    Conflict,

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("failed to compile preview: {0}")]
    Compile(#[from] CompileError),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            AppError::Conflict => StatusCode::CONFLICT,
            AppError::Config(_)
            | AppError::Repository(_)
            | AppError::Compile(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            AppError::Validation(errors) => (
                status,
                Json(json!({ "message": "Validation failed", "errors": errors })),
            )
                .into_response(),
            AppError::RateLimited { reset_at_ms } => {
                let retry_after = DateTime::<Utc>::from_timestamp_millis(reset_at_ms)
                    .unwrap_or_else(Utc::now);
                let seconds = (retry_after - Utc::now()).num_seconds().max(0);
                let mut response = (
                    status,
                    Json(json!({
                        "message": "Rate limit exceeded",
                        "retryAfter": retry_after.to_rfc3339_opts(SecondsFormat::Millis, true),
                    })),
                )
                    .into_response();
                response
                    .headers_mut()
                    .insert(header::RETRY_AFTER, HeaderValue::from(seconds));
                response
            }
            AppError::Compile(e) => {
                error!(error = %e, "preview compile failed");
                (status, Json(json!({ "message": "Failed to compile preview" }))).into_response()
            }
            e if status == StatusCode::INTERNAL_SERVER_ERROR => {
                error!(error = %e, "request failed");
                (status, Json(json!({ "message": "Internal server error" }))).into_response()
            }
            e => (status, Json(json!({ "message": e.to_string() }))).into_response(),
        }
    }
}
