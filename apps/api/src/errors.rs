use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::analysis::AnalysisError;

/// Status category reported to callers. Every failure maps to exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureCategory {
    Unauthorized,
    BadInput,
    PayloadTooLarge,
    QuotaExceeded,
    UpstreamRateLimited,
    UpstreamFailure,
    InternalError,
}

impl FailureCategory {
    pub fn status(self) -> StatusCode {
        match self {
            FailureCategory::Unauthorized => StatusCode::UNAUTHORIZED,
            FailureCategory::BadInput => StatusCode::BAD_REQUEST,
            FailureCategory::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            FailureCategory::QuotaExceeded => StatusCode::FORBIDDEN,
            FailureCategory::UpstreamRateLimited => StatusCode::TOO_MANY_REQUESTS,
            FailureCategory::UpstreamFailure => StatusCode::BAD_GATEWAY,
            FailureCategory::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            FailureCategory::Unauthorized => "UNAUTHORIZED",
            FailureCategory::BadInput => "BAD_INPUT",
            FailureCategory::PayloadTooLarge => "PAYLOAD_TOO_LARGE",
            FailureCategory::QuotaExceeded => "QUOTA_EXCEEDED",
            FailureCategory::UpstreamRateLimited => "UPSTREAM_RATE_LIMITED",
            FailureCategory::UpstreamFailure => "UPSTREAM_FAILURE",
            FailureCategory::InternalError => "INTERNAL_ERROR",
        }
    }
}

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn category(&self) -> FailureCategory {
        match self {
            AppError::Analysis(e) => e.category(),
            AppError::Internal(_) => FailureCategory::InternalError,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let category = self.category();

        let message = match &self {
            AppError::Analysis(e) => {
                match category {
                    FailureCategory::UpstreamFailure | FailureCategory::InternalError => {
                        tracing::error!("Analysis failed: {e}");
                    }
                    FailureCategory::UpstreamRateLimited => {
                        tracing::warn!("Analysis rejected upstream: {e}");
                    }
                    _ => {}
                }
                e.user_message().to_string()
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                "An unexpected error occurred. Please try again.".to_string()
            }
        };

        let body = if category == FailureCategory::QuotaExceeded {
            json!({
                "error": {
                    "code": category.code(),
                    "message": message,
                    "upgrade_required": true
                }
            })
        } else {
            json!({
                "error": {
                    "code": category.code(),
                    "message": message
                }
            })
        };

        (category.status(), Json(body)).into_response()
    }
}
