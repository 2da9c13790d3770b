use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::db::StoreError;
use crate::response::ApiResponse;

pub const UNAUTHORIZED_ACCESS: &str = "Unauthorized access";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    /// Rejection of the bearer-token gate.
    #[error("{}", UNAUTHORIZED_ACCESS)]
    Unauthenticated,

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) | AppError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Store(StoreError::Duplicate(_)) => StatusCode::BAD_REQUEST,
            AppError::Store(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match self {
            AppError::Unauthenticated => (
                status,
                Json(serde_json::json!({ "message": UNAUTHORIZED_ACCESS })),
            )
                .into_response(),
            AppError::Store(StoreError::Database(ref e)) => {
                tracing::error!(error = %e, "database error");
                ApiResponse::empty(status, "Internal server error").into_response()
            }
            AppError::Internal(ref e) => {
                tracing::error!(error = %e, "internal error");
                ApiResponse::empty(status, "Internal server error").into_response()
            }
            other => ApiResponse::empty(status, other.to_string()).into_response(),
        }
    }
}
