use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::db::DatabaseError;
use crate::modules::scheduling::error::SchedulingError;
use crate::modules::scheduling::verification::VerificationError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Scheduling(#[from] SchedulingError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// Every failure kind keeps a distinct machine-readable code; clients
    /// pick their retry strategy from it (an expired code needs a new
    /// request, a mismatch just needs retyping, a lost slot race needs a
    /// fresh slot listing).
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Scheduling(err) => match err {
                SchedulingError::Validation(_) => (StatusCode::BAD_REQUEST, "INVALID_ARGUMENT"),
                SchedulingError::ServiceNotFound => (StatusCode::NOT_FOUND, "SERVICE_NOT_FOUND"),
                SchedulingError::BookingNotFound => (StatusCode::NOT_FOUND, "BOOKING_NOT_FOUND"),
                SchedulingError::SlotUnavailable => (StatusCode::CONFLICT, "SLOT_UNAVAILABLE"),
                SchedulingError::InvalidTransition => {
                    (StatusCode::CONFLICT, "INVALID_TRANSITION")
                }
                SchedulingError::Verification(inner) => match inner {
                    VerificationError::NotFound => (StatusCode::NOT_FOUND, "CODE_NOT_FOUND"),
                    VerificationError::Expired => (StatusCode::GONE, "CODE_EXPIRED"),
                    VerificationError::Mismatch => (StatusCode::BAD_REQUEST, "CODE_MISMATCH"),
                    VerificationError::AlreadyConsumed => {
                        (StatusCode::CONFLICT, "CODE_ALREADY_CONSUMED")
                    }
                },
                SchedulingError::Database(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_ERROR")
                }
            },
            AppError::Database(err) => match err {
                DatabaseError::NotFound => (StatusCode::NOT_FOUND, "NOT_FOUND"),
                DatabaseError::Duplicate => (StatusCode::CONFLICT, "DUPLICATE"),
                DatabaseError::InvalidInput(_) => (StatusCode::BAD_REQUEST, "INVALID_INPUT"),
                DatabaseError::Sqlx(_) => (StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_ERROR"),
            },
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "INVALID_ARGUMENT"),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let body = Json(json!({
            "error": {
                "code": code,
                "message": self.to_string(),
            }
        }));

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
