use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::errors::AppError;

// Set once from configuration at startup. When enabled, storage/internal
// error text is returned to clients instead of a generic message.
static EXPOSE_INTERNAL_ERRORS: AtomicBool = AtomicBool::new(false);

pub fn expose_internal_errors(enabled: bool) {
    EXPOSE_INTERNAL_ERRORS.store(enabled, Ordering::Relaxed);
}

// The IntoResponse trait implementation converts AppError into a JSON error
// envelope: {"success": false, "error": <category>, "detail": <message>}.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, detail) = match &self {
            AppError::InvalidInput(msg) => {
                (StatusCode::BAD_REQUEST, "Invalid Input", msg.clone())
            }

            AppError::Unauthenticated(msg) => {
                (StatusCode::UNAUTHORIZED, "Unauthorized", msg.clone())
            }

            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, "Forbidden", msg.clone()),

            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "Not Found", msg.clone()),

            AppError::QuotaExceeded { .. } => {
                (StatusCode::BAD_REQUEST, "Quota Exceeded", self.to_string())
            }

            AppError::Validation(msg) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "Validation Error", msg.clone())
            }

            // Database errors are internal server errors; the underlying
            // message is logged but hidden from clients outside debug mode.
            AppError::Storage(err) => {
                tracing::error!("Database error: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database Error",
                    internal_detail(
                        &err.to_string(),
                        "An error occurred while processing your request",
                    ),
                )
            }

            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error",
                    internal_detail(msg, "An unexpected error occurred"),
                )
            }
        };

        let body = Json(json!({
            "success": false,
            "error": error,
            "detail": detail,
        }));

        (status, body).into_response()
    }
}

fn internal_detail(real: &str, generic: &str) -> String {
    if EXPOSE_INTERNAL_ERRORS.load(Ordering::Relaxed) {
        real.to_string()
    } else {
        generic.to_string()
    }
}
