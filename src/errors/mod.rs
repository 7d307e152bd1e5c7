// Custom error type and result alias for the whole service, using thiserror.
use thiserror::Error;

pub mod response;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    Unauthenticated(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Insufficient quota. You have {available} clothes remaining, but requested {requested}")]
    QuotaExceeded { available: i64, requested: i64 },

    #[error("{0}")]
    Validation(String),

    // The #[from] attribute converts sqlx errors into AppError::Storage via the From trait.
    #[error("Database error: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("{0}")]
    Internal(String),
}

impl From<bcrypt::BcryptError> for AppError {
    fn from(err: bcrypt::BcryptError) -> Self {
        AppError::Internal(format!("Password hashing failed: {}", err))
    }
}

// Custom result type
pub type AppResult<T> = Result<T, AppError>;
