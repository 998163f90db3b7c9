// Error taxonomy for the timesheet service, built on thiserror.
use thiserror::Error;

pub mod auth;
pub mod network;
pub mod response;
pub mod sync;

pub use auth::AuthError;
pub use network::{NetworkError, NetworkResult};
pub use sync::SyncError;

/// A single form field that failed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    Auth(#[from] AuthError),

    #[error("{0}")]
    Network(#[from] NetworkError),

    #[error("{0}")]
    Sync(#[from] SyncError),

    #[error("Validation failed: {}", join_field_errors(.0))]
    Validation(Vec<FieldError>),

    #[error("Session error: {0}")]
    Session(String),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("File error: {0}")]
    File(#[from] std::io::Error),

    #[error("Access denied for this role")]
    Forbidden,
}

impl From<tower_sessions::session::Error> for AppError {
    fn from(err: tower_sessions::session::Error) -> Self {
        AppError::Session(err.to_string())
    }
}

fn join_field_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join(", ")
}

// Custom result type
pub type AppResult<T> = Result<T, AppError>;
