// src/error/types.rs
use crate::domain::DomainError;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Pool error: {0}")]
    Pool(String),

    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The hosted backend rejected or failed a request
    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Resource not found")]
    NotFound,

    #[error("Authentication required")]
    Unauthenticated,

    #[error("Not allowed for the current user")]
    Forbidden,

    #[error("Other error: {0}")]
    Other(String),
}

impl AppError {
    /// Shorthand for input validation failures
    pub fn invalid(message: impl Into<String>) -> Self {
        AppError::Domain(DomainError::InvariantViolation(message.into()))
    }
}

impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl From<uuid::Error> for AppError {
    fn from(err: uuid::Error) -> Self {
        AppError::Other(format!("UUID error: {}", err))
    }
}

impl From<chrono::ParseError> for AppError {
    fn from(err: chrono::ParseError) -> Self {
        AppError::Other(format!("Date parse error: {}", err))
    }
}

impl From<r2d2::Error> for AppError {
    fn from(err: r2d2::Error) -> Self {
        AppError::Pool(err.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Backend(format!("request failed: {}", err))
    }
}

pub type AppResult<T> = Result<T, AppError>;
