use serde::Serialize;
use thiserror::Error;

/// One failed field check, reported back to the caller verbatim.
#[derive(Debug, Clone, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self { field, message: message.into() }
    }
}

/// Business errors for account and token workflows
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("validation failed")]
    Validation(Vec<FieldError>),
    #[error("email already registered")]
    DuplicateEmail,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("unauthorized")]
    Unauthorized,
    #[error("hashing error: {0}")]
    Hash(String),
    #[error("token error: {0}")]
    Token(String),
    #[error("dependency unavailable: {0}")]
    Unavailable(String),
}

impl AuthError {
    /// Stable numeric code for external mapping/logging
    pub fn code(&self) -> u16 {
        match self {
            AuthError::Validation(_) => 1001,
            AuthError::DuplicateEmail => 1002,
            AuthError::InvalidCredentials => 1003,
            AuthError::Unauthorized => 1004,
            AuthError::Hash(_) => 1101,
            AuthError::Token(_) => 1102,
            AuthError::Unavailable(_) => 1200,
        }
    }

    /// Short machine-readable reason, safe to put on the wire.
    pub fn reason(&self) -> &'static str {
        match self {
            AuthError::Validation(_) => "validation_failed",
            AuthError::DuplicateEmail => "duplicate_email",
            AuthError::InvalidCredentials => "invalid_credentials",
            AuthError::Unauthorized => "unauthorized",
            AuthError::Hash(_) | AuthError::Token(_) | AuthError::Unavailable(_) => {
                "service_unavailable"
            }
        }
    }
}
