use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Registration input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterInput {
    pub email: String,
    pub password: String,
}

/// Login input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

/// Domain account (business view). The password hash never leaves the
/// repository, so this type is safe to serialize into responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub email: String,
    pub verified: bool,
    pub created_at: DateTime<Utc>,
}

/// Login result: the account plus a fresh token pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSession {
    pub user: Account,
    pub access_token: String,
    pub refresh_token: String,
}

/// Token pair issued by a refresh rotation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Outcome of consuming a verification token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailVerification {
    Verified,
    AlreadyVerified,
}

/// Outcome of asking for a fresh verification mail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationResend {
    Sent,
    AlreadyVerified,
}
