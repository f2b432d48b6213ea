use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header as JwtHeader,
    Validation,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::errors::AuthError;

/// The three token families. The kind is baked into the claims so a token
/// presented in the wrong slot can never pass as another family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Access,
    Refresh,
    VerifyEmail,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Access => "access",
            TokenKind::Refresh => "refresh",
            TokenKind::VerifyEmail => "verify_email",
        }
    }
}

/// Signed claims carried by every token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub kind: TokenKind,
    pub jti: Uuid,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn expires_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.exp, 0).single().unwrap_or_else(Utc::now)
    }
}

/// Lifetimes per token family.
#[derive(Debug, Clone, Copy)]
pub struct TokenTtls {
    pub access: Duration,
    pub refresh: Duration,
    pub verify_email: Duration,
}

impl TokenTtls {
    pub fn from_secs(access: u64, refresh: u64, verify_email: u64) -> Self {
        Self {
            access: Duration::seconds(access as i64),
            refresh: Duration::seconds(refresh as i64),
            verify_email: Duration::seconds(verify_email as i64),
        }
    }
}

impl Default for TokenTtls {
    fn default() -> Self {
        Self::from_secs(900, 14 * 24 * 3600, 24 * 3600)
    }
}

/// Why a presented token failed to parse. Expiry is distinguished so the
/// caller can report it separately from garbage or forgeries.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("token expired")]
    Expired,
    #[error("token invalid: {0}")]
    Invalid(String),
}

/// Stateless issue/parse of signed tokens (HS256). Revocation state lives
/// in the registry, not here.
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttls: TokenTtls,
}

impl TokenCodec {
    pub fn new(secret: &str, ttls: TokenTtls) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttls,
        }
    }

    fn ttl_for(&self, kind: TokenKind) -> Duration {
        match kind {
            TokenKind::Access => self.ttls.access,
            TokenKind::Refresh => self.ttls.refresh,
            TokenKind::VerifyEmail => self.ttls.verify_email,
        }
    }

    /// Issue a token of `kind` for `subject` with a fresh `jti`.
    pub fn issue(&self, kind: TokenKind, subject: Uuid) -> Result<(String, Claims), AuthError> {
        let now = Utc::now();
        let claims = Claims {
            sub: subject,
            kind,
            jti: Uuid::new_v4(),
            iat: now.timestamp(),
            exp: (now + self.ttl_for(kind)).timestamp(),
        };
        let token = encode(&JwtHeader::default(), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Token(e.to_string()))?;
        Ok((token, claims))
    }

    /// Verify signature and expiry (no leeway) and return the claims.
    pub fn parse(&self, raw: &str) -> Result<Claims, ParseError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        match decode::<Claims>(raw, &self.decoding_key, &validation) {
            Ok(data) => Ok(data.claims),
            Err(e) => match e.kind() {
                ErrorKind::ExpiredSignature => Err(ParseError::Expired),
                _ => Err(ParseError::Invalid(e.to_string())),
            },
        }
    }
}
