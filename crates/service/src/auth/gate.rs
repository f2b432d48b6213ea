use std::sync::Arc;

use tracing::warn;
use uuid::Uuid;

use super::errors::AuthError;
use super::registry::TokenRegistry;
use super::token::{Claims, ParseError, TokenCodec, TokenKind};

/// Slot names used in rejection logs.
const BEARER_SLOT: &str = "authorization";
const REFRESH_SLOT: &str = "x-refresh-token";

/// What a route demands before its handler may run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthRequirement {
    None,
    AccessToken,
    RefreshToken,
    AccessAndRefreshToken,
    VerifyEmailToken,
}

/// Why a presented token was turned away. Only logged server-side; clients
/// always get the same generic unauthorized answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    Missing,
    Malformed,
    Expired,
    Revoked,
}

impl RejectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectReason::Missing => "missing",
            RejectReason::Malformed => "malformed",
            RejectReason::Expired => "expired",
            RejectReason::Revoked => "revoked",
        }
    }
}

/// Raw credentials as pulled off a request, before any checking.
#[derive(Debug, Clone, Default)]
pub struct Presented {
    pub bearer: Option<String>,
    pub refresh: Option<String>,
}

/// Verified caller identity handed to the handler once the gate passes.
#[derive(Debug, Clone, Copy)]
pub struct AuthContext {
    pub subject: Uuid,
    pub refresh_jti: Option<Uuid>,
    pub verify_jti: Option<Uuid>,
}

/// Enforces an [`AuthRequirement`] against presented credentials. Signature
/// and expiry come from the codec; revocation state from the registry.
pub struct AuthGate {
    codec: TokenCodec,
    registry: Arc<dyn TokenRegistry>,
}

impl AuthGate {
    pub fn new(codec: TokenCodec, registry: Arc<dyn TokenRegistry>) -> Self {
        Self { codec, registry }
    }

    /// Check `presented` against `requirement`. `Ok(None)` only for
    /// [`AuthRequirement::None`]; any failed check is a generic
    /// [`AuthError::Unauthorized`] with the real reason logged.
    pub async fn authorize(
        &self,
        requirement: AuthRequirement,
        presented: &Presented,
    ) -> Result<Option<AuthContext>, AuthError> {
        match requirement {
            AuthRequirement::None => Ok(None),
            AuthRequirement::AccessToken => {
                let claims =
                    self.check(TokenKind::Access, presented.bearer.as_deref(), BEARER_SLOT).await?;
                Ok(Some(AuthContext { subject: claims.sub, refresh_jti: None, verify_jti: None }))
            }
            AuthRequirement::RefreshToken => {
                let claims = self
                    .check(TokenKind::Refresh, presented.refresh.as_deref(), REFRESH_SLOT)
                    .await?;
                Ok(Some(AuthContext {
                    subject: claims.sub,
                    refresh_jti: Some(claims.jti),
                    verify_jti: None,
                }))
            }
            AuthRequirement::AccessAndRefreshToken => {
                let access =
                    self.check(TokenKind::Access, presented.bearer.as_deref(), BEARER_SLOT).await?;
                let refresh = self
                    .check(TokenKind::Refresh, presented.refresh.as_deref(), REFRESH_SLOT)
                    .await?;
                // a pair stitched together from two different accounts is
                // not a session
                if access.sub != refresh.sub {
                    return Err(reject(REFRESH_SLOT, RejectReason::Malformed));
                }
                Ok(Some(AuthContext {
                    subject: access.sub,
                    refresh_jti: Some(refresh.jti),
                    verify_jti: None,
                }))
            }
            AuthRequirement::VerifyEmailToken => {
                let claims = self
                    .check(TokenKind::VerifyEmail, presented.bearer.as_deref(), BEARER_SLOT)
                    .await?;
                Ok(Some(AuthContext {
                    subject: claims.sub,
                    refresh_jti: None,
                    verify_jti: Some(claims.jti),
                }))
            }
        }
    }

    async fn check(
        &self,
        kind: TokenKind,
        raw: Option<&str>,
        slot: &'static str,
    ) -> Result<Claims, AuthError> {
        let Some(raw) = raw else {
            return Err(reject(slot, RejectReason::Missing));
        };
        let claims = match self.codec.parse(raw) {
            Ok(claims) => claims,
            Err(ParseError::Expired) => return Err(reject(slot, RejectReason::Expired)),
            Err(ParseError::Invalid(_)) => return Err(reject(slot, RejectReason::Malformed)),
        };
        if claims.kind != kind {
            return Err(reject(slot, RejectReason::Malformed));
        }
        // access tokens are unrecorded and valid until expiry; everything
        // else must still be active in the registry
        if kind != TokenKind::Access && !self.registry.is_active(claims.jti).await? {
            return Err(reject(slot, RejectReason::Revoked));
        }
        Ok(claims)
    }
}

fn reject(slot: &'static str, reason: RejectReason) -> AuthError {
    warn!(slot, reason = reason.as_str(), "token rejected");
    AuthError::Unauthorized
}
