use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use uuid::Uuid;

use super::errors::AuthError;
use super::token::TokenKind;

/// Server-side state for revocable tokens (refresh and verify-email).
/// Access tokens are never recorded; they stay valid until expiry.
#[async_trait]
pub trait TokenRegistry: Send + Sync {
    /// Make `jti` known as active until `expires_at`.
    async fn record(
        &self,
        jti: Uuid,
        subject: Uuid,
        kind: TokenKind,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AuthError>;

    /// True while `jti` is recorded and unexpired.
    async fn is_active(&self, jti: Uuid) -> Result<bool, AuthError>;

    /// Retire `jti`. Returns true only if the entry existed and was still
    /// unexpired; under concurrent calls at most one caller sees true.
    async fn revoke(&self, jti: Uuid) -> Result<bool, AuthError>;

    /// Retire every recorded token of `kind` belonging to `subject`.
    /// Returns how many entries were dropped.
    async fn revoke_all_for_subject(
        &self,
        subject: Uuid,
        kind: TokenKind,
    ) -> Result<usize, AuthError>;
}

struct Entry {
    subject: Uuid,
    kind: TokenKind,
    expires_at: DateTime<Utc>,
}

/// Process-local registry over a concurrent map. The single-winner revoke
/// guarantee rides on `DashMap::remove` being atomic per key.
#[derive(Default)]
pub struct InMemoryTokenRegistry {
    entries: DashMap<Uuid, Entry>,
}

#[async_trait]
impl TokenRegistry for InMemoryTokenRegistry {
    async fn record(
        &self,
        jti: Uuid,
        subject: Uuid,
        kind: TokenKind,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AuthError> {
        self.entries.insert(jti, Entry { subject, kind, expires_at });
        Ok(())
    }

    async fn is_active(&self, jti: Uuid) -> Result<bool, AuthError> {
        // copy the deadline out before touching the map again; removing
        // while a read guard is held would deadlock
        let expires_at = self.entries.get(&jti).map(|e| e.expires_at);
        match expires_at {
            Some(exp) if exp > Utc::now() => Ok(true),
            Some(_) => {
                // lazy purge of the expired entry
                self.entries.remove(&jti);
                Ok(false)
            }
            None => Ok(false),
        }
    }

    async fn revoke(&self, jti: Uuid) -> Result<bool, AuthError> {
        match self.entries.remove(&jti) {
            Some((_, entry)) => Ok(entry.expires_at > Utc::now()),
            None => Ok(false),
        }
    }

    async fn revoke_all_for_subject(
        &self,
        subject: Uuid,
        kind: TokenKind,
    ) -> Result<usize, AuthError> {
        let mut revoked = 0usize;
        self.entries.retain(|_, entry| {
            if entry.subject == subject && entry.kind == kind {
                revoked += 1;
                false
            } else {
                true
            }
        });
        Ok(revoked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::sync::Arc;

    fn far_future() -> DateTime<Utc> {
        Utc::now() + Duration::hours(1)
    }

    #[tokio::test]
    async fn recorded_token_is_active_until_revoked() {
        let registry = InMemoryTokenRegistry::default();
        let jti = Uuid::new_v4();
        registry.record(jti, Uuid::new_v4(), TokenKind::Refresh, far_future()).await.unwrap();

        assert!(registry.is_active(jti).await.unwrap());
        assert!(registry.revoke(jti).await.unwrap());
        assert!(!registry.is_active(jti).await.unwrap());
        // second revoke is a no-op, not a win
        assert!(!registry.revoke(jti).await.unwrap());
    }

    #[tokio::test]
    async fn unknown_jti_is_inactive() {
        let registry = InMemoryTokenRegistry::default();
        let jti = Uuid::new_v4();
        assert!(!registry.is_active(jti).await.unwrap());
        assert!(!registry.revoke(jti).await.unwrap());
    }

    #[tokio::test]
    async fn expired_entry_counts_as_inactive() {
        let registry = InMemoryTokenRegistry::default();
        let jti = Uuid::new_v4();
        let past = Utc::now() - Duration::seconds(5);
        registry.record(jti, Uuid::new_v4(), TokenKind::Refresh, past).await.unwrap();

        assert!(!registry.is_active(jti).await.unwrap());
        // revoking an expired leftover must not report a win either
        registry.record(jti, Uuid::new_v4(), TokenKind::Refresh, past).await.unwrap();
        assert!(!registry.revoke(jti).await.unwrap());
    }

    #[tokio::test]
    async fn revoke_all_is_scoped_to_subject_and_kind() {
        let registry = InMemoryTokenRegistry::default();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        let refresh_a = Uuid::new_v4();
        let refresh_b = Uuid::new_v4();
        let verify_a = Uuid::new_v4();
        let refresh_bob = Uuid::new_v4();

        registry.record(refresh_a, alice, TokenKind::Refresh, far_future()).await.unwrap();
        registry.record(refresh_b, alice, TokenKind::Refresh, far_future()).await.unwrap();
        registry.record(verify_a, alice, TokenKind::VerifyEmail, far_future()).await.unwrap();
        registry.record(refresh_bob, bob, TokenKind::Refresh, far_future()).await.unwrap();

        let dropped = registry.revoke_all_for_subject(alice, TokenKind::Refresh).await.unwrap();
        assert_eq!(dropped, 2);
        assert!(!registry.is_active(refresh_a).await.unwrap());
        assert!(!registry.is_active(refresh_b).await.unwrap());
        assert!(registry.is_active(verify_a).await.unwrap());
        assert!(registry.is_active(refresh_bob).await.unwrap());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn concurrent_revoke_has_exactly_one_winner() {
        let registry = Arc::new(InMemoryTokenRegistry::default());
        let jti = Uuid::new_v4();
        registry.record(jti, Uuid::new_v4(), TokenKind::Refresh, far_future()).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..16 {
            let registry = registry.clone();
            handles.push(tokio::spawn(async move { registry.revoke(jti).await.unwrap() }));
        }

        let mut wins = 0;
        for handle in handles {
            if handle.await.unwrap() {
                wins += 1;
            }
        }
        assert_eq!(wins, 1);
    }
}
