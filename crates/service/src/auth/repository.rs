use async_trait::async_trait;
use uuid::Uuid;

use super::domain::Account;
use super::errors::AuthError;

/// Repository abstraction for account persistence. Emails are stored and
/// looked up in normalized (trimmed, lowercased) form; callers normalize
/// before reaching the repository.
#[async_trait]
pub trait AccountRepository: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AuthError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, AuthError>;

    /// Create an unverified account. Fails with [`AuthError::DuplicateEmail`]
    /// when the email is already taken, including under concurrent creates.
    async fn create(&self, email: &str, password_hash: &str) -> Result<Account, AuthError>;

    async fn password_hash(&self, id: Uuid) -> Result<Option<String>, AuthError>;

    /// Flip the verified flag. Returns false when the account is missing or
    /// was already verified.
    async fn set_verified(&self, id: Uuid) -> Result<bool, AuthError>;

    async fn list(&self) -> Result<Vec<Account>, AuthError>;
}

/// In-memory store for single-node runs, tests, and doc examples.
pub mod memory {
    use super::*;
    use chrono::Utc;
    use std::collections::HashMap;
    use tokio::sync::RwLock;

    struct StoredAccount {
        account: Account,
        password_hash: String,
    }

    #[derive(Default)]
    struct Inner {
        by_email: HashMap<String, Uuid>,
        accounts: HashMap<Uuid, StoredAccount>,
    }

    #[derive(Default)]
    pub struct InMemoryAccountRepository {
        inner: RwLock<Inner>,
    }

    #[async_trait]
    impl AccountRepository for InMemoryAccountRepository {
        async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AuthError> {
            let inner = self.inner.read().await;
            Ok(inner
                .by_email
                .get(email)
                .and_then(|id| inner.accounts.get(id))
                .map(|stored| stored.account.clone()))
        }

        async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, AuthError> {
            let inner = self.inner.read().await;
            Ok(inner.accounts.get(&id).map(|stored| stored.account.clone()))
        }

        async fn create(&self, email: &str, password_hash: &str) -> Result<Account, AuthError> {
            // the write lock spans duplicate check and insert, so a racing
            // create cannot slip between them
            let mut inner = self.inner.write().await;
            if inner.by_email.contains_key(email) {
                return Err(AuthError::DuplicateEmail);
            }
            let account = Account {
                id: Uuid::new_v4(),
                email: email.to_string(),
                verified: false,
                created_at: Utc::now(),
            };
            inner.by_email.insert(email.to_string(), account.id);
            inner.accounts.insert(
                account.id,
                StoredAccount { account: account.clone(), password_hash: password_hash.to_string() },
            );
            Ok(account)
        }

        async fn password_hash(&self, id: Uuid) -> Result<Option<String>, AuthError> {
            let inner = self.inner.read().await;
            Ok(inner.accounts.get(&id).map(|stored| stored.password_hash.clone()))
        }

        async fn set_verified(&self, id: Uuid) -> Result<bool, AuthError> {
            let mut inner = self.inner.write().await;
            match inner.accounts.get_mut(&id) {
                Some(stored) if !stored.account.verified => {
                    stored.account.verified = true;
                    Ok(true)
                }
                _ => Ok(false),
            }
        }

        async fn list(&self) -> Result<Vec<Account>, AuthError> {
            let inner = self.inner.read().await;
            let mut accounts: Vec<Account> =
                inner.accounts.values().map(|stored| stored.account.clone()).collect();
            accounts.sort_by_key(|a| (a.created_at, a.id));
            Ok(accounts)
        }
    }
}
