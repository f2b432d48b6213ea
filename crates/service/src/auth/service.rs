use std::sync::Arc;

use argon2::{
    password_hash::{PasswordHasher, PasswordVerifier, SaltString},
    Argon2, PasswordHash,
};
use rand::rngs::OsRng;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::domain::{
    Account, AuthSession, EmailVerification, LoginInput, RegisterInput, TokenPair,
    VerificationResend,
};
use super::errors::AuthError;
use super::mailer::EmailDispatcher;
use super::registry::TokenRegistry;
use super::repository::AccountRepository;
use super::token::{TokenCodec, TokenKind};
use super::validate;

/// Account service configuration
#[derive(Clone)]
pub struct AuthConfig {
    /// Retire every refresh token of the subject on logout, not just the
    /// one presented.
    pub logout_revokes_all: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self { logout_revokes_all: true }
    }
}

/// Account business service independent of web framework
pub struct AccountService<R: AccountRepository> {
    repo: Arc<R>,
    registry: Arc<dyn TokenRegistry>,
    codec: TokenCodec,
    mailer: Arc<dyn EmailDispatcher>,
    cfg: AuthConfig,
}

impl<R: AccountRepository> AccountService<R> {
    pub fn new(
        repo: Arc<R>,
        registry: Arc<dyn TokenRegistry>,
        codec: TokenCodec,
        mailer: Arc<dyn EmailDispatcher>,
        cfg: AuthConfig,
    ) -> Self {
        Self { repo, registry, codec, mailer, cfg }
    }

    pub async fn find_all(&self) -> Result<Vec<Account>, AuthError> {
        self.repo.list().await
    }

    /// Register a new account, hash its password, and send the first
    /// verification mail.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    /// use service::auth::domain::RegisterInput;
    /// use service::auth::mailer::mock::RecordingDispatcher;
    /// use service::auth::registry::InMemoryTokenRegistry;
    /// use service::auth::repository::memory::InMemoryAccountRepository;
    /// use service::auth::service::{AccountService, AuthConfig};
    /// use service::auth::token::{TokenCodec, TokenTtls};
    /// let svc = AccountService::new(
    ///     Arc::new(InMemoryAccountRepository::default()),
    ///     Arc::new(InMemoryTokenRegistry::default()),
    ///     TokenCodec::new("secret", TokenTtls::default()),
    ///     Arc::new(RecordingDispatcher::default()),
    ///     AuthConfig::default(),
    /// );
    /// let input = RegisterInput { email: "user@example.com".into(), password: "Secret123".into() };
    /// let account = tokio_test::block_on(svc.register(input)).unwrap();
    /// assert_eq!(account.email, "user@example.com");
    /// assert!(!account.verified);
    /// ```
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn register(&self, input: RegisterInput) -> Result<Account, AuthError> {
        validate::register_input(&input)?;
        let email = validate::normalize_email(&input.email);
        if let Some(existing) = self.repo.find_by_email(&email).await? {
            debug!("email taken: {}", existing.email);
            return Err(AuthError::DuplicateEmail);
        }

        let hash = hash_password(&input.password)?;
        let account = self.repo.create(&email, &hash).await?;
        // the account exists even if this mail bounces; the caller sees the
        // outage and the resend endpoint recovers
        self.issue_verification(&account).await?;
        info!(user_id = %account.id, email = %account.email, "account_registered");
        Ok(account)
    }

    /// Authenticate and open a session (access plus refresh token).
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    /// use service::auth::domain::{LoginInput, RegisterInput};
    /// use service::auth::mailer::mock::RecordingDispatcher;
    /// use service::auth::registry::InMemoryTokenRegistry;
    /// use service::auth::repository::memory::InMemoryAccountRepository;
    /// use service::auth::service::{AccountService, AuthConfig};
    /// use service::auth::token::{TokenCodec, TokenTtls};
    /// let svc = AccountService::new(
    ///     Arc::new(InMemoryAccountRepository::default()),
    ///     Arc::new(InMemoryTokenRegistry::default()),
    ///     TokenCodec::new("secret", TokenTtls::default()),
    ///     Arc::new(RecordingDispatcher::default()),
    ///     AuthConfig::default(),
    /// );
    /// let _ = tokio_test::block_on(svc.register(RegisterInput { email: "u@e.com".into(), password: "Passw0rd".into() }));
    /// let session = tokio_test::block_on(svc.login(LoginInput { email: "u@e.com".into(), password: "Passw0rd".into() })).unwrap();
    /// assert_eq!(session.user.email, "u@e.com");
    /// assert!(!session.access_token.is_empty());
    /// assert!(!session.refresh_token.is_empty());
    /// ```
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn login(&self, input: LoginInput) -> Result<AuthSession, AuthError> {
        validate::login_input(&input)?;
        let email = validate::normalize_email(&input.email);

        // unknown email and wrong password take the same exit so the
        // response never says which one it was
        let user = self
            .repo
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;
        let stored = self
            .repo
            .password_hash(user.id)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;
        verify_password(&input.password, &stored)?;

        let pair = self.issue_session(user.id).await?;
        info!(user_id = %user.id, "login_succeeded");
        Ok(AuthSession {
            user,
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
        })
    }

    /// Trade a live refresh token for a fresh pair. The presented token is
    /// retired first, so of any concurrent calls with the same token
    /// exactly one wins and the rest are unauthorized.
    #[instrument(skip(self))]
    pub async fn refresh(&self, subject: Uuid, refresh_jti: Uuid) -> Result<TokenPair, AuthError> {
        if !self.registry.revoke(refresh_jti).await? {
            warn!(%subject, "refresh with retired token");
            return Err(AuthError::Unauthorized);
        }
        let pair = self.issue_session(subject).await?;
        info!(%subject, "session_refreshed");
        Ok(pair)
    }

    /// Close the session. Always succeeds for an authenticated caller,
    /// even if the token was already retired.
    #[instrument(skip(self))]
    pub async fn logout(&self, subject: Uuid, refresh_jti: Uuid) -> Result<(), AuthError> {
        self.registry.revoke(refresh_jti).await?;
        if self.cfg.logout_revokes_all {
            let dropped =
                self.registry.revoke_all_for_subject(subject, TokenKind::Refresh).await?;
            debug!(%subject, dropped, "retired remaining sessions");
        }
        info!(%subject, "logged_out");
        Ok(())
    }

    /// Consume a verification token and mark the account verified. The
    /// token is retired before the account is touched, so a replay loses
    /// even when two calls overlap.
    #[instrument(skip(self))]
    pub async fn verify_email(
        &self,
        subject: Uuid,
        verify_jti: Uuid,
    ) -> Result<EmailVerification, AuthError> {
        if !self.registry.revoke(verify_jti).await? {
            warn!(%subject, "verify with retired token");
            return Err(AuthError::Unauthorized);
        }
        if self.repo.find_by_id(subject).await?.is_none() {
            return Err(AuthError::Unauthorized);
        }
        if self.repo.set_verified(subject).await? {
            info!(%subject, "email_verified");
            Ok(EmailVerification::Verified)
        } else {
            Ok(EmailVerification::AlreadyVerified)
        }
    }

    /// Send a fresh verification mail to an authenticated subject.
    #[instrument(skip(self))]
    pub async fn resend_verify_email(&self, subject: Uuid) -> Result<VerificationResend, AuthError> {
        let account = self.repo.find_by_id(subject).await?.ok_or(AuthError::Unauthorized)?;
        self.resend_for_account(account).await
    }

    /// Send a fresh verification mail by address. Unknown addresses get the
    /// same answer as known ones so this cannot be used to probe which
    /// emails are registered.
    #[instrument(skip(self, email))]
    pub async fn resend_verify_email_by_email(
        &self,
        email: &str,
    ) -> Result<VerificationResend, AuthError> {
        let email = validate::normalize_email(email);
        match self.repo.find_by_email(&email).await? {
            Some(account) => self.resend_for_account(account).await,
            None => {
                debug!("resend requested for unknown email");
                Ok(VerificationResend::Sent)
            }
        }
    }

    async fn resend_for_account(&self, account: Account) -> Result<VerificationResend, AuthError> {
        if account.verified {
            return Ok(VerificationResend::AlreadyVerified);
        }
        // a resend invalidates every outstanding verification token
        self.registry.revoke_all_for_subject(account.id, TokenKind::VerifyEmail).await?;
        self.issue_verification(&account).await?;
        info!(user_id = %account.id, "verification_resent");
        Ok(VerificationResend::Sent)
    }

    async fn issue_verification(&self, account: &Account) -> Result<(), AuthError> {
        let (token, claims) = self.codec.issue(TokenKind::VerifyEmail, account.id)?;
        self.registry
            .record(claims.jti, account.id, TokenKind::VerifyEmail, claims.expires_at())
            .await?;
        self.mailer.send_verification_email(&account.email, &token).await?;
        Ok(())
    }

    async fn issue_session(&self, subject: Uuid) -> Result<TokenPair, AuthError> {
        let (access_token, _) = self.codec.issue(TokenKind::Access, subject)?;
        let (refresh_token, refresh) = self.codec.issue(TokenKind::Refresh, subject)?;
        // recorded before the caller ever sees it, so the pair is usable
        // the moment it is returned
        self.registry
            .record(refresh.jti, subject, TokenKind::Refresh, refresh.expires_at())
            .await?;
        Ok(TokenPair { access_token, refresh_token })
    }
}

fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AuthError::Hash(e.to_string()))?
        .to_string())
}

fn verify_password(password: &str, stored_hash: &str) -> Result<(), AuthError> {
    let parsed = PasswordHash::new(stored_hash).map_err(|e| AuthError::Hash(e.to_string()))?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .map_err(|_| AuthError::InvalidCredentials)
}
