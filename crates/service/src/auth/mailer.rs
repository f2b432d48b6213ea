use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, info};

use super::errors::AuthError;

/// Outbound verification mail. Implementations must treat delivery failure
/// as an error so callers can surface the outage instead of losing mail.
#[async_trait]
pub trait EmailDispatcher: Send + Sync {
    async fn send_verification_email(&self, to: &str, token: &str) -> Result<(), AuthError>;
}

/// Logs instead of delivering. Default when no relay is configured.
pub struct LogEmailDispatcher;

#[async_trait]
impl EmailDispatcher for LogEmailDispatcher {
    async fn send_verification_email(&self, to: &str, token: &str) -> Result<(), AuthError> {
        info!(to = %to, "verification email (log only)");
        debug!(token = %token, "verification token");
        Ok(())
    }
}

/// Posts the message to an HTTP relay that performs the actual delivery.
pub struct HttpEmailDispatcher {
    client: reqwest::Client,
    relay_url: String,
    from: String,
}

impl HttpEmailDispatcher {
    pub fn new(relay_url: impl Into<String>, from: impl Into<String>) -> Self {
        Self { client: reqwest::Client::new(), relay_url: relay_url.into(), from: from.into() }
    }
}

#[async_trait]
impl EmailDispatcher for HttpEmailDispatcher {
    async fn send_verification_email(&self, to: &str, token: &str) -> Result<(), AuthError> {
        let payload = json!({
            "from": self.from,
            "to": to,
            "subject": "Verify your email",
            "token": token,
        });
        let resp = self
            .client
            .post(&self.relay_url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| AuthError::Unavailable(format!("email relay: {e}")))?;
        if !resp.status().is_success() {
            return Err(AuthError::Unavailable(format!(
                "email relay returned {}",
                resp.status()
            )));
        }
        Ok(())
    }
}

/// Dispatchers for tests and doc examples
pub mod mock {
    use super::*;
    use std::sync::Mutex;

    /// Captures outgoing mail so tests can pull the verification token.
    #[derive(Default)]
    pub struct RecordingDispatcher {
        sent: Mutex<Vec<(String, String)>>,
    }

    impl RecordingDispatcher {
        pub fn sent_count(&self) -> usize {
            self.sent.lock().unwrap().len()
        }

        pub fn last_token(&self) -> Option<String> {
            self.sent.lock().unwrap().last().map(|(_, token)| token.clone())
        }

        pub fn last_recipient(&self) -> Option<String> {
            self.sent.lock().unwrap().last().map(|(to, _)| to.clone())
        }
    }

    #[async_trait]
    impl EmailDispatcher for RecordingDispatcher {
        async fn send_verification_email(&self, to: &str, token: &str) -> Result<(), AuthError> {
            self.sent.lock().unwrap().push((to.to_string(), token.to_string()));
            Ok(())
        }
    }

    /// Always fails, simulating a relay outage.
    #[derive(Default)]
    pub struct FailingDispatcher;

    #[async_trait]
    impl EmailDispatcher for FailingDispatcher {
        async fn send_verification_email(&self, _to: &str, _token: &str) -> Result<(), AuthError> {
            Err(AuthError::Unavailable("email relay down".into()))
        }
    }
}
