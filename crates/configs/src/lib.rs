use anyhow::anyhow;
use anyhow::Result;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub email: EmailConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub worker_threads: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".into(), port: 8080, worker_threads: Some(4) }
    }
}

/// Token lifecycle settings. TTLs are seconds; the secret may also arrive
/// through the `JWT_SECRET` environment variable.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub jwt_secret: String,
    #[serde(default = "default_access_ttl")]
    pub access_ttl_secs: u64,
    #[serde(default = "default_refresh_ttl")]
    pub refresh_ttl_secs: u64,
    #[serde(default = "default_verify_email_ttl")]
    pub verify_email_ttl_secs: u64,
    #[serde(default = "default_logout_revokes_all")]
    pub logout_revokes_all: bool,
    #[serde(default)]
    pub resend_requires_auth: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            access_ttl_secs: default_access_ttl(),
            refresh_ttl_secs: default_refresh_ttl(),
            verify_email_ttl_secs: default_verify_email_ttl(),
            logout_revokes_all: default_logout_revokes_all(),
            resend_requires_auth: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct EmailConfig {
    /// HTTP relay that actually delivers mail; log-only dispatch when unset.
    #[serde(default)]
    pub relay_url: Option<String>,
    #[serde(default = "default_from_address")]
    pub from_address: String,
}

fn default_access_ttl() -> u64 { 900 }
fn default_refresh_ttl() -> u64 { 14 * 24 * 3600 }
fn default_verify_email_ttl() -> u64 { 24 * 3600 }
fn default_logout_revokes_all() -> bool { true }
fn default_from_address() -> String { "no-reply@localhost".into() }

pub fn load_default() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    load_from_file(&path)
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    let cfg: AppConfig = toml::from_str(&content)?;
    Ok(cfg)
}

impl AppConfig {
    pub fn load_and_validate() -> Result<Self> {
        let mut cfg = load_default()?;
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.server.normalize()?;
        self.auth.normalize_from_env();
        self.auth.validate()?;
        self.email.normalize_from_env();
        self.email.validate()?;
        Ok(())
    }
}

impl ServerConfig {
    fn normalize(&mut self) -> Result<()> {
        if self.host.trim().is_empty() {
            self.host = "127.0.0.1".to_string();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port must be in 1..=65535"));
        }
        if let Some(w) = self.worker_threads {
            if w == 0 { self.worker_threads = Some(4); }
        } else {
            self.worker_threads = Some(4);
        }
        Ok(())
    }
}

impl AuthConfig {
    pub fn normalize_from_env(&mut self) {
        // TOML wins; the environment fills the gap
        if self.jwt_secret.trim().is_empty() {
            if let Ok(secret) = std::env::var("JWT_SECRET") {
                self.jwt_secret = secret;
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.access_ttl_secs == 0 || self.refresh_ttl_secs == 0 || self.verify_email_ttl_secs == 0 {
            return Err(anyhow!("auth TTLs must be positive seconds"));
        }
        if self.refresh_ttl_secs <= self.access_ttl_secs {
            return Err(anyhow!("auth.refresh_ttl_secs must exceed auth.access_ttl_secs"));
        }
        Ok(())
    }
}

impl EmailConfig {
    pub fn normalize_from_env(&mut self) {
        if self.relay_url.is_none() {
            if let Ok(url) = std::env::var("EMAIL_RELAY_URL") {
                if !url.trim().is_empty() {
                    self.relay_url = Some(url);
                }
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(url) = &self.relay_url {
            let lower = url.to_lowercase();
            if !(lower.starts_with("http://") || lower.starts_with("https://")) {
                return Err(anyhow!("email.relay_url must start with http:// or https://"));
            }
        }
        if self.from_address.trim().is_empty() || !self.from_address.contains('@') {
            return Err(anyhow!("email.from_address must be an email address"));
        }
        Ok(())
    }
}
