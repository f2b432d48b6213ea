use std::{env, net::SocketAddr, sync::Arc};

use axum::Router;
use common::utils::logging::init_logging_default;
use dotenvy::dotenv;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use service::auth::gate::AuthGate;
use service::auth::mailer::{EmailDispatcher, HttpEmailDispatcher, LogEmailDispatcher};
use service::auth::registry::InMemoryTokenRegistry;
use service::auth::repository::memory::InMemoryAccountRepository;
use service::auth::service::AuthConfig;
use service::auth::token::{TokenCodec, TokenTtls};
use service::auth::AccountService;

use crate::routes::{self, users::ServerState};

/// Initialize logging via shared common utils
fn init_logging() {
    init_logging_default();
}

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

/// Load the application config, falling back to defaults plus environment
/// overrides when no config file is present.
fn load_config() -> anyhow::Result<configs::AppConfig> {
    match configs::load_default() {
        Ok(mut cfg) => {
            cfg.normalize_and_validate()?;
            Ok(cfg)
        }
        Err(e) => {
            warn!(error = %e, "config file not loaded, using defaults with env overrides");
            let mut cfg = configs::AppConfig::default();
            cfg.normalize_and_validate()?;
            Ok(cfg)
        }
    }
}

/// Host/port from config, with env vars taking precedence
fn load_bind_addr(server: &configs::ServerConfig) -> anyhow::Result<SocketAddr> {
    let host = env::var("SERVER_HOST").unwrap_or_else(|_| server.host.clone());
    let port = env::var("SERVER_PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(server.port);
    Ok(format!("{}:{}", host, port).parse()?)
}

/// Public entry: wire the account service and run the HTTP server
pub async fn run() -> anyhow::Result<()> {
    dotenv().ok();
    init_logging();

    let cfg = load_config()?;

    let mut jwt_secret = cfg.auth.jwt_secret.clone();
    if jwt_secret.trim().is_empty() {
        warn!("JWT_SECRET not set, using development fallback");
        jwt_secret = "dev-secret-change-me".to_string();
    }

    let mailer: Arc<dyn EmailDispatcher> = match &cfg.email.relay_url {
        Some(url) => {
            info!(relay = %url, "email dispatch via HTTP relay");
            Arc::new(HttpEmailDispatcher::new(url.clone(), cfg.email.from_address.clone()))
        }
        None => {
            info!("email dispatch in log-only mode");
            Arc::new(LogEmailDispatcher)
        }
    };

    let ttls = TokenTtls::from_secs(
        cfg.auth.access_ttl_secs,
        cfg.auth.refresh_ttl_secs,
        cfg.auth.verify_email_ttl_secs,
    );
    let codec = TokenCodec::new(&jwt_secret, ttls);
    let registry = Arc::new(InMemoryTokenRegistry::default());
    let repo = Arc::new(InMemoryAccountRepository::default());

    let service = AccountService::new(
        repo,
        registry.clone(),
        codec.clone(),
        mailer,
        AuthConfig { logout_revokes_all: cfg.auth.logout_revokes_all },
    );
    let state = ServerState {
        service: Arc::new(service),
        gate: Arc::new(AuthGate::new(codec, registry)),
        resend_requires_auth: cfg.auth.resend_requires_auth,
    };

    // Build router
    let cors = build_cors();
    let app: Router = routes::build_router(state, cors);

    // Bind and serve
    let addr = load_bind_addr(&cfg.server)?;
    info!(%addr, "starting account api");
    println!("starting account api at {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
