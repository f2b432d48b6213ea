use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use serde_json::json;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

use server::gate::REFRESH_TOKEN_HEADER;
use server::routes::{self, users::ServerState};
use service::auth::gate::AuthGate;
use service::auth::mailer::mock::RecordingDispatcher;
use service::auth::registry::InMemoryTokenRegistry;
use service::auth::repository::memory::InMemoryAccountRepository;
use service::auth::service::{AccountService, AuthConfig};
use service::auth::token::{TokenCodec, TokenTtls};

fn cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

struct TestApp {
    base_url: String,
}

/// Boots the real HTTP stack on an ephemeral port.
async fn start_server() -> anyhow::Result<TestApp> {
    let repo = Arc::new(InMemoryAccountRepository::default());
    let registry = Arc::new(InMemoryTokenRegistry::default());
    let codec = TokenCodec::new("e2e-secret", TokenTtls::default());
    let mailer = Arc::new(RecordingDispatcher::default());
    let svc = AccountService::new(
        repo,
        registry.clone(),
        codec.clone(),
        mailer,
        AuthConfig::default(),
    );
    let state = ServerState {
        service: Arc::new(svc),
        gate: Arc::new(AuthGate::new(codec, registry)),
        resend_requires_auth: false,
    };

    let app: Router = routes::build_router(state, cors());
    let listener = TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0)).await?;
    let addr: SocketAddr = listener.local_addr()?;
    let base_url = format!("http://{}:{}", addr.ip(), addr.port());

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            eprintln!("server error: {}", e);
        }
    });

    Ok(TestApp { base_url })
}

fn client() -> reqwest::Client {
    reqwest::Client::new()
}

#[tokio::test]
async fn e2e_public_health() -> anyhow::Result<()> {
    let app = start_server().await?;
    let res = client().get(format!("{}/health", app.base_url)).send().await?;
    assert_eq!(res.status(), reqwest::StatusCode::OK);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["status"], "ok");
    Ok(())
}

#[tokio::test]
async fn e2e_register_login_refresh() -> anyhow::Result<()> {
    let app = start_server().await?;
    let c = client();

    // Register
    let res = c
        .post(format!("{}/users/register", app.base_url))
        .json(&json!({"email": "wire@example.com", "password": "S3curePass"}))
        .send()
        .await?;
    assert_eq!(res.status(), reqwest::StatusCode::CREATED);

    // Login
    let res = c
        .post(format!("{}/users/login", app.base_url))
        .json(&json!({"email": "wire@example.com", "password": "S3curePass"}))
        .send()
        .await?;
    assert_eq!(res.status(), reqwest::StatusCode::OK);
    let body = res.json::<serde_json::Value>().await?;
    let refresh = body["data"]["refresh_token"].as_str().unwrap().to_string();

    // Refresh over the dedicated header
    let res = c
        .post(format!("{}/users/refresh-token", app.base_url))
        .header(REFRESH_TOKEN_HEADER, &refresh)
        .send()
        .await?;
    assert_eq!(res.status(), reqwest::StatusCode::OK);
    let body = res.json::<serde_json::Value>().await?;
    let rotated = body["data"]["refresh_token"].as_str().unwrap();
    assert_ne!(rotated, refresh);

    // The old token is gone after the rotation
    let res = c
        .post(format!("{}/users/refresh-token", app.base_url))
        .header(REFRESH_TOKEN_HEADER, &refresh)
        .send()
        .await?;
    assert_eq!(res.status(), reqwest::StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn e2e_openapi_document_served() -> anyhow::Result<()> {
    let app = start_server().await?;
    let res = client().get(format!("{}/api-docs/openapi.json", app.base_url)).send().await?;
    assert_eq!(res.status(), reqwest::StatusCode::OK);
    let body = res.json::<serde_json::Value>().await?;
    assert!(body["paths"].get("/users/login").is_some());
    assert!(body["paths"].get("/users/refresh-token").is_some());
    Ok(())
}
