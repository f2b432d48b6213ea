pub mod users;

use axum::{
    middleware,
    routing::{get, post},
    Json, Router,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use common::types::Health;

use crate::gate;
use crate::openapi::ApiDoc;
use users::ServerState;

#[utoipa::path(get, path = "/health", tag = "health", responses((status = 200, description = "Service healthy")))]
pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

/// Build the full application router: public routes, token-gated routes,
/// and the Swagger docs.
pub fn build_router(state: ServerState, cors: CorsLayer) -> Router {
    let public = Router::new()
        .route("/health", get(health))
        .route("/users", get(users::find_all))
        .route("/users/register", post(users::register))
        .route("/users/login", post(users::login));

    let refresh = Router::new()
        .route("/users/refresh-token", post(users::refresh_token))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            gate::require_refresh_token,
        ));

    let logout = Router::new()
        .route("/users/logout", post(users::logout))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            gate::require_access_and_refresh,
        ));

    let verify = Router::new()
        .route("/users/verify-email", post(users::verify_email))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            gate::require_verify_email_token,
        ));

    // resend is public by default; the config flag turns it into an
    // access-token route that targets the caller's own account
    let resend = {
        let route = Router::new().route("/users/resend-verify-email", post(users::resend_verify_email));
        if state.resend_requires_auth {
            route.route_layer(middleware::from_fn_with_state(
                state.clone(),
                gate::require_access_token,
            ))
        } else {
            route
        }
    };

    let docs = SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi());

    public
        .merge(refresh)
        .merge(logout)
        .merge(verify)
        .merge(resend)
        .merge(docs)
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(
                    DefaultMakeSpan::new()
                        .level(Level::INFO)
                        .include_headers(false),
                )
                .on_request(
                    DefaultOnRequest::new()
                        .level(Level::INFO),
                )
                .on_response(
                    DefaultOnResponse::new()
                        .level(Level::INFO)
                        .include_headers(false),
                )
                .on_failure(
                    DefaultOnFailure::new()
                        .level(Level::ERROR),
                ),
        )
}
