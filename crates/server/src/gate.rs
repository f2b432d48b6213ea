use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};

use service::auth::gate::{AuthRequirement, Presented};

use crate::errors::ApiError;
use crate::routes::users::ServerState;

/// Refresh tokens ride their own header; the bearer slot carries access and
/// verify-email tokens.
pub const REFRESH_TOKEN_HEADER: &str = "x-refresh-token";

pub async fn require_access_token(
    state: State<ServerState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    enforce(AuthRequirement::AccessToken, state, bearer, req, next).await
}

pub async fn require_refresh_token(
    state: State<ServerState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    enforce(AuthRequirement::RefreshToken, state, bearer, req, next).await
}

pub async fn require_access_and_refresh(
    state: State<ServerState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    enforce(AuthRequirement::AccessAndRefreshToken, state, bearer, req, next).await
}

pub async fn require_verify_email_token(
    state: State<ServerState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    enforce(AuthRequirement::VerifyEmailToken, state, bearer, req, next).await
}

async fn enforce(
    requirement: AuthRequirement,
    State(state): State<ServerState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let refresh = req
        .headers()
        .get(REFRESH_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());
    let presented = Presented {
        bearer: bearer.map(|TypedHeader(auth)| auth.token().to_string()),
        refresh,
    };

    if let Some(ctx) = state.gate.authorize(requirement, &presented).await? {
        req.extensions_mut().insert(ctx);
    }
    Ok(next.run(req).await)
}
