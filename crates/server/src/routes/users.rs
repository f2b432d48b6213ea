use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Extension, Json};
use serde::Deserialize;

use common::messages;
use common::types::ApiResponse;
use service::auth::domain::{
    Account, AuthSession, EmailVerification, LoginInput, RegisterInput, TokenPair,
    VerificationResend,
};
use service::auth::errors::{AuthError, FieldError};
use service::auth::gate::{AuthContext, AuthGate};
use service::auth::repository::memory::InMemoryAccountRepository;
use service::auth::AccountService;

use crate::errors::ApiError;

/// Shared state handed to every route.
#[derive(Clone)]
pub struct ServerState {
    pub service: Arc<AccountService<InMemoryAccountRepository>>,
    pub gate: Arc<AuthGate>,
    pub resend_requires_auth: bool,
}

#[derive(Debug, Deserialize)]
pub struct ResendInput {
    pub email: Option<String>,
}

#[utoipa::path(get, path = "/users", tag = "users", responses((status = 200, description = "All accounts")))]
pub async fn find_all(State(state): State<ServerState>) -> Result<Json<Vec<Account>>, ApiError> {
    let accounts = state.service.find_all().await?;
    Ok(Json(accounts))
}

#[utoipa::path(post, path = "/users/register", tag = "users", request_body = crate::openapi::RegisterRequest, responses((status = 201, description = "Created"), (status = 409, description = "Conflict"), (status = 422, description = "Unprocessable Entity")))]
pub async fn register(
    State(state): State<ServerState>,
    Json(input): Json<RegisterInput>,
) -> Result<(StatusCode, Json<ApiResponse<Account>>), ApiError> {
    let account = state.service.register(input).await?;
    let body = ApiResponse::new(messages::CREATED)
        .with_detail(messages::USER_CREATED)
        .with_data(account);
    Ok((StatusCode::CREATED, Json(body)))
}

#[utoipa::path(post, path = "/users/login", tag = "users", request_body = crate::openapi::LoginRequest, responses((status = 200, description = "Logged in"), (status = 401, description = "Unauthorized"), (status = 422, description = "Unprocessable Entity")))]
pub async fn login(
    State(state): State<ServerState>,
    Json(input): Json<LoginInput>,
) -> Result<Json<ApiResponse<AuthSession>>, ApiError> {
    let session = state.service.login(input).await?;
    let body = ApiResponse::new(messages::SUCCESS)
        .with_detail(messages::LOGIN_SUCCESS)
        .with_data(session);
    Ok(Json(body))
}

#[utoipa::path(post, path = "/users/refresh-token", tag = "users", responses((status = 200, description = "Rotated"), (status = 401, description = "Unauthorized")))]
pub async fn refresh_token(
    State(state): State<ServerState>,
    Extension(ctx): Extension<AuthContext>,
) -> Result<Json<ApiResponse<TokenPair>>, ApiError> {
    let jti = ctx.refresh_jti.ok_or(AuthError::Unauthorized)?;
    let pair = state.service.refresh(ctx.subject, jti).await?;
    let body = ApiResponse::new(messages::SUCCESS)
        .with_detail(messages::TOKEN_REFRESHED)
        .with_data(pair);
    Ok(Json(body))
}

#[utoipa::path(post, path = "/users/logout", tag = "users", responses((status = 200, description = "Logged out"), (status = 401, description = "Unauthorized")))]
pub async fn logout(
    State(state): State<ServerState>,
    Extension(ctx): Extension<AuthContext>,
) -> Result<Json<ApiResponse>, ApiError> {
    let jti = ctx.refresh_jti.ok_or(AuthError::Unauthorized)?;
    state.service.logout(ctx.subject, jti).await?;
    Ok(Json(ApiResponse::new(messages::SUCCESS).with_detail(messages::LOGOUT_SUCCESS)))
}

#[utoipa::path(post, path = "/users/verify-email", tag = "users", responses((status = 200, description = "Verified"), (status = 401, description = "Unauthorized")))]
pub async fn verify_email(
    State(state): State<ServerState>,
    Extension(ctx): Extension<AuthContext>,
) -> Result<Json<ApiResponse>, ApiError> {
    let jti = ctx.verify_jti.ok_or(AuthError::Unauthorized)?;
    let outcome = state.service.verify_email(ctx.subject, jti).await?;
    let detail = match outcome {
        EmailVerification::Verified => messages::EMAIL_VERIFIED,
        EmailVerification::AlreadyVerified => messages::EMAIL_ALREADY_VERIFIED,
    };
    Ok(Json(ApiResponse::new(messages::SUCCESS).with_detail(detail)))
}

#[utoipa::path(post, path = "/users/resend-verify-email", tag = "users", request_body = crate::openapi::ResendRequest, responses((status = 200, description = "Sent"), (status = 422, description = "Unprocessable Entity")))]
pub async fn resend_verify_email(
    State(state): State<ServerState>,
    ctx: Option<Extension<AuthContext>>,
    payload: Option<Json<ResendInput>>,
) -> Result<Json<ApiResponse>, ApiError> {
    let email = payload.and_then(|Json(p)| p.email);
    let outcome = match (ctx, email) {
        // an authenticated caller always targets their own account
        (Some(Extension(ctx)), _) => state.service.resend_verify_email(ctx.subject).await?,
        (None, Some(email)) => state.service.resend_verify_email_by_email(&email).await?,
        (None, None) => {
            return Err(AuthError::Validation(vec![FieldError::new(
                "email",
                "required when not authenticated",
            )])
            .into());
        }
    };
    let detail = match outcome {
        VerificationResend::Sent => messages::VERIFY_EMAIL_SENT,
        VerificationResend::AlreadyVerified => messages::EMAIL_ALREADY_VERIFIED,
    };
    Ok(Json(ApiResponse::new(messages::SUCCESS).with_detail(detail)))
}
