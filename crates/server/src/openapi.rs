use utoipa::OpenApi;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(ToSchema)]
pub struct HealthResponse { pub status: String }

#[derive(utoipa::ToSchema)]
pub struct RegisterRequest { pub email: String, pub password: String }

#[derive(utoipa::ToSchema)]
pub struct LoginRequest { pub email: String, pub password: String }

#[derive(utoipa::ToSchema)]
pub struct ResendRequest { pub email: Option<String> }

#[derive(utoipa::ToSchema)]
pub struct AccountDoc {
    pub id: Uuid,
    pub email: String,
    pub verified: bool,
    pub created_at: String,
}

#[derive(utoipa::ToSchema)]
pub struct SessionDoc {
    pub user: AccountDoc,
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(utoipa::ToSchema)]
pub struct TokenPairDoc { pub access_token: String, pub refresh_token: String }

#[derive(utoipa::ToSchema)]
pub struct EnvelopeDoc {
    pub message: String,
    pub detail: Option<String>,
    pub errors: Option<String>,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::users::find_all,
        crate::routes::users::register,
        crate::routes::users::login,
        crate::routes::users::refresh_token,
        crate::routes::users::logout,
        crate::routes::users::verify_email,
        crate::routes::users::resend_verify_email,
    ),
    components(
        schemas(
            HealthResponse,
            RegisterRequest,
            LoginRequest,
            ResendRequest,
            AccountDoc,
            SessionDoc,
            TokenPairDoc,
            EnvelopeDoc,
        )
    ),
    tags(
        (name = "health"),
        (name = "users")
    )
)]
pub struct ApiDoc;
