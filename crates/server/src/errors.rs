use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;
use tracing::error;

use common::messages;
use common::types::ApiResponse;
use service::auth::errors::AuthError;

/// Wire-facing wrapper that turns business errors into the response
/// envelope with the right status code.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct ApiError(#[from] pub AuthError);

impl ApiError {
    fn status_message(&self) -> (StatusCode, &'static str) {
        match &self.0 {
            AuthError::Validation(_) => {
                (StatusCode::UNPROCESSABLE_ENTITY, messages::UNPROCESSABLE_ENTITY)
            }
            AuthError::DuplicateEmail => (StatusCode::CONFLICT, messages::CONFLICT),
            // one answer for both, so the response never reveals whether
            // the email exists or the password was wrong
            AuthError::InvalidCredentials | AuthError::Unauthorized => {
                (StatusCode::UNAUTHORIZED, messages::UNAUTHORIZED)
            }
            AuthError::Hash(_) | AuthError::Token(_) | AuthError::Unavailable(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, messages::SERVICE_UNAVAILABLE)
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_message();
        if status.is_server_error() {
            error!(code = self.0.code(), error = %self.0, "request failed");
        }
        let mut body: ApiResponse = ApiResponse::new(message).with_errors(self.0.reason());
        if let AuthError::Validation(fields) = &self.0 {
            let detail = fields
                .iter()
                .map(|f| format!("{}: {}", f.field, f.message))
                .collect::<Vec<_>>()
                .join("; ");
            body = body.with_detail(detail);
        }
        (status, Json(body)).into_response()
    }
}
