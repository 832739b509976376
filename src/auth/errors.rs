//! Authentication error types.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// Internal auth error kind used by the gate.
#[derive(Debug)]
pub enum AuthErrorKind {
    NotAuthenticated,
    InvalidToken,
    UserNotFound,
    DatabaseError,
}

/// API authentication error. Renders the uniform envelope; the specific
/// verification failure is logged where it happens, never sent to the
/// caller.
#[derive(Debug)]
pub struct ApiAuthError(pub(super) AuthErrorKind);

impl ApiAuthError {
    fn status_code(&self) -> StatusCode {
        match self.0 {
            AuthErrorKind::NotAuthenticated
            | AuthErrorKind::InvalidToken
            | AuthErrorKind::UserNotFound => StatusCode::UNAUTHORIZED,
            AuthErrorKind::DatabaseError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> &'static str {
        match self.0 {
            AuthErrorKind::NotAuthenticated => "Authentication required",
            AuthErrorKind::InvalidToken => "Invalid access token",
            AuthErrorKind::UserNotFound => "Invalid access token",
            AuthErrorKind::DatabaseError => "Database error",
        }
    }
}

impl From<AuthErrorKind> for ApiAuthError {
    fn from(kind: AuthErrorKind) -> Self {
        Self(kind)
    }
}

impl IntoResponse for ApiAuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = self.message();
        (
            status,
            Json(json!({
                "success": false,
                "statusCode": status.as_u16(),
                "message": message,
                "errors": [message],
            })),
        )
            .into_response()
    }
}
