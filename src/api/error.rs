//! Shared error handling for API endpoints.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::error;

use crate::auth::SessionError;

/// Extension trait for concise error mapping on Results.
pub trait ResultExt<T> {
    fn db_err(self, msg: &str) -> Result<T, ApiError>;
}

impl<T, E: std::fmt::Display> ResultExt<T> for Result<T, E> {
    fn db_err(self, msg: &str) -> Result<T, ApiError> {
        self.map_err(|e| ApiError::db_error(msg, e))
    }
}

/// API error taxonomy. Every variant renders the uniform envelope.
pub enum ApiError {
    /// Malformed or missing input, bad id format (400)
    BadRequest(String),
    /// Missing/invalid/expired credentials (401)
    Unauthorized(String),
    /// Refresh token superseded by a later rotation or logout (401)
    StaleToken,
    /// Authenticated but not the owner, or private resource (403)
    Forbidden(String),
    /// Target does not exist (404)
    NotFound(String),
    /// Storage or other dependency failure; cause logged, not leaked (500)
    Internal(String),
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn db_error(context: &str, e: impl std::fmt::Display) -> Self {
        error!("{}: {}", context, e);
        Self::Internal("Database error".into())
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) | ApiError::StaleToken => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::Forbidden(msg)
            | ApiError::NotFound(msg)
            | ApiError::Internal(msg) => msg,
            ApiError::StaleToken => "Refresh token is no longer valid",
        }
    }
}

impl From<SessionError> for ApiError {
    fn from(e: SessionError) -> Self {
        match e {
            SessionError::NotFound => ApiError::not_found("User not found"),
            SessionError::InvalidToken => ApiError::unauthorized("Invalid refresh token"),
            SessionError::StaleToken => ApiError::StaleToken,
            SessionError::Signing(e) => {
                error!("Token signing failed: {}", e);
                ApiError::internal("Failed to issue tokens")
            }
            SessionError::Database(e) => ApiError::db_error("Session storage failure", e),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.message().to_string();
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

/// Validate a UUID path parameter before any lookup.
pub fn validate_uuid(id: &str) -> Result<(), ApiError> {
    if id.is_empty() {
        return Err(ApiError::bad_request("Id cannot be empty"));
    }
    if id.len() > 36 {
        return Err(ApiError::bad_request("Id is too long"));
    }
    if uuid::Uuid::parse_str(id).is_err() {
        return Err(ApiError::bad_request("Invalid id format"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::validate_uuid;

    #[test]
    fn test_validate_uuid() {
        assert!(validate_uuid(&uuid::Uuid::new_v4().to_string()).is_ok());
        assert!(validate_uuid("").is_err());
        assert!(validate_uuid("not-a-uuid").is_err());
        assert!(validate_uuid(&"x".repeat(40)).is_err());
    }
}
