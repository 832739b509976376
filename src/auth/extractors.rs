//! Axum extractors for authentication.
//!
//! The gate is a pure check: it verifies the access token and resolves the
//! identity, nothing else. Expired access tokens are not refreshed here;
//! the client exchanges its refresh token at the refresh endpoint.

use axum::{extract::FromRequestParts, http::request::Parts};
use tracing::debug;

use super::cookie::{ACCESS_COOKIE_NAME, get_cookie};
use super::errors::{ApiAuthError, AuthErrorKind};
use super::state::HasAuthBackend;
use super::types::AuthenticatedUser;

/// Pull the access token from the request: `Authorization: Bearer` header
/// first, then the `accessToken` cookie.
fn extract_access_token(parts: &Parts) -> Option<String> {
    if let Some(header) = parts.headers.get("authorization") {
        if let Ok(value) = header.to_str() {
            if let Some(token) = value.strip_prefix("Bearer ") {
                let token = token.trim();
                if !token.is_empty() {
                    return Some(token.to_string());
                }
            }
        }
    }
    get_cookie(&parts.headers, ACCESS_COOKIE_NAME).map(|t| t.to_string())
}

/// Core authentication logic: verify the access token and resolve the
/// identity. Secret fields stay out of the returned context; a user deleted
/// after issuance fails like any other bad token.
async fn authenticate_request<S>(
    parts: &Parts,
    state: &S,
) -> Result<AuthenticatedUser, AuthErrorKind>
where
    S: HasAuthBackend + Send + Sync,
{
    let token = extract_access_token(parts).ok_or(AuthErrorKind::NotAuthenticated)?;

    let claims = state.jwt().validate_access_token(&token).map_err(|e| {
        debug!(error = %e, "Access token rejected");
        AuthErrorKind::InvalidToken
    })?;

    let user = state
        .db()
        .users()
        .get_by_uuid(&claims.sub)
        .await
        .map_err(|e| {
            tracing::error!("Failed to resolve user: {}", e);
            AuthErrorKind::DatabaseError
        })?
        .ok_or(AuthErrorKind::UserNotFound)?;

    Ok(AuthenticatedUser {
        id: user.id,
        uuid: user.uuid,
        username: user.username,
        email: user.email,
        fullname: user.fullname,
        avatar_url: user.avatar_url,
    })
}

/// Extractor for endpoints that require authentication.
pub struct ApiAuth(pub AuthenticatedUser);

impl<S> FromRequestParts<S> for ApiAuth
where
    S: HasAuthBackend + Send + Sync,
{
    type Rejection = ApiAuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        authenticate_request(parts, state)
            .await
            .map(ApiAuth)
            .map_err(ApiAuthError::from)
    }
}

/// Optional authentication extractor - never fails.
/// Used by endpoints that serve both anonymous and authenticated callers
/// (public listings, view counting, privacy checks).
pub struct MaybeAuth(pub Option<AuthenticatedUser>);

impl<S> FromRequestParts<S> for MaybeAuth
where
    S: HasAuthBackend + Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeAuth(authenticate_request(parts, state).await.ok()))
    }
}
