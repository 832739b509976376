//! Session lifecycle: token rotation, invalidation, and refresh validation.
//!
//! Exactly one refresh token is valid per user at a time: it lives on the
//! user record, rotation overwrites it, and validation compares the
//! presented token against the stored copy by exact string equality. A
//! token superseded by a later rotation (or cleared by logout) is stale.
//! Concurrent rotations resolve last-write-wins at the storage layer.

use crate::db::{Database, User};
use crate::jwt::{JwtConfig, JwtError};

/// A freshly rotated access/refresh pair.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds
    pub access_expires_in: u64,
    /// Refresh token lifetime in seconds
    pub refresh_expires_in: u64,
}

/// Errors from session operations.
#[derive(Debug)]
pub enum SessionError {
    /// The identity does not exist.
    NotFound,
    /// The presented refresh token failed signature/expiry verification.
    InvalidToken,
    /// The presented refresh token was superseded or cleared.
    StaleToken,
    /// Token signing failed (misconfiguration, startup-class).
    Signing(JwtError),
    /// Storage failure.
    Database(sqlx::Error),
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionError::NotFound => write!(f, "User not found"),
            SessionError::InvalidToken => write!(f, "Invalid refresh token"),
            SessionError::StaleToken => write!(f, "Refresh token is no longer valid"),
            SessionError::Signing(e) => write!(f, "Token signing failed: {}", e),
            SessionError::Database(e) => write!(f, "Database error: {}", e),
        }
    }
}

impl std::error::Error for SessionError {}

/// Manages the single active session per user.
pub struct SessionManager<'a> {
    db: &'a Database,
    jwt: &'a JwtConfig,
}

impl<'a> SessionManager<'a> {
    pub fn new(db: &'a Database, jwt: &'a JwtConfig) -> Self {
        Self { db, jwt }
    }

    /// Issue a fresh access/refresh pair and persist the new refresh token,
    /// overwriting any prior value. The overwritten token is implicitly
    /// invalidated - it will no longer match at validation time.
    pub async fn rotate(&self, user_id: i64) -> Result<TokenPair, SessionError> {
        let user = self
            .db
            .users()
            .get_by_id(user_id)
            .await
            .map_err(SessionError::Database)?
            .ok_or(SessionError::NotFound)?;

        let access = self
            .jwt
            .generate_access_token(&user.uuid, &user.username, &user.email, &user.fullname)
            .map_err(SessionError::Signing)?;
        let refresh = self
            .jwt
            .generate_refresh_token(&user.uuid)
            .map_err(SessionError::Signing)?;

        self.db
            .users()
            .set_refresh_token(user.id, Some(&refresh.token))
            .await
            .map_err(SessionError::Database)?;

        Ok(TokenPair {
            access_token: access.token,
            refresh_token: refresh.token,
            access_expires_in: access.duration,
            refresh_expires_in: refresh.duration,
        })
    }

    /// Clear the stored refresh token (logout). Idempotent.
    pub async fn invalidate(&self, user_id: i64) -> Result<(), SessionError> {
        self.db
            .users()
            .set_refresh_token(user_id, None)
            .await
            .map_err(SessionError::Database)?;
        Ok(())
    }

    /// Verify a presented refresh token and return its user.
    ///
    /// Signature/expiry failures and unresolvable users are `InvalidToken`;
    /// a token that verifies but does not exactly match the stored copy is
    /// `StaleToken` - the anti-replay guarantee for rotated-away tokens.
    pub async fn validate_refresh(&self, presented: &str) -> Result<User, SessionError> {
        let claims = self.jwt.validate_refresh_token(presented).map_err(|e| {
            tracing::debug!(error = %e, "Refresh token rejected");
            SessionError::InvalidToken
        })?;

        let user = self
            .db
            .users()
            .get_by_uuid(&claims.sub)
            .await
            .map_err(SessionError::Database)?
            .ok_or(SessionError::InvalidToken)?;

        match user.refresh_token.as_deref() {
            Some(stored) if stored == presented => Ok(user),
            _ => Err(SessionError::StaleToken),
        }
    }
}
