//! Authenticated user context.

/// The resolved identity attached to a request by the auth gate.
/// Secret fields (password hash, stored refresh token) never appear here.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    /// Database user ID
    pub id: i64,
    /// Public user UUID
    pub uuid: String,
    pub username: String,
    pub email: String,
    pub fullname: String,
    pub avatar_url: Option<String>,
}
