//! JWT token generation and validation.

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Token type for distinguishing access vs refresh tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    /// Short-lived access token - stateless, verified on every request
    Access,
    /// Long-lived refresh token - one active instance stored per user
    Refresh,
}

/// JWT claims for access tokens (stateless).
///
/// Carries the denormalized profile fields so the gate can build a request
/// context without extra queries; the user is still re-resolved to catch
/// deletions after issuance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Subject (user UUID)
    pub sub: String,
    /// Username
    pub username: String,
    /// Email address
    pub email: String,
    /// Display name
    pub fullname: String,
    /// Token type
    #[serde(rename = "typ")]
    pub token_type: TokenType,
    /// Issued at (Unix timestamp)
    pub iat: u64,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
}

/// JWT claims for refresh tokens. Identity id only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshClaims {
    /// Subject (user UUID)
    pub sub: String,
    /// Token type
    #[serde(rename = "typ")]
    pub token_type: TokenType,
    /// Issued at (Unix timestamp)
    pub iat: u64,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
}

/// Default access token duration: 1 hour
pub const ACCESS_TOKEN_DURATION_SECS: u64 = 60 * 60;

/// Default refresh token duration: 10 days
pub const REFRESH_TOKEN_DURATION_SECS: u64 = 10 * 24 * 60 * 60;

/// Configuration for JWT operations.
#[derive(Clone)]
pub struct JwtConfig {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_duration_secs: u64,
    refresh_duration_secs: u64,
}

/// Result of generating an access token.
#[derive(Debug, Clone)]
pub struct AccessTokenResult {
    /// The JWT token string
    pub token: String,
    /// Token duration in seconds
    pub duration: u64,
}

/// Result of generating a refresh token.
#[derive(Debug, Clone)]
pub struct RefreshTokenResult {
    /// The JWT token string
    pub token: String,
    /// Issued at timestamp (Unix seconds)
    pub issued_at: u64,
    /// Expiration timestamp (Unix seconds)
    pub expires_at: u64,
    /// Token duration in seconds
    pub duration: u64,
}

impl JwtConfig {
    /// Create a new JWT configuration with the given secret and default durations.
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            access_duration_secs: ACCESS_TOKEN_DURATION_SECS,
            refresh_duration_secs: REFRESH_TOKEN_DURATION_SECS,
        }
    }

    /// Override the token durations (both in seconds).
    pub fn with_durations(mut self, access_secs: u64, refresh_secs: u64) -> Self {
        self.access_duration_secs = access_secs;
        self.refresh_duration_secs = refresh_secs;
        self
    }

    /// Generate an access token for a user.
    /// Access tokens are short-lived and stateless.
    pub fn generate_access_token(
        &self,
        user_uuid: &str,
        username: &str,
        email: &str,
        fullname: &str,
    ) -> Result<AccessTokenResult, JwtError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|_| JwtError::TimeError)?
            .as_secs();

        let exp = now + self.access_duration_secs;

        let claims = AccessClaims {
            sub: user_uuid.to_string(),
            username: username.to_string(),
            email: email.to_string(),
            fullname: fullname.to_string(),
            token_type: TokenType::Access,
            iat: now,
            exp,
        };

        let token = jsonwebtoken::encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(JwtError::Encoding)?;

        Ok(AccessTokenResult {
            token,
            duration: self.access_duration_secs,
        })
    }

    /// Generate a refresh token for a user.
    /// Refresh tokens are long-lived; the caller persists the single active
    /// instance on the user record.
    pub fn generate_refresh_token(&self, user_uuid: &str) -> Result<RefreshTokenResult, JwtError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|_| JwtError::TimeError)?
            .as_secs();

        let exp = now + self.refresh_duration_secs;

        let claims = RefreshClaims {
            sub: user_uuid.to_string(),
            token_type: TokenType::Refresh,
            iat: now,
            exp,
        };

        let token = jsonwebtoken::encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(JwtError::Encoding)?;

        Ok(RefreshTokenResult {
            token,
            issued_at: now,
            expires_at: exp,
            duration: self.refresh_duration_secs,
        })
    }

    /// Validate and decode an access token.
    pub fn validate_access_token(&self, token: &str) -> Result<AccessClaims, JwtError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        let token_data =
            jsonwebtoken::decode::<AccessClaims>(token, &self.decoding_key, &validation)
                .map_err(JwtError::Decoding)?;

        if token_data.claims.token_type != TokenType::Access {
            return Err(JwtError::WrongTokenType);
        }

        Ok(token_data.claims)
    }

    /// Validate and decode a refresh token.
    pub fn validate_refresh_token(&self, token: &str) -> Result<RefreshClaims, JwtError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        let token_data =
            jsonwebtoken::decode::<RefreshClaims>(token, &self.decoding_key, &validation)
                .map_err(JwtError::Decoding)?;

        if token_data.claims.token_type != TokenType::Refresh {
            return Err(JwtError::WrongTokenType);
        }

        Ok(token_data.claims)
    }
}

/// Errors that can occur during JWT operations.
#[derive(Debug)]
pub enum JwtError {
    /// Error encoding the token
    Encoding(jsonwebtoken::errors::Error),
    /// Error decoding the token
    Decoding(jsonwebtoken::errors::Error),
    /// System time error
    TimeError,
    /// Wrong token type (e.g., using refresh token as access token)
    WrongTokenType,
}

impl std::fmt::Display for JwtError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JwtError::Encoding(e) => write!(f, "Failed to encode token: {}", e),
            JwtError::Decoding(e) => write!(f, "Failed to decode token: {}", e),
            JwtError::TimeError => write!(f, "System time error"),
            JwtError::WrongTokenType => write!(f, "Wrong token type"),
        }
    }
}

impl std::error::Error for JwtError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_and_validate_access_token() {
        let config = JwtConfig::new(b"test-secret-key-for-testing");

        let result = config
            .generate_access_token("uuid-123", "alice", "alice@example.com", "Alice A")
            .unwrap();

        assert_eq!(result.duration, ACCESS_TOKEN_DURATION_SECS);

        let claims = config.validate_access_token(&result.token).unwrap();
        assert_eq!(claims.sub, "uuid-123");
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.email, "alice@example.com");
        assert_eq!(claims.fullname, "Alice A");
        assert_eq!(claims.token_type, TokenType::Access);
    }

    #[test]
    fn test_generate_and_validate_refresh_token() {
        let config = JwtConfig::new(b"test-secret-key-for-testing");

        let result = config.generate_refresh_token("uuid-123").unwrap();

        assert_eq!(result.duration, REFRESH_TOKEN_DURATION_SECS);
        assert_eq!(result.expires_at - result.issued_at, result.duration);

        let claims = config.validate_refresh_token(&result.token).unwrap();
        assert_eq!(claims.sub, "uuid-123");
        assert_eq!(claims.token_type, TokenType::Refresh);
    }

    #[test]
    fn test_wrong_token_type_rejected() {
        let config = JwtConfig::new(b"test-secret-key-for-testing");

        let access = config
            .generate_access_token("uuid-123", "alice", "alice@example.com", "Alice A")
            .unwrap();

        let refresh = config.generate_refresh_token("uuid-123").unwrap();

        // Access token should fail validate_refresh_token
        assert!(config.validate_refresh_token(&access.token).is_err());

        // Refresh token should fail validate_access_token
        assert!(config.validate_access_token(&refresh.token).is_err());
    }

    #[test]
    fn test_invalid_token() {
        let config = JwtConfig::new(b"test-secret-key-for-testing");

        let result = config.validate_access_token("invalid-token");
        assert!(result.is_err());
    }

    #[test]
    fn test_wrong_secret() {
        let config1 = JwtConfig::new(b"secret-1");
        let config2 = JwtConfig::new(b"secret-2");

        let result = config1
            .generate_access_token("uuid-123", "alice", "alice@example.com", "Alice A")
            .unwrap();

        let validation = config2.validate_access_token(&result.token);
        assert!(validation.is_err());
    }

    #[test]
    fn test_expired_token() {
        let secret = b"test-secret";
        let encoding_key = jsonwebtoken::EncodingKey::from_secret(secret);

        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs();

        // Create claims with exp in the past
        let claims = AccessClaims {
            sub: "uuid-123".to_string(),
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            fullname: "Alice A".to_string(),
            token_type: TokenType::Access,
            iat: now - 100,
            exp: now - 50, // Expired 50 seconds ago
        };

        let token = jsonwebtoken::encode(&Header::default(), &claims, &encoding_key).unwrap();

        let config = JwtConfig::new(secret);
        let result = config.validate_access_token(&token);
        assert!(result.is_err());
    }

    #[test]
    fn test_custom_durations() {
        let config = JwtConfig::new(b"test-secret-key-for-testing").with_durations(120, 600);

        let access = config
            .generate_access_token("uuid-123", "alice", "alice@example.com", "Alice A")
            .unwrap();
        assert_eq!(access.duration, 120);

        let refresh = config.generate_refresh_token("uuid-123").unwrap();
        assert_eq!(refresh.duration, 600);
        assert_eq!(refresh.expires_at - refresh.issued_at, 600);
    }
}
