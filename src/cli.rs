//! CLI argument parsing, validation, and startup helpers.

use crate::ServerConfig;
use crate::db::Database;
use clap::Parser;
use tracing::{error, info};
use url::Url;

const MIN_JWT_SECRET_LENGTH: usize = 32;

#[derive(clap::ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
    Compact,
}

#[derive(Parser, Debug, Clone)]
#[command(name = "vidcast", about = "Video sharing platform backend")]
pub struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "7290")]
    pub port: u16,

    /// Path to SQLite database file
    #[arg(short, long, default_value = "vidcast.db")]
    pub database: String,

    /// Public origin the API is served from (e.g., "https://api.example.com").
    /// Cookies are marked Secure when this is an https origin.
    #[arg(long, default_value = "http://localhost:7290")]
    pub public_origin: String,

    /// Path to file containing JWT secret. Prefer using JWT_SECRET env var instead
    #[arg(long)]
    pub jwt_secret_file: Option<String>,

    /// Access token lifetime in seconds
    #[arg(long)]
    pub access_token_ttl: Option<u64>,

    /// Refresh token lifetime in seconds
    #[arg(long)]
    pub refresh_token_ttl: Option<u64>,

    /// Log output format
    #[arg(short, long, default_value = "pretty")]
    pub log_format: LogFormat,
}

/// Initialize logging based on the specified format.
pub fn init_logging(format: &LogFormat) {
    match format {
        LogFormat::Pretty => tracing_subscriber::fmt::init(),
        LogFormat::Json => tracing_subscriber::fmt().json().init(),
        LogFormat::Compact => tracing_subscriber::fmt().compact().init(),
    }
}

/// Load JWT secret from environment variable or file.
/// Returns None and logs an error if the secret cannot be loaded. A missing
/// or short secret is a startup failure, never a per-request condition.
pub fn load_jwt_secret(jwt_secret_file: Option<&str>) -> Option<String> {
    let secret = if let Ok(secret) = std::env::var("JWT_SECRET") {
        // Clear the environment variable to prevent leaking
        // SAFETY: We're single-threaded at this point during startup,
        // and no other code is reading this environment variable.
        unsafe { std::env::remove_var("JWT_SECRET") };
        secret
    } else if let Some(path) = jwt_secret_file {
        match std::fs::read_to_string(path) {
            Ok(content) => content.trim().to_string(),
            Err(e) => {
                error!(path = %path, error = %e, "Failed to read JWT secret file");
                return None;
            }
        }
    } else {
        error!(
            "JWT secret is required. Set JWT_SECRET environment variable (recommended) or use --jwt-secret-file"
        );
        return None;
    };

    if secret.len() < MIN_JWT_SECRET_LENGTH {
        error!(
            "JWT secret is shorter than {} characters. Use a longer secret",
            MIN_JWT_SECRET_LENGTH
        );
        return None;
    }

    Some(secret)
}

/// Parse and validate the public origin URL.
/// Returns None and logs an error if validation fails.
pub fn validate_public_origin(origin: &str) -> Option<Url> {
    let url = match Url::parse(origin) {
        Ok(url) => url,
        Err(e) => {
            error!(origin = %origin, error = %e, "Invalid public-origin URL");
            return None;
        }
    };

    let is_https = url.scheme() == "https";
    let is_localhost = url.host_str() == Some("localhost") || url.host_str() == Some("127.0.0.1");

    if !is_https && !is_localhost {
        error!("public-origin must use HTTPS for non-localhost deployments");
        return None;
    }

    Some(url)
}

/// Build ServerConfig from validated arguments.
pub fn build_config(
    db: Database,
    jwt_secret: String,
    public_origin: &Url,
    access_token_ttl: Option<u64>,
    refresh_token_ttl: Option<u64>,
) -> ServerConfig {
    let secure_cookies = public_origin.scheme() == "https";

    ServerConfig {
        db,
        jwt_secret: jwt_secret.into_bytes(),
        access_token_ttl_secs: access_token_ttl,
        refresh_token_ttl_secs: refresh_token_ttl,
        secure_cookies,
        media: None,
    }
}

/// Open the database, logging errors if it fails.
pub async fn open_database(path: &str) -> Option<Database> {
    match Database::open(path).await {
        Ok(db) => {
            info!(path = %path, "Database opened");
            Some(db)
        }
        Err(e) => {
            error!(path = %path, error = %e, "Failed to open database");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::validate_public_origin;

    #[test]
    fn test_origin_validation() {
        assert!(validate_public_origin("http://localhost:7290").is_some());
        assert!(validate_public_origin("https://api.example.com").is_some());
        assert!(validate_public_origin("http://api.example.com").is_none());
        assert!(validate_public_origin("not a url").is_none());
    }
}
