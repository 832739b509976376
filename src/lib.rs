pub mod api;
pub mod auth;
pub mod cli;
pub mod db;
pub mod jwt;
pub mod media;
pub mod password;
pub mod rate_limit;

use api::create_api_router;
use axum::Router;
use db::Database;
use jwt::JwtConfig;
use media::{DiscardMediaStore, MediaStore};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

pub struct ServerConfig {
    /// Database connection (cloneable, uses connection pool internally)
    pub db: Database,
    /// JWT secret for signing tokens
    pub jwt_secret: Vec<u8>,
    /// Access token lifetime override in seconds
    pub access_token_ttl_secs: Option<u64>,
    /// Refresh token lifetime override in seconds
    pub refresh_token_ttl_secs: Option<u64>,
    /// Whether to set Secure flag on cookies (true in production with HTTPS)
    pub secure_cookies: bool,
    /// Object-storage backend; defaults to the discarding store
    pub media: Option<Arc<dyn MediaStore>>,
}

/// Create the application router with the given configuration.
pub fn create_app(config: &ServerConfig) -> Router {
    let jwt = JwtConfig::new(&config.jwt_secret).with_durations(
        config
            .access_token_ttl_secs
            .unwrap_or(jwt::ACCESS_TOKEN_DURATION_SECS),
        config
            .refresh_token_ttl_secs
            .unwrap_or(jwt::REFRESH_TOKEN_DURATION_SECS),
    );
    let jwt = Arc::new(jwt);

    let media: Arc<dyn MediaStore> = config
        .media
        .clone()
        .unwrap_or_else(|| Arc::new(DiscardMediaStore));

    Router::new().nest(
        "/api/v1",
        create_api_router(config.db.clone(), jwt, media, config.secure_cookies),
    )
}

/// Run the server on the given listener. This function blocks until the
/// server exits.
pub async fn run_server(config: ServerConfig, listener: TcpListener) -> Result<(), std::io::Error> {
    let app = create_app(&config);
    let make_service = app.into_make_service_with_connect_info::<SocketAddr>();
    axum::serve(listener, make_service).await
}

/// Start the server on the given port in a background task. Use port 0 to
/// let the OS choose a random port. Returns the actual address.
/// Note: For production use, prefer `run_server` directly in main.
pub async fn start_server(
    config: ServerConfig,
    port: u16,
) -> (tokio::task::JoinHandle<()>, SocketAddr) {
    let addr = format!("127.0.0.1:{}", port);
    let listener = TcpListener::bind(&addr).await.expect("Failed to bind");
    let local_addr = listener.local_addr().expect("Failed to get local address");

    let handle = tokio::spawn(async move {
        run_server(config, listener).await.ok();
    });

    (handle, local_addr)
}
