use std::net::SocketAddr;

use clap::Parser;
use tracing::{error, info};
use vidcast::cli::{
    Args, build_config, init_logging, load_jwt_secret, open_database, validate_public_origin,
};
use vidcast::create_app;

#[tokio::main]
async fn main() {
    let args = Args::parse();

    init_logging(&args.log_format);

    let Some(jwt_secret) = load_jwt_secret(args.jwt_secret_file.as_deref()) else {
        std::process::exit(1);
    };

    let Some(public_origin) = validate_public_origin(&args.public_origin) else {
        std::process::exit(1);
    };

    let Some(db) = open_database(&args.database).await else {
        std::process::exit(1);
    };

    let addr = format!("0.0.0.0:{}", args.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| {
            error!(address = %addr, error = %e, "Failed to bind");
            std::process::exit(1);
        });

    let local_addr = listener.local_addr().unwrap();

    let config = build_config(
        db,
        jwt_secret,
        &public_origin,
        args.access_token_ttl,
        args.refresh_token_ttl,
    );
    let app = create_app(&config);

    info!(address = %local_addr, "Listening");

    let make_service = app.into_make_service_with_connect_info::<SocketAddr>();
    if let Err(e) = axum::serve(listener, make_service).await {
        error!(error = %e, "Server error");
        std::process::exit(1);
    }
}
