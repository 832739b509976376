//! Liveness endpoint.

use axum::{Router, extract::State, routing::get};
use serde_json::json;

use super::error::ResultExt;
use super::response::{ApiResponse, ApiResult};
use crate::db::Database;

#[derive(Clone)]
pub struct HealthState {
    pub db: Database,
}

pub fn router(state: HealthState) -> Router {
    Router::new().route("/", get(healthcheck)).with_state(state)
}

/// GET / - Liveness plus a database ping.
async fn healthcheck(State(state): State<HealthState>) -> ApiResult<serde_json::Value> {
    state.db.ping().await.db_err("Database ping failed")?;

    Ok(ApiResponse::ok(
        json!({ "status": "ok", "database": "ok" }),
        "Service is healthy",
    ))
}
