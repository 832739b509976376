//! Subscriptions API: toggle plus subscriber/subscribed-channel listings.

use axum::{
    Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use std::sync::Arc;

use super::error::{ApiError, ResultExt, validate_uuid};
use super::pagination::{Page, PageQuery};
use super::response::{ApiResponse, ApiResult};
use super::views::SubscriptionView;
use crate::auth::ApiAuth;
use crate::db::{Database, User};
use crate::impl_has_auth_backend;
use crate::jwt::JwtConfig;

/// State for subscription endpoints.
#[derive(Clone)]
pub struct SubscriptionsState {
    pub db: Database,
    pub jwt: Arc<JwtConfig>,
}

impl_has_auth_backend!(SubscriptionsState);

pub fn router(state: SubscriptionsState) -> Router {
    Router::new()
        .route("/c/{channelId}", post(toggle_subscription).get(channel_subscribers))
        .route("/u/{subscriberId}", get(subscribed_channels))
        .with_state(state)
}

/// Resolve a user by path id, 404 on miss.
async fn resolve_user(
    state: &SubscriptionsState,
    id: &str,
    what: &str,
) -> Result<User, ApiError> {
    validate_uuid(id)?;
    state
        .db
        .users()
        .get_by_uuid(id)
        .await
        .db_err("Failed to look up user")?
        .ok_or_else(|| ApiError::not_found(format!("{} not found", what)))
}

/// POST /c/{channelId} - Toggle a subscription. Subscribing to your own
/// channel is rejected before any record is touched.
async fn toggle_subscription(
    State(state): State<SubscriptionsState>,
    ApiAuth(actor): ApiAuth,
    Path(channel_id): Path<String>,
) -> ApiResult<serde_json::Value> {
    validate_uuid(&channel_id)?;
    if channel_id == actor.uuid {
        return Err(ApiError::bad_request(
            "You cannot subscribe to your own channel",
        ));
    }

    let channel = resolve_user(&state, &channel_id, "Channel").await?;

    let subscribed = state
        .db
        .subscriptions()
        .toggle(actor.id, channel.id)
        .await
        .db_err("Failed to toggle subscription")?;

    let message = if subscribed {
        "Subscribed successfully"
    } else {
        "Unsubscribed successfully"
    };
    Ok(ApiResponse::ok(
        serde_json::json!({ "subscribed": subscribed }),
        message,
    ))
}

/// GET /c/{channelId} - Subscribers of a channel.
async fn channel_subscribers(
    State(state): State<SubscriptionsState>,
    ApiAuth(_actor): ApiAuth,
    Path(channel_id): Path<String>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Page<SubscriptionView>> {
    let channel = resolve_user(&state, &channel_id, "Channel").await?;
    let (page, limit, offset) = query.resolve();

    let (subscribers, total) = state
        .db
        .subscriptions()
        .subscribers(channel.id, limit, offset)
        .await
        .db_err("Failed to list subscribers")?;

    Ok(ApiResponse::ok(
        Page::new(
            subscribers.into_iter().map(Into::into).collect(),
            total,
            page,
            limit,
        ),
        "Subscribers fetched successfully",
    ))
}

/// GET /u/{subscriberId} - Channels a user is subscribed to.
async fn subscribed_channels(
    State(state): State<SubscriptionsState>,
    ApiAuth(_actor): ApiAuth,
    Path(subscriber_id): Path<String>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Page<SubscriptionView>> {
    let subscriber = resolve_user(&state, &subscriber_id, "User").await?;
    let (page, limit, offset) = query.resolve();

    let (channels, total) = state
        .db
        .subscriptions()
        .subscriptions(subscriber.id, limit, offset)
        .await
        .db_err("Failed to list subscribed channels")?;

    Ok(ApiResponse::ok(
        Page::new(
            channels.into_iter().map(Into::into).collect(),
            total,
            page,
            limit,
        ),
        "Subscribed channels fetched successfully",
    ))
}
