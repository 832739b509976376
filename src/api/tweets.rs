//! Tweets API: short posts with a 280-character bound, ownership-scoped
//! mutation, and like-aware listings.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, patch, post},
};
use serde::Deserialize;
use std::sync::Arc;

use super::error::{ApiError, ResultExt, validate_uuid};
use super::pagination::{Page, PageQuery};
use super::response::{ApiResponse, ApiResult};
use super::views::TweetView;
use crate::auth::{ApiAuth, MaybeAuth};
use crate::db::{Database, Tweet};
use crate::impl_has_auth_backend;
use crate::jwt::JwtConfig;

const MAX_TWEET_LENGTH: usize = 280;

/// State for tweet endpoints.
#[derive(Clone)]
pub struct TweetsState {
    pub db: Database,
    pub jwt: Arc<JwtConfig>,
}

impl_has_auth_backend!(TweetsState);

pub fn router(state: TweetsState) -> Router {
    Router::new()
        .route("/", post(create_tweet))
        .route("/user/{userId}", get(user_tweets))
        .route("/{tweetId}", patch(update_tweet).delete(delete_tweet))
        .with_state(state)
}

#[derive(Deserialize)]
struct TweetRequest {
    content: String,
}

fn validate_content(content: &str) -> Result<&str, ApiError> {
    let content = content.trim();
    if content.is_empty() {
        return Err(ApiError::bad_request("Tweet content is required"));
    }
    if content.chars().count() > MAX_TWEET_LENGTH {
        return Err(ApiError::bad_request(format!(
            "Tweet content must not exceed {} characters",
            MAX_TWEET_LENGTH
        )));
    }
    Ok(content)
}

/// Load a tweet and enforce ownership.
async fn load_owned_tweet(
    state: &TweetsState,
    actor_id: i64,
    id: &str,
    action: &str,
) -> Result<Tweet, ApiError> {
    validate_uuid(id)?;
    let tweet = state
        .db
        .tweets()
        .get_by_uuid(id)
        .await
        .db_err("Failed to load tweet")?
        .ok_or_else(|| ApiError::not_found("Tweet not found"))?;
    if tweet.owner_id != actor_id {
        return Err(ApiError::forbidden(format!(
            "You can only {} your own tweets",
            action
        )));
    }
    Ok(tweet)
}

/// POST / - Create a tweet.
async fn create_tweet(
    State(state): State<TweetsState>,
    ApiAuth(actor): ApiAuth,
    Json(payload): Json<TweetRequest>,
) -> ApiResult<TweetView> {
    let content = validate_content(&payload.content)?;

    let uuid = state
        .db
        .tweets()
        .create(actor.id, content)
        .await
        .db_err("Failed to create tweet")?;

    let tweet = state
        .db
        .tweets()
        .get_with_meta(&uuid, Some(actor.id))
        .await
        .db_err("Failed to load created tweet")?
        .ok_or_else(|| ApiError::internal("Created tweet not found"))?;

    Ok(ApiResponse::created(
        tweet.into(),
        "Tweet created successfully",
    ))
}

/// GET /user/{userId} - A user's tweets, newest first.
async fn user_tweets(
    State(state): State<TweetsState>,
    MaybeAuth(viewer): MaybeAuth,
    Path(user_id): Path<String>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Page<TweetView>> {
    validate_uuid(&user_id)?;
    let user = state
        .db
        .users()
        .get_by_uuid(&user_id)
        .await
        .db_err("Failed to look up user")?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    let (page, limit, offset) = query.resolve();
    let (tweets, total) = state
        .db
        .tweets()
        .list_for_user(user.id, viewer.as_ref().map(|v| v.id), limit, offset)
        .await
        .db_err("Failed to list tweets")?;

    Ok(ApiResponse::ok(
        Page::new(
            tweets.into_iter().map(Into::into).collect(),
            total,
            page,
            limit,
        ),
        "User tweets fetched successfully",
    ))
}

/// PATCH /{tweetId} - Edit a tweet.
async fn update_tweet(
    State(state): State<TweetsState>,
    ApiAuth(actor): ApiAuth,
    Path(tweet_id): Path<String>,
    Json(payload): Json<TweetRequest>,
) -> ApiResult<TweetView> {
    let content = validate_content(&payload.content)?;
    let tweet = load_owned_tweet(&state, actor.id, &tweet_id, "edit").await?;

    state
        .db
        .tweets()
        .update_content(tweet.id, content)
        .await
        .db_err("Failed to update tweet")?;

    let tweet = state
        .db
        .tweets()
        .get_with_meta(&tweet.uuid, Some(actor.id))
        .await
        .db_err("Failed to load updated tweet")?
        .ok_or_else(|| ApiError::internal("Updated tweet not found"))?;

    Ok(ApiResponse::ok(tweet.into(), "Tweet updated successfully"))
}

/// DELETE /{tweetId} - Remove a tweet and its likes.
async fn delete_tweet(
    State(state): State<TweetsState>,
    ApiAuth(actor): ApiAuth,
    Path(tweet_id): Path<String>,
) -> ApiResult<serde_json::Value> {
    let tweet = load_owned_tweet(&state, actor.id, &tweet_id, "delete").await?;

    state
        .db
        .tweets()
        .delete(tweet.id)
        .await
        .db_err("Failed to delete tweet")?;

    Ok(ApiResponse::ok(
        serde_json::json!({}),
        "Tweet deleted successfully",
    ))
}
