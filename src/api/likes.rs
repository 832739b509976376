//! Likes API: idempotent toggles against a single tagged target, and the
//! caller's liked-videos listing.

use axum::{
    Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use std::sync::Arc;

use super::error::{ApiError, ResultExt, validate_uuid};
use super::pagination::{Page, PageQuery};
use super::response::{ApiResponse, ApiResult};
use super::views::LikedVideoView;
use crate::auth::ApiAuth;
use crate::db::{Database, LikeTarget};
use crate::impl_has_auth_backend;
use crate::jwt::JwtConfig;

/// State for like endpoints.
#[derive(Clone)]
pub struct LikesState {
    pub db: Database,
    pub jwt: Arc<JwtConfig>,
}

impl_has_auth_backend!(LikesState);

pub fn router(state: LikesState) -> Router {
    Router::new()
        .route("/toggle/v/{videoId}", post(toggle_video_like))
        .route("/toggle/c/{commentId}", post(toggle_comment_like))
        .route("/toggle/t/{tweetId}", post(toggle_tweet_like))
        .route("/videos", get(liked_videos))
        .with_state(state)
}

/// Run the toggle and phrase the reached state for the caller.
async fn toggle(
    state: &LikesState,
    actor_id: i64,
    target: LikeTarget,
    noun: &str,
) -> ApiResult<serde_json::Value> {
    let liked = state
        .db
        .likes()
        .toggle(actor_id, target)
        .await
        .db_err("Failed to toggle like")?;

    let message = if liked {
        format!("{} liked successfully", noun)
    } else {
        format!("{} unliked successfully", noun)
    };
    Ok(ApiResponse::ok(serde_json::json!({ "liked": liked }), message))
}

/// POST /toggle/v/{videoId}
async fn toggle_video_like(
    State(state): State<LikesState>,
    ApiAuth(actor): ApiAuth,
    Path(video_id): Path<String>,
) -> ApiResult<serde_json::Value> {
    validate_uuid(&video_id)?;
    let video = state
        .db
        .videos()
        .get_by_uuid(&video_id)
        .await
        .db_err("Failed to load video")?
        .ok_or_else(|| ApiError::not_found("Video not found"))?;

    toggle(&state, actor.id, LikeTarget::Video(video.id), "Video").await
}

/// POST /toggle/c/{commentId}
async fn toggle_comment_like(
    State(state): State<LikesState>,
    ApiAuth(actor): ApiAuth,
    Path(comment_id): Path<String>,
) -> ApiResult<serde_json::Value> {
    validate_uuid(&comment_id)?;
    let comment = state
        .db
        .comments()
        .get_by_uuid(&comment_id)
        .await
        .db_err("Failed to load comment")?
        .ok_or_else(|| ApiError::not_found("Comment not found"))?;

    toggle(&state, actor.id, LikeTarget::Comment(comment.id), "Comment").await
}

/// POST /toggle/t/{tweetId}
async fn toggle_tweet_like(
    State(state): State<LikesState>,
    ApiAuth(actor): ApiAuth,
    Path(tweet_id): Path<String>,
) -> ApiResult<serde_json::Value> {
    validate_uuid(&tweet_id)?;
    let tweet = state
        .db
        .tweets()
        .get_by_uuid(&tweet_id)
        .await
        .db_err("Failed to load tweet")?
        .ok_or_else(|| ApiError::not_found("Tweet not found"))?;

    toggle(&state, actor.id, LikeTarget::Tweet(tweet.id), "Tweet").await
}

/// GET /videos - Videos the caller has liked, most recently liked first.
async fn liked_videos(
    State(state): State<LikesState>,
    ApiAuth(actor): ApiAuth,
    Query(query): Query<PageQuery>,
) -> ApiResult<Page<LikedVideoView>> {
    let (page, limit, offset) = query.resolve();

    let (items, total) = state
        .db
        .likes()
        .liked_videos(actor.id, limit, offset)
        .await
        .db_err("Failed to list liked videos")?;

    Ok(ApiResponse::ok(
        Page::new(items.into_iter().map(Into::into).collect(), total, page, limit),
        "Liked videos fetched successfully",
    ))
}
