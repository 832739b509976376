//! Comments API: paginated listing per video plus ownership-scoped
//! create/update/delete.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, patch},
};
use serde::Deserialize;
use std::sync::Arc;

use super::error::{ApiError, ResultExt, validate_uuid};
use super::pagination::{Page, PageQuery};
use super::response::{ApiResponse, ApiResult};
use super::views::CommentView;
use crate::auth::ApiAuth;
use crate::db::{Comment, Database};
use crate::impl_has_auth_backend;
use crate::jwt::JwtConfig;

/// State for comment endpoints.
#[derive(Clone)]
pub struct CommentsState {
    pub db: Database,
    pub jwt: Arc<JwtConfig>,
}

impl_has_auth_backend!(CommentsState);

pub fn router(state: CommentsState) -> Router {
    Router::new()
        .route("/{videoId}", get(list_comments).post(add_comment))
        .route("/c/{commentId}", patch(update_comment).delete(delete_comment))
        .with_state(state)
}

#[derive(Deserialize)]
struct CommentRequest {
    content: String,
}

fn validate_content(content: &str) -> Result<&str, ApiError> {
    let content = content.trim();
    if content.is_empty() {
        return Err(ApiError::bad_request("Comment content is required"));
    }
    Ok(content)
}

/// Resolve a video by path id, 404 on miss.
async fn resolve_video_id(state: &CommentsState, id: &str) -> Result<i64, ApiError> {
    validate_uuid(id)?;
    let video = state
        .db
        .videos()
        .get_by_uuid(id)
        .await
        .db_err("Failed to load video")?
        .ok_or_else(|| ApiError::not_found("Video not found"))?;
    Ok(video.id)
}

/// Load a comment and enforce ownership.
async fn load_owned_comment(
    state: &CommentsState,
    actor_id: i64,
    id: &str,
    action: &str,
) -> Result<Comment, ApiError> {
    validate_uuid(id)?;
    let comment = state
        .db
        .comments()
        .get_by_uuid(id)
        .await
        .db_err("Failed to load comment")?
        .ok_or_else(|| ApiError::not_found("Comment not found"))?;
    if comment.owner_id != actor_id {
        return Err(ApiError::forbidden(format!(
            "You can only {} your own comments",
            action
        )));
    }
    Ok(comment)
}

/// GET /{videoId} - Comments on a video, newest first.
async fn list_comments(
    State(state): State<CommentsState>,
    Path(video_id): Path<String>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Page<CommentView>> {
    let video_id = resolve_video_id(&state, &video_id).await?;
    let (page, limit, offset) = query.resolve();

    let (comments, total) = state
        .db
        .comments()
        .list_for_video(video_id, limit, offset)
        .await
        .db_err("Failed to list comments")?;

    Ok(ApiResponse::ok(
        Page::new(
            comments.into_iter().map(Into::into).collect(),
            total,
            page,
            limit,
        ),
        "Comments fetched successfully",
    ))
}

/// POST /{videoId} - Add a comment.
async fn add_comment(
    State(state): State<CommentsState>,
    ApiAuth(actor): ApiAuth,
    Path(video_id): Path<String>,
    Json(payload): Json<CommentRequest>,
) -> ApiResult<CommentView> {
    let content = validate_content(&payload.content)?;
    let video_id = resolve_video_id(&state, &video_id).await?;

    let uuid = state
        .db
        .comments()
        .create(video_id, actor.id, content)
        .await
        .db_err("Failed to create comment")?;

    let comment = state
        .db
        .comments()
        .get_with_owner(&uuid)
        .await
        .db_err("Failed to load created comment")?
        .ok_or_else(|| ApiError::internal("Created comment not found"))?;

    Ok(ApiResponse::created(
        comment.into(),
        "Comment added successfully",
    ))
}

/// PATCH /c/{commentId} - Edit a comment.
async fn update_comment(
    State(state): State<CommentsState>,
    ApiAuth(actor): ApiAuth,
    Path(comment_id): Path<String>,
    Json(payload): Json<CommentRequest>,
) -> ApiResult<CommentView> {
    let content = validate_content(&payload.content)?;
    let comment = load_owned_comment(&state, actor.id, &comment_id, "edit").await?;

    state
        .db
        .comments()
        .update_content(comment.id, content)
        .await
        .db_err("Failed to update comment")?;

    let comment = state
        .db
        .comments()
        .get_with_owner(&comment.uuid)
        .await
        .db_err("Failed to load updated comment")?
        .ok_or_else(|| ApiError::internal("Updated comment not found"))?;

    Ok(ApiResponse::ok(
        comment.into(),
        "Comment updated successfully",
    ))
}

/// DELETE /c/{commentId} - Remove a comment and its likes.
async fn delete_comment(
    State(state): State<CommentsState>,
    ApiAuth(actor): ApiAuth,
    Path(comment_id): Path<String>,
) -> ApiResult<serde_json::Value> {
    let comment = load_owned_comment(&state, actor.id, &comment_id, "delete").await?;

    state
        .db
        .comments()
        .delete(comment.id)
        .await
        .db_err("Failed to delete comment")?;

    Ok(ApiResponse::ok(
        serde_json::json!({}),
        "Comment deleted successfully",
    ))
}
