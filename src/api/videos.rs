//! Videos API: publishing, listing with filters, view counting, ownership-
//! scoped mutation, and publish toggling.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{delete, get, patch, post},
};
use serde::Deserialize;
use std::sync::Arc;

use super::error::{ApiError, ResultExt, validate_uuid};
use super::pagination::{Page, PageQuery};
use super::response::{ApiResponse, ApiResult};
use super::views::{VideoDetailView, VideoView};
use crate::auth::{ApiAuth, MaybeAuth};
use crate::db::{Database, Video, VideoQuery, VideoSort};
use crate::impl_has_auth_backend;
use crate::jwt::JwtConfig;
use crate::media::{MediaStore, delete_best_effort};

/// State for video endpoints.
#[derive(Clone)]
pub struct VideosState {
    pub db: Database,
    pub jwt: Arc<JwtConfig>,
    pub media: Arc<dyn MediaStore>,
}

impl_has_auth_backend!(VideosState);

pub fn router(state: VideosState) -> Router {
    Router::new()
        .route("/", get(list_videos))
        .route("/", post(publish_video))
        .route("/{id}", get(get_video))
        .route("/{id}", patch(update_video))
        .route("/{id}", delete(delete_video))
        .route("/toggle/publish/{id}", patch(toggle_publish))
        .with_state(state)
}

// --- Request types ---

#[derive(Deserialize)]
struct MediaRef {
    url: String,
    #[serde(rename = "fileRef")]
    file_ref: String,
}

#[derive(Deserialize)]
struct PublishVideoRequest {
    title: String,
    description: String,
    #[serde(rename = "videoFile")]
    video_file: MediaRef,
    thumbnail: MediaRef,
    duration: Option<f64>,
}

#[derive(Deserialize)]
struct UpdateVideoRequest {
    title: Option<String>,
    description: Option<String>,
    thumbnail: Option<MediaRef>,
}

#[derive(Deserialize)]
struct ListQuery {
    page: Option<i64>,
    limit: Option<i64>,
    query: Option<String>,
    #[serde(rename = "sortBy")]
    sort_by: Option<String>,
    #[serde(rename = "sortType")]
    sort_type: Option<String>,
    #[serde(rename = "userId")]
    user_id: Option<String>,
}

/// Parse a caller-supplied sort field against the whitelist.
pub(super) fn parse_sort(sort_by: Option<&str>) -> Result<VideoSort, ApiError> {
    match sort_by {
        None | Some("createdAt") => Ok(VideoSort::CreatedAt),
        Some("views") => Ok(VideoSort::Views),
        Some("duration") => Ok(VideoSort::Duration),
        Some("title") => Ok(VideoSort::Title),
        Some(other) => Err(ApiError::bad_request(format!(
            "Unknown sort field: {}",
            other
        ))),
    }
}

/// Parse a caller-supplied sort direction. Default: descending.
pub(super) fn parse_direction(sort_type: Option<&str>) -> Result<bool, ApiError> {
    match sort_type {
        None | Some("desc") => Ok(true),
        Some("asc") => Ok(false),
        Some(other) => Err(ApiError::bad_request(format!(
            "Unknown sort direction: {}",
            other
        ))),
    }
}

fn validate_media_ref(media: &MediaRef, what: &str) -> Result<(), ApiError> {
    if media.url.trim().is_empty() || media.file_ref.trim().is_empty() {
        return Err(ApiError::bad_request(format!(
            "{} url and fileRef are required",
            what
        )));
    }
    Ok(())
}

/// Load a video by path id and enforce that the actor owns it.
async fn load_owned_video(
    state: &VideosState,
    actor_id: i64,
    id: &str,
) -> Result<Video, ApiError> {
    validate_uuid(id)?;
    let video = state
        .db
        .videos()
        .get_by_uuid(id)
        .await
        .db_err("Failed to load video")?
        .ok_or_else(|| ApiError::not_found("Video not found"))?;
    if video.owner_id != actor_id {
        return Err(ApiError::forbidden("You can only modify your own videos"));
    }
    Ok(video)
}

// --- Handlers ---

/// GET / - Paginated listing. Anonymous callers see published videos only;
/// an authenticated caller additionally sees their own drafts.
async fn list_videos(
    State(state): State<VideosState>,
    MaybeAuth(viewer): MaybeAuth,
    Query(query): Query<ListQuery>,
) -> ApiResult<Page<VideoView>> {
    let (page, limit, offset) = PageQuery {
        page: query.page,
        limit: query.limit,
    }
    .resolve();
    let sort = parse_sort(query.sort_by.as_deref())?;
    let descending = parse_direction(query.sort_type.as_deref())?;

    let owner_id = match query.user_id.as_deref() {
        Some(user_id) => {
            validate_uuid(user_id)?;
            let owner = state
                .db
                .users()
                .get_by_uuid(user_id)
                .await
                .db_err("Failed to look up user")?
                .ok_or_else(|| ApiError::not_found("User not found"))?;
            Some(owner.id)
        }
        None => None,
    };

    let (items, total) = state
        .db
        .videos()
        .list(&VideoQuery {
            q: query.query.clone().filter(|s| !s.trim().is_empty()),
            owner_id,
            viewer_id: viewer.as_ref().map(|v| v.id),
            sort,
            descending,
            limit,
            offset,
        })
        .await
        .db_err("Failed to list videos")?;

    Ok(ApiResponse::ok(
        Page::new(items.into_iter().map(Into::into).collect(), total, page, limit),
        "Videos fetched successfully",
    ))
}

/// POST / - Publish a video from already-uploaded media references.
/// New videos start as drafts.
async fn publish_video(
    State(state): State<VideosState>,
    ApiAuth(actor): ApiAuth,
    Json(payload): Json<PublishVideoRequest>,
) -> ApiResult<VideoDetailView> {
    let title = payload.title.trim();
    let description = payload.description.trim();
    if title.is_empty() {
        return Err(ApiError::bad_request("Title is required"));
    }
    if description.is_empty() {
        return Err(ApiError::bad_request("Description is required"));
    }
    validate_media_ref(&payload.video_file, "Video file")?;
    validate_media_ref(&payload.thumbnail, "Thumbnail")?;
    let duration = payload.duration.unwrap_or(0.0);
    if duration < 0.0 {
        return Err(ApiError::bad_request("Duration cannot be negative"));
    }

    let uuid = state
        .db
        .videos()
        .create(
            actor.id,
            title,
            description,
            payload.video_file.url.trim(),
            payload.video_file.file_ref.trim(),
            payload.thumbnail.url.trim(),
            payload.thumbnail.file_ref.trim(),
            duration,
        )
        .await
        .db_err("Failed to create video")?;

    let detail = state
        .db
        .videos()
        .get_detail(&uuid, Some(actor.id))
        .await
        .db_err("Failed to load created video")?
        .ok_or_else(|| ApiError::internal("Created video not found"))?;

    Ok(ApiResponse::created(
        detail.into(),
        "Video uploaded successfully",
    ))
}

/// GET /{id} - Fetch a single video. Every read of a published video counts
/// one view; authenticated readers also get a watch history entry. Drafts
/// are visible to their owner only, without view counting.
async fn get_video(
    State(state): State<VideosState>,
    MaybeAuth(viewer): MaybeAuth,
    Path(id): Path<String>,
) -> ApiResult<VideoDetailView> {
    validate_uuid(&id)?;
    let viewer_id = viewer.as_ref().map(|v| v.id);

    let video = state
        .db
        .videos()
        .get_by_uuid(&id)
        .await
        .db_err("Failed to load video")?
        .ok_or_else(|| ApiError::not_found("Video not found"))?;

    if !video.published && viewer_id != Some(video.owner_id) {
        return Err(ApiError::forbidden("This video is not available"));
    }

    if video.published {
        state
            .db
            .videos()
            .record_view(video.id, viewer_id)
            .await
            .db_err("Failed to record view")?;
    }

    let detail = state
        .db
        .videos()
        .get_detail(&id, viewer_id)
        .await
        .db_err("Failed to load video")?
        .ok_or_else(|| ApiError::not_found("Video not found"))?;

    Ok(ApiResponse::ok(detail.into(), "Video fetched successfully"))
}

/// PATCH /{id} - Partial update of title/description/thumbnail.
async fn update_video(
    State(state): State<VideosState>,
    ApiAuth(actor): ApiAuth,
    Path(id): Path<String>,
    Json(payload): Json<UpdateVideoRequest>,
) -> ApiResult<VideoDetailView> {
    let title = payload
        .title
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());
    let description = payload
        .description
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());
    if title.is_none() && description.is_none() && payload.thumbnail.is_none() {
        return Err(ApiError::bad_request("Nothing to update"));
    }
    if let Some(ref thumbnail) = payload.thumbnail {
        validate_media_ref(thumbnail, "Thumbnail")?;
    }

    let video = load_owned_video(&state, actor.id, &id).await?;

    let thumbnail = payload
        .thumbnail
        .as_ref()
        .map(|t| (t.url.trim(), t.file_ref.trim()));
    let old_thumb_ref = state
        .db
        .videos()
        .update_details(video.id, title, description, thumbnail)
        .await
        .db_err("Failed to update video")?;
    delete_best_effort(&state.media, old_thumb_ref.as_deref()).await;

    let detail = state
        .db
        .videos()
        .get_detail(&id, Some(actor.id))
        .await
        .db_err("Failed to load updated video")?
        .ok_or_else(|| ApiError::internal("Updated video not found"))?;

    Ok(ApiResponse::ok(detail.into(), "Video updated successfully"))
}

/// DELETE /{id} - Remove a video and everything referencing it; the stored
/// objects are cleaned up best-effort after the database commit.
async fn delete_video(
    State(state): State<VideosState>,
    ApiAuth(actor): ApiAuth,
    Path(id): Path<String>,
) -> ApiResult<serde_json::Value> {
    let video = load_owned_video(&state, actor.id, &id).await?;

    state
        .db
        .videos()
        .delete(video.id)
        .await
        .db_err("Failed to delete video")?;

    delete_best_effort(&state.media, Some(&video.video_ref)).await;
    delete_best_effort(&state.media, Some(&video.thumbnail_ref)).await;

    Ok(ApiResponse::ok(
        serde_json::json!({}),
        "Video deleted successfully",
    ))
}

/// PATCH /toggle/publish/{id} - Flip the published flag.
async fn toggle_publish(
    State(state): State<VideosState>,
    ApiAuth(actor): ApiAuth,
    Path(id): Path<String>,
) -> ApiResult<serde_json::Value> {
    let video = load_owned_video(&state, actor.id, &id).await?;

    let published = state
        .db
        .videos()
        .toggle_published(video.id)
        .await
        .db_err("Failed to toggle publish status")?;

    let message = if published {
        "Video published successfully"
    } else {
        "Video unpublished successfully"
    };
    Ok(ApiResponse::ok(
        serde_json::json!({ "published": published }),
        message,
    ))
}
