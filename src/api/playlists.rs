//! Playlists API: privacy-aware listings, membership management, and
//! ownership-scoped mutation.

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
use super::views::{PlaylistDetailView, PlaylistView};
use crate::auth::{ApiAuth, MaybeAuth};
use crate::db::{Database, Playlist, PlaylistPrivacy};
use crate::impl_has_auth_backend;
use crate::jwt::JwtConfig;

/// State for playlist endpoints.
#[derive(Clone)]
pub struct PlaylistsState {
    pub db: Database,
    pub jwt: Arc<JwtConfig>,
}

impl_has_auth_backend!(PlaylistsState);

pub fn router(state: PlaylistsState) -> Router {
    Router::new()
        .route("/", post(create_playlist))
        .route("/user/{userId}", get(user_playlists))
        .route("/{playlistId}", get(get_playlist).patch(update_playlist).delete(delete_playlist))
        .route("/add/{videoId}/{playlistId}", patch(add_video))
        .route("/remove/{videoId}/{playlistId}", patch(remove_video))
        .with_state(state)
}

#[derive(Deserialize)]
struct CreatePlaylistRequest {
    title: String,
    description: Option<String>,
    privacy: Option<String>,
}

#[derive(Deserialize)]
struct UpdatePlaylistRequest {
    title: Option<String>,
    description: Option<String>,
    privacy: Option<String>,
}

fn parse_privacy(privacy: Option<&str>) -> Result<Option<PlaylistPrivacy>, ApiError> {
    match privacy {
        None => Ok(None),
        Some(value) => PlaylistPrivacy::parse(value)
            .map(Some)
            .ok_or_else(|| ApiError::bad_request("Privacy must be public, private, or unlisted")),
    }
}

/// Load a playlist and enforce ownership.
async fn load_owned_playlist(
    state: &PlaylistsState,
    actor_id: i64,
    id: &str,
    action: &str,
) -> Result<Playlist, ApiError> {
    validate_uuid(id)?;
    let playlist = state
        .db
        .playlists()
        .get_by_uuid(id)
        .await
        .db_err("Failed to load playlist")?
        .ok_or_else(|| ApiError::not_found("Playlist not found"))?;
    if playlist.owner_id != actor_id {
        return Err(ApiError::forbidden(format!(
            "You can only {} your own playlists",
            action
        )));
    }
    Ok(playlist)
}

/// POST / - Create a playlist (public unless specified otherwise).
async fn create_playlist(
    State(state): State<PlaylistsState>,
    ApiAuth(actor): ApiAuth,
    Json(payload): Json<CreatePlaylistRequest>,
) -> ApiResult<PlaylistDetailView> {
    let title = payload.title.trim();
    if title.is_empty() {
        return Err(ApiError::bad_request("Playlist title is required"));
    }
    let description = payload.description.as_deref().map(str::trim).unwrap_or("");
    let privacy = parse_privacy(payload.privacy.as_deref())?.unwrap_or(PlaylistPrivacy::Public);

    let uuid = state
        .db
        .playlists()
        .create(actor.id, title, description, privacy)
        .await
        .db_err("Failed to create playlist")?;

    let detail = state
        .db
        .playlists()
        .detail(&uuid)
        .await
        .db_err("Failed to load created playlist")?
        .ok_or_else(|| ApiError::internal("Created playlist not found"))?;

    Ok(ApiResponse::created(
        detail.into(),
        "Playlist created successfully",
    ))
}

/// GET /user/{userId} - A user's playlists. Owners see everything;
/// everyone else sees public playlists only.
async fn user_playlists(
    State(state): State<PlaylistsState>,
    MaybeAuth(viewer): MaybeAuth,
    Path(user_id): Path<String>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Page<PlaylistView>> {
    validate_uuid(&user_id)?;
    let owner = state
        .db
        .users()
        .get_by_uuid(&user_id)
        .await
        .db_err("Failed to look up user")?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    let include_non_public = viewer.as_ref().map(|v| v.id) == Some(owner.id);
    let (page, limit, offset) = query.resolve();

    let (playlists, total) = state
        .db
        .playlists()
        .list_for_owner(owner.id, include_non_public, limit, offset)
        .await
        .db_err("Failed to list playlists")?;

    Ok(ApiResponse::ok(
        Page::new(
            playlists.into_iter().map(Into::into).collect(),
            total,
            page,
            limit,
        ),
        "User playlists fetched successfully",
    ))
}

/// GET /{playlistId} - Playlist detail with published member videos.
/// Private playlists are owner-only; non-owner reads bump the view counter.
async fn get_playlist(
    State(state): State<PlaylistsState>,
    MaybeAuth(viewer): MaybeAuth,
    Path(playlist_id): Path<String>,
) -> ApiResult<PlaylistDetailView> {
    validate_uuid(&playlist_id)?;
    let detail = state
        .db
        .playlists()
        .detail(&playlist_id)
        .await
        .db_err("Failed to load playlist")?
        .ok_or_else(|| ApiError::not_found("Playlist not found"))?;

    let is_owner = viewer.as_ref().map(|v| v.id) == Some(detail.playlist.owner_id);
    if detail.playlist.privacy == PlaylistPrivacy::Private && !is_owner {
        return Err(ApiError::forbidden("This playlist is private"));
    }

    if !is_owner {
        state
            .db
            .playlists()
            .increment_views(detail.playlist.id)
            .await
            .db_err("Failed to record playlist view")?;
    }

    Ok(ApiResponse::ok(
        detail.into(),
        "Playlist fetched successfully",
    ))
}

/// PATCH /add/{videoId}/{playlistId} - Add a published video.
async fn add_video(
    State(state): State<PlaylistsState>,
    ApiAuth(actor): ApiAuth,
    Path((video_id, playlist_id)): Path<(String, String)>,
) -> ApiResult<PlaylistDetailView> {
    validate_uuid(&video_id)?;
    let playlist = load_owned_playlist(&state, actor.id, &playlist_id, "modify").await?;

    let video = state
        .db
        .videos()
        .get_by_uuid(&video_id)
        .await
        .db_err("Failed to load video")?
        .filter(|v| v.published)
        .ok_or_else(|| ApiError::not_found("Video not found or not published"))?;

    let added = state
        .db
        .playlists()
        .add_video(playlist.id, video.id)
        .await
        .db_err("Failed to add video to playlist")?;
    if !added {
        return Err(ApiError::bad_request("Video already exists in playlist"));
    }

    let detail = state
        .db
        .playlists()
        .detail(&playlist.uuid)
        .await
        .db_err("Failed to load playlist")?
        .ok_or_else(|| ApiError::internal("Updated playlist not found"))?;

    Ok(ApiResponse::ok(
        detail.into(),
        "Video added to playlist successfully",
    ))
}

/// PATCH /remove/{videoId}/{playlistId} - Remove a member video.
async fn remove_video(
    State(state): State<PlaylistsState>,
    ApiAuth(actor): ApiAuth,
    Path((video_id, playlist_id)): Path<(String, String)>,
) -> ApiResult<PlaylistDetailView> {
    validate_uuid(&video_id)?;
    let playlist = load_owned_playlist(&state, actor.id, &playlist_id, "modify").await?;

    let video = state
        .db
        .videos()
        .get_by_uuid(&video_id)
        .await
        .db_err("Failed to load video")?
        .ok_or_else(|| ApiError::not_found("Video not found"))?;

    let removed = state
        .db
        .playlists()
        .remove_video(playlist.id, video.id)
        .await
        .db_err("Failed to remove video from playlist")?;
    if !removed {
        return Err(ApiError::bad_request("Video not found in playlist"));
    }

    let detail = state
        .db
        .playlists()
        .detail(&playlist.uuid)
        .await
        .db_err("Failed to load playlist")?
        .ok_or_else(|| ApiError::internal("Updated playlist not found"))?;

    Ok(ApiResponse::ok(
        detail.into(),
        "Video removed from playlist successfully",
    ))
}

/// PATCH /{playlistId} - Partial update.
async fn update_playlist(
    State(state): State<PlaylistsState>,
    ApiAuth(actor): ApiAuth,
    Path(playlist_id): Path<String>,
    Json(payload): Json<UpdatePlaylistRequest>,
) -> ApiResult<PlaylistDetailView> {
    let title = payload
        .title
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());
    let description = payload.description.as_deref().map(str::trim);
    let privacy = parse_privacy(payload.privacy.as_deref())?;

    if title.is_none() && description.is_none() && privacy.is_none() {
        return Err(ApiError::bad_request("Nothing to update"));
    }

    let playlist = load_owned_playlist(&state, actor.id, &playlist_id, "update").await?;

    state
        .db
        .playlists()
        .update(playlist.id, title, description, privacy)
        .await
        .db_err("Failed to update playlist")?;

    let detail = state
        .db
        .playlists()
        .detail(&playlist.uuid)
        .await
        .db_err("Failed to load updated playlist")?
        .ok_or_else(|| ApiError::internal("Updated playlist not found"))?;

    Ok(ApiResponse::ok(
        detail.into(),
        "Playlist updated successfully",
    ))
}

/// DELETE /{playlistId}
async fn delete_playlist(
    State(state): State<PlaylistsState>,
    ApiAuth(actor): ApiAuth,
    Path(playlist_id): Path<String>,
) -> ApiResult<serde_json::Value> {
    let playlist = load_owned_playlist(&state, actor.id, &playlist_id, "delete").await?;

    state
        .db
        .playlists()
        .delete(playlist.id)
        .await
        .db_err("Failed to delete playlist")?;

    Ok(ApiResponse::ok(
        serde_json::json!({}),
        "Playlist deleted successfully",
    ))
}
