//! Dashboard API: channel analytics for the authenticated owner.

use axum::{
    Router,
    extract::{Query, State},
    routing::get,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::error::{ApiError, ResultExt};
use super::pagination::{Page, PageQuery};
use super::response::{ApiResponse, ApiResult};
use super::videos::{parse_direction, parse_sort};
use super::views::ChannelVideoView;
use crate::auth::ApiAuth;
use crate::db::{Database, TopVideo};
use crate::impl_has_auth_backend;
use crate::jwt::JwtConfig;

/// State for dashboard endpoints.
#[derive(Clone)]
pub struct DashboardState {
    pub db: Database,
    pub jwt: Arc<JwtConfig>,
}

impl_has_auth_backend!(DashboardState);

pub fn router(state: DashboardState) -> Router {
    Router::new()
        .route("/stats", get(channel_stats))
        .route("/videos", get(channel_videos))
        .with_state(state)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct OverviewView {
    total_videos: i64,
    published_videos: i64,
    draft_videos: i64,
    total_views: i64,
    total_likes: i64,
    total_comments: i64,
    total_duration: f64,
    subscribers_count: i64,
    subscriptions_count: i64,
    playlists_count: i64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RecentActivityView {
    videos_last_30_days: i64,
    views_last_30_days: i64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ChannelStatsView {
    overview: OverviewView,
    recent_activity: RecentActivityView,
    top_video: Option<TopVideo>,
}

#[derive(Deserialize)]
struct ChannelVideosQuery {
    page: Option<i64>,
    limit: Option<i64>,
    status: Option<String>,
    #[serde(rename = "sortBy")]
    sort_by: Option<String>,
    #[serde(rename = "sortType")]
    sort_type: Option<String>,
}

/// GET /stats - Aggregate statistics for the caller's channel.
async fn channel_stats(
    State(state): State<DashboardState>,
    ApiAuth(actor): ApiAuth,
) -> ApiResult<ChannelStatsView> {
    let stats = state
        .db
        .videos()
        .channel_stats(actor.id)
        .await
        .db_err("Failed to compute channel stats")?;
    let subscribers_count = state
        .db
        .subscriptions()
        .count_subscribers(actor.id)
        .await
        .db_err("Failed to count subscribers")?;
    let subscriptions_count = state
        .db
        .subscriptions()
        .count_subscriptions(actor.id)
        .await
        .db_err("Failed to count subscriptions")?;
    let playlists_count = state
        .db
        .playlists()
        .count_for_owner(actor.id)
        .await
        .db_err("Failed to count playlists")?;

    Ok(ApiResponse::ok(
        ChannelStatsView {
            overview: OverviewView {
                total_videos: stats.total_videos,
                published_videos: stats.published_videos,
                draft_videos: stats.draft_videos,
                total_views: stats.total_views,
                total_likes: stats.total_likes,
                total_comments: stats.total_comments,
                total_duration: stats.total_duration,
                subscribers_count,
                subscriptions_count,
                playlists_count,
            },
            recent_activity: RecentActivityView {
                videos_last_30_days: stats.videos_last_30_days,
                views_last_30_days: stats.views_last_30_days,
            },
            top_video: stats.top_video,
        },
        "Channel stats fetched successfully",
    ))
}

/// GET /videos - The caller's videos with engagement counts, drafts
/// included, optionally filtered by publish status.
async fn channel_videos(
    State(state): State<DashboardState>,
    ApiAuth(actor): ApiAuth,
    Query(query): Query<ChannelVideosQuery>,
) -> ApiResult<Page<ChannelVideoView>> {
    let (page, limit, offset) = PageQuery {
        page: query.page,
        limit: query.limit,
    }
    .resolve();
    let sort = parse_sort(query.sort_by.as_deref())?;
    let descending = parse_direction(query.sort_type.as_deref())?;
    let published = match query.status.as_deref() {
        None | Some("all") => None,
        Some("published") => Some(true),
        Some("draft") => Some(false),
        Some(other) => {
            return Err(ApiError::bad_request(format!(
                "Unknown status filter: {}",
                other
            )));
        }
    };

    let (videos, total) = state
        .db
        .videos()
        .channel_videos(actor.id, published, sort, descending, limit, offset)
        .await
        .db_err("Failed to list channel videos")?;

    Ok(ApiResponse::ok(
        Page::new(
            videos.into_iter().map(Into::into).collect(),
            total,
            page,
            limit,
        ),
        "Channel videos fetched successfully",
    ))
}
