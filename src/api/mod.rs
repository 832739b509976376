mod comments;
mod dashboard;
mod error;
mod healthcheck;
mod likes;
mod pagination;
mod playlists;
mod response;
mod subscriptions;
mod tweets;
mod users;
mod videos;
mod views;

use axum::Router;
use std::sync::Arc;

use crate::db::Database;
use crate::jwt::JwtConfig;
use crate::media::MediaStore;
use crate::rate_limit::RateLimitConfig;

pub use error::{ApiError, ResultExt, validate_uuid};
pub use pagination::{Page, PageQuery};
pub use response::{ApiResponse, ApiResult};

/// Create the API router.
pub fn create_api_router(
    db: Database,
    jwt: Arc<JwtConfig>,
    media: Arc<dyn MediaStore>,
    secure_cookies: bool,
) -> Router {
    let rate_limits = Arc::new(RateLimitConfig::new());

    let users_state = users::UsersState {
        db: db.clone(),
        jwt: jwt.clone(),
        media: media.clone(),
        secure_cookies,
    };

    let videos_state = videos::VideosState {
        db: db.clone(),
        jwt: jwt.clone(),
        media,
    };

    let comments_state = comments::CommentsState {
        db: db.clone(),
        jwt: jwt.clone(),
    };

    let likes_state = likes::LikesState {
        db: db.clone(),
        jwt: jwt.clone(),
    };

    let tweets_state = tweets::TweetsState {
        db: db.clone(),
        jwt: jwt.clone(),
    };

    let playlists_state = playlists::PlaylistsState {
        db: db.clone(),
        jwt: jwt.clone(),
    };

    let subscriptions_state = subscriptions::SubscriptionsState {
        db: db.clone(),
        jwt: jwt.clone(),
    };

    let dashboard_state = dashboard::DashboardState {
        db: db.clone(),
        jwt,
    };

    let health_state = healthcheck::HealthState { db };

    Router::new()
        .nest("/users", users::router(users_state, rate_limits))
        .nest("/videos", videos::router(videos_state))
        .nest("/comments", comments::router(comments_state))
        .nest("/likes", likes::router(likes_state))
        .nest("/tweets", tweets::router(tweets_state))
        .nest("/playlists", playlists::router(playlists_state))
        .nest("/subscriptions", subscriptions::router(subscriptions_state))
        .nest("/dashboard", dashboard::router(dashboard_state))
        .nest("/healthcheck", healthcheck::router(health_state))
}
