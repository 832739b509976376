//! Users API: registration, the session lifecycle (login, refresh, logout),
//! profile management, channel profiles, and watch history.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{header::SET_COOKIE, request::Parts},
    middleware,
    response::{AppendHeaders, IntoResponse},
    routing::{get, patch, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::error::{ApiError, ResultExt};
use super::pagination::{Page, PageQuery};
use super::response::{ApiResponse, ApiResult};
use super::views::{UserView, WatchEntryView};
use crate::auth::{
    ACCESS_COOKIE_NAME, ApiAuth, MaybeAuth, REFRESH_COOKIE_NAME, SessionManager, TokenPair,
    build_auth_cookie, clear_cookie, get_cookie,
};
use crate::db::Database;
use crate::impl_has_auth_backend;
use crate::jwt::JwtConfig;
use crate::media::{MediaStore, delete_best_effort};
use crate::password::{hash_password, verify_password};
use crate::rate_limit::{RateLimitConfig, rate_limit_login, rate_limit_register};

const MIN_USERNAME_LENGTH: usize = 3;
const MAX_USERNAME_LENGTH: usize = 50;
const MIN_PASSWORD_LENGTH: usize = 8;

/// State for user endpoints.
#[derive(Clone)]
pub struct UsersState {
    pub db: Database,
    pub jwt: Arc<JwtConfig>,
    pub media: Arc<dyn MediaStore>,
    pub secure_cookies: bool,
}

impl_has_auth_backend!(UsersState);

pub fn router(state: UsersState, rate_limits: Arc<RateLimitConfig>) -> Router {
    let register_routes = Router::new()
        .route("/register", post(register))
        .layer(middleware::from_fn_with_state(
            rate_limits.clone(),
            rate_limit_register,
        ));
    let login_routes = Router::new()
        .route("/login", post(login))
        .layer(middleware::from_fn_with_state(rate_limits, rate_limit_login));

    Router::new()
        .merge(register_routes)
        .merge(login_routes)
        .route("/refresh-token", post(refresh_token))
        .route("/logout", post(logout))
        .route("/change-password", post(change_password))
        .route("/current-user", get(current_user))
        .route("/update-account", patch(update_account))
        .route("/avatar", patch(update_avatar))
        .route("/cover-image", patch(update_cover))
        .route("/c/{username}", get(channel_profile))
        .route("/history", get(watch_history))
        .with_state(state)
}

// --- Request/Response types ---

#[derive(Deserialize)]
struct RegisterRequest {
    fullname: String,
    email: String,
    username: String,
    password: String,
}

#[derive(Deserialize)]
struct LoginRequest {
    username: Option<String>,
    email: Option<String>,
    password: String,
}

#[derive(Deserialize)]
struct RefreshRequest {
    #[serde(rename = "refreshToken")]
    refresh_token: Option<String>,
}

#[derive(Deserialize)]
struct ChangePasswordRequest {
    #[serde(rename = "oldPassword")]
    old_password: String,
    #[serde(rename = "newPassword")]
    new_password: String,
}

#[derive(Deserialize)]
struct UpdateAccountRequest {
    fullname: Option<String>,
    email: Option<String>,
}

#[derive(Deserialize)]
struct MediaRefRequest {
    url: String,
    #[serde(rename = "fileRef")]
    file_ref: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionResponse {
    user: UserView,
    access_token: String,
    refresh_token: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TokensResponse {
    access_token: String,
    refresh_token: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ChannelProfileView {
    id: String,
    username: String,
    fullname: String,
    email: String,
    avatar_url: Option<String>,
    cover_url: Option<String>,
    subscribers_count: i64,
    subscribed_to_count: i64,
    is_subscribed: bool,
}

// --- Validation helpers ---

fn validate_username(username: &str) -> Result<(), ApiError> {
    if username.len() < MIN_USERNAME_LENGTH {
        return Err(ApiError::bad_request(format!(
            "Username must be at least {} characters",
            MIN_USERNAME_LENGTH
        )));
    }
    if username.len() > MAX_USERNAME_LENGTH {
        return Err(ApiError::bad_request(format!(
            "Username must be at most {} characters",
            MAX_USERNAME_LENGTH
        )));
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(ApiError::bad_request(
            "Username can only contain letters, numbers, underscore, and hyphen",
        ));
    }
    Ok(())
}

fn validate_email(email: &str) -> Result<(), ApiError> {
    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 || parts[0].is_empty() || !parts[1].contains('.') {
        return Err(ApiError::bad_request("Invalid email format"));
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), ApiError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(ApiError::bad_request(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        )));
    }
    Ok(())
}

/// Auth cookies carrying a fresh token pair.
fn session_cookies(pair: &TokenPair, secure: bool) -> AppendHeaders<[(axum::http::HeaderName, String); 2]> {
    AppendHeaders([
        (
            SET_COOKIE,
            build_auth_cookie(
                ACCESS_COOKIE_NAME,
                &pair.access_token,
                pair.access_expires_in,
                secure,
            ),
        ),
        (
            SET_COOKIE,
            build_auth_cookie(
                REFRESH_COOKIE_NAME,
                &pair.refresh_token,
                pair.refresh_expires_in,
                secure,
            ),
        ),
    ])
}

// --- Handlers ---

/// POST /register - Create a new account.
async fn register(
    State(state): State<UsersState>,
    Json(payload): Json<RegisterRequest>,
) -> ApiResult<UserView> {
    let fullname = payload.fullname.trim().to_string();
    let username = payload.username.trim().to_lowercase();
    let email = payload.email.trim().to_lowercase();

    if fullname.is_empty() || username.is_empty() || email.is_empty() || payload.password.is_empty()
    {
        return Err(ApiError::bad_request("All fields are required"));
    }
    validate_username(&username)?;
    validate_email(&email)?;
    validate_password(&payload.password)?;

    if state
        .db
        .users()
        .exists(&username, &email)
        .await
        .db_err("Failed to check existing users")?
    {
        return Err(ApiError::bad_request("User already exists"));
    }

    let password_hash = hash_password(&payload.password).map_err(|e| {
        tracing::error!("Password hashing failed: {}", e);
        ApiError::internal("Failed to create account")
    })?;

    let uuid = uuid::Uuid::new_v4().to_string();
    state
        .db
        .users()
        .create(&uuid, &username, &email, &fullname, &password_hash)
        .await
        .db_err("Failed to create user")?;

    let user = state
        .db
        .users()
        .get_by_uuid(&uuid)
        .await
        .db_err("Failed to load created user")?
        .ok_or_else(|| ApiError::internal("Created user not found"))?;

    Ok(ApiResponse::created(
        user.into(),
        "User registered successfully",
    ))
}

/// POST /login - Verify credentials and start a session.
async fn login(
    State(state): State<UsersState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = match (&payload.username, &payload.email) {
        (Some(username), _) if !username.trim().is_empty() => state
            .db
            .users()
            .get_by_username(&username.trim().to_lowercase())
            .await
            .db_err("Failed to look up user")?,
        (_, Some(email)) if !email.trim().is_empty() => state
            .db
            .users()
            .get_by_email(&email.trim().to_lowercase())
            .await
            .db_err("Failed to look up user")?,
        _ => return Err(ApiError::bad_request("Username or email is required")),
    };

    // One generic failure for unknown user and bad password alike
    let Some(user) = user else {
        return Err(ApiError::unauthorized("Invalid credentials"));
    };
    let verified = verify_password(&payload.password, &user.password_hash).map_err(|e| {
        tracing::error!("Password verification failed: {}", e);
        ApiError::internal("Failed to verify credentials")
    })?;
    if !verified {
        return Err(ApiError::unauthorized("Invalid credentials"));
    }

    let sessions = SessionManager::new(&state.db, &state.jwt);
    let pair = sessions.rotate(user.id).await?;

    let cookies = session_cookies(&pair, state.secure_cookies);
    let body = SessionResponse {
        user: user.into(),
        access_token: pair.access_token,
        refresh_token: pair.refresh_token,
    };

    Ok((
        cookies,
        ApiResponse::ok(body, "User logged in successfully"),
    ))
}

/// Pull the refresh token from cookie, header, or body (in that order).
fn extract_refresh_token(parts: &Parts, body: Option<&RefreshRequest>) -> Option<String> {
    if let Some(token) = get_cookie(&parts.headers, REFRESH_COOKIE_NAME) {
        return Some(token.to_string());
    }
    if let Some(header) = parts.headers.get("x-refresh-token") {
        if let Ok(value) = header.to_str() {
            let value = value.trim();
            if !value.is_empty() {
                return Some(value.to_string());
            }
        }
    }
    body.and_then(|b| b.refresh_token.clone())
}

/// POST /refresh-token - Exchange a valid refresh token for a new pair.
/// Both tokens rotate; the previous refresh token stops matching.
async fn refresh_token(
    State(state): State<UsersState>,
    request: axum::extract::Request,
) -> Result<impl IntoResponse, ApiError> {
    let (parts, body) = request.into_parts();
    let payload: Option<RefreshRequest> = match axum::body::to_bytes(body, 64 * 1024).await {
        Ok(bytes) if !bytes.is_empty() => serde_json::from_slice(&bytes).ok(),
        _ => None,
    };

    let presented = extract_refresh_token(&parts, payload.as_ref())
        .ok_or_else(|| ApiError::unauthorized("Refresh token is required"))?;

    let sessions = SessionManager::new(&state.db, &state.jwt);
    let user = sessions.validate_refresh(&presented).await?;
    let pair = sessions.rotate(user.id).await?;

    let cookies = session_cookies(&pair, state.secure_cookies);
    let body = TokensResponse {
        access_token: pair.access_token,
        refresh_token: pair.refresh_token,
    };

    Ok((
        cookies,
        ApiResponse::ok(body, "Access token refreshed successfully"),
    ))
}

/// POST /logout - Clear the stored refresh token and both cookies.
async fn logout(
    State(state): State<UsersState>,
    ApiAuth(user): ApiAuth,
) -> Result<impl IntoResponse, ApiError> {
    let sessions = SessionManager::new(&state.db, &state.jwt);
    sessions.invalidate(user.id).await?;

    let cookies = AppendHeaders([
        (
            SET_COOKIE,
            clear_cookie(ACCESS_COOKIE_NAME, state.secure_cookies),
        ),
        (
            SET_COOKIE,
            clear_cookie(REFRESH_COOKIE_NAME, state.secure_cookies),
        ),
    ]);

    Ok((
        cookies,
        ApiResponse::ok(serde_json::json!({}), "User logged out successfully"),
    ))
}

/// POST /change-password
async fn change_password(
    State(state): State<UsersState>,
    ApiAuth(auth): ApiAuth,
    Json(payload): Json<ChangePasswordRequest>,
) -> ApiResult<serde_json::Value> {
    validate_password(&payload.new_password)?;

    let user = state
        .db
        .users()
        .get_by_id(auth.id)
        .await
        .db_err("Failed to load user")?
        .ok_or_else(|| ApiError::unauthorized("Invalid access token"))?;

    let verified = verify_password(&payload.old_password, &user.password_hash).map_err(|e| {
        tracing::error!("Password verification failed: {}", e);
        ApiError::internal("Failed to verify credentials")
    })?;
    if !verified {
        return Err(ApiError::bad_request("Incorrect old password"));
    }

    let hash = hash_password(&payload.new_password).map_err(|e| {
        tracing::error!("Password hashing failed: {}", e);
        ApiError::internal("Failed to change password")
    })?;
    state
        .db
        .users()
        .set_password_hash(user.id, &hash)
        .await
        .db_err("Failed to update password")?;

    Ok(ApiResponse::ok(
        serde_json::json!({}),
        "Password changed successfully",
    ))
}

/// GET /current-user
async fn current_user(
    State(state): State<UsersState>,
    ApiAuth(auth): ApiAuth,
) -> ApiResult<UserView> {
    let user = state
        .db
        .users()
        .get_by_id(auth.id)
        .await
        .db_err("Failed to load user")?
        .ok_or_else(|| ApiError::unauthorized("Invalid access token"))?;

    Ok(ApiResponse::ok(user.into(), "Current user fetched successfully"))
}

/// PATCH /update-account - Partial update, returns the updated entity.
async fn update_account(
    State(state): State<UsersState>,
    ApiAuth(auth): ApiAuth,
    Json(payload): Json<UpdateAccountRequest>,
) -> ApiResult<UserView> {
    let fullname = payload
        .fullname
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);
    let email = payload
        .email
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase);

    if fullname.is_none() && email.is_none() {
        return Err(ApiError::bad_request("Nothing to update"));
    }

    if let Some(ref email) = email {
        validate_email(email)?;
        if let Some(existing) = state
            .db
            .users()
            .get_by_email(email)
            .await
            .db_err("Failed to check email")?
        {
            if existing.id != auth.id {
                return Err(ApiError::bad_request("Email already in use"));
            }
        }
    }

    state
        .db
        .users()
        .update_account(auth.id, fullname.as_deref(), email.as_deref())
        .await
        .db_err("Failed to update account")?;

    let user = state
        .db
        .users()
        .get_by_id(auth.id)
        .await
        .db_err("Failed to load updated user")?
        .ok_or_else(|| ApiError::internal("Updated user not found"))?;

    Ok(ApiResponse::ok(
        user.into(),
        "Account details updated successfully",
    ))
}

/// PATCH /avatar - Replace the avatar with an uploaded media reference.
async fn update_avatar(
    State(state): State<UsersState>,
    ApiAuth(auth): ApiAuth,
    Json(payload): Json<MediaRefRequest>,
) -> ApiResult<UserView> {
    if payload.url.trim().is_empty() || payload.file_ref.trim().is_empty() {
        return Err(ApiError::bad_request("Avatar url and fileRef are required"));
    }

    let old_ref = state
        .db
        .users()
        .set_avatar(auth.id, payload.url.trim(), payload.file_ref.trim())
        .await
        .db_err("Failed to update avatar")?;
    delete_best_effort(&state.media, old_ref.as_deref()).await;

    let user = state
        .db
        .users()
        .get_by_id(auth.id)
        .await
        .db_err("Failed to load updated user")?
        .ok_or_else(|| ApiError::internal("Updated user not found"))?;

    Ok(ApiResponse::ok(user.into(), "Avatar updated successfully"))
}

/// PATCH /cover-image - Replace the cover image.
async fn update_cover(
    State(state): State<UsersState>,
    ApiAuth(auth): ApiAuth,
    Json(payload): Json<MediaRefRequest>,
) -> ApiResult<UserView> {
    if payload.url.trim().is_empty() || payload.file_ref.trim().is_empty() {
        return Err(ApiError::bad_request(
            "Cover image url and fileRef are required",
        ));
    }

    let old_ref = state
        .db
        .users()
        .set_cover(auth.id, payload.url.trim(), payload.file_ref.trim())
        .await
        .db_err("Failed to update cover image")?;
    delete_best_effort(&state.media, old_ref.as_deref()).await;

    let user = state
        .db
        .users()
        .get_by_id(auth.id)
        .await
        .db_err("Failed to load updated user")?
        .ok_or_else(|| ApiError::internal("Updated user not found"))?;

    Ok(ApiResponse::ok(
        user.into(),
        "Cover image updated successfully",
    ))
}

/// GET /c/{username} - Channel profile with subscription counts.
async fn channel_profile(
    State(state): State<UsersState>,
    MaybeAuth(viewer): MaybeAuth,
    Path(username): Path<String>,
) -> ApiResult<ChannelProfileView> {
    let username = username.trim().to_lowercase();
    if username.is_empty() {
        return Err(ApiError::bad_request("Username is required"));
    }

    let channel = state
        .db
        .users()
        .get_by_username(&username)
        .await
        .db_err("Failed to look up channel")?
        .ok_or_else(|| ApiError::not_found("Channel not found"))?;

    let subscribers_count = state
        .db
        .subscriptions()
        .count_subscribers(channel.id)
        .await
        .db_err("Failed to count subscribers")?;
    let subscribed_to_count = state
        .db
        .subscriptions()
        .count_subscriptions(channel.id)
        .await
        .db_err("Failed to count subscriptions")?;
    let is_subscribed = match &viewer {
        Some(viewer) => state
            .db
            .subscriptions()
            .is_subscribed(viewer.id, channel.id)
            .await
            .db_err("Failed to check subscription")?,
        None => false,
    };

    Ok(ApiResponse::ok(
        ChannelProfileView {
            id: channel.uuid,
            username: channel.username,
            fullname: channel.fullname,
            email: channel.email,
            avatar_url: channel.avatar_url,
            cover_url: channel.cover_url,
            subscribers_count,
            subscribed_to_count,
            is_subscribed,
        },
        "Channel profile fetched successfully",
    ))
}

/// GET /history - The caller's watch history, most recent first.
async fn watch_history(
    State(state): State<UsersState>,
    ApiAuth(auth): ApiAuth,
    Query(query): Query<PageQuery>,
) -> ApiResult<Page<WatchEntryView>> {
    let (page, limit, offset) = query.resolve();

    let (entries, total) = state
        .db
        .videos()
        .watch_history(auth.id, limit, offset)
        .await
        .db_err("Failed to load watch history")?;

    Ok(ApiResponse::ok(
        Page::new(entries.into_iter().map(Into::into).collect(), total, page, limit),
        "Watch history fetched successfully",
    ))
}
