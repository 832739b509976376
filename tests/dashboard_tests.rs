//! Tests for the dashboard API.

mod common;

use axum::http::StatusCode;
use common::{create_test_app, create_video, send, signup};
use serde_json::json;

#[tokio::test]
async fn test_channel_stats() {
    let (app, _db, _jwt) = create_test_app().await;
    let alice = signup(&app, "alice").await;
    let bob = signup(&app, "bob").await;

    let hit = create_video(&app, &alice, "Hit", true).await;
    create_video(&app, &alice, "Draft", false).await;

    // Bob watches, likes, comments, and subscribes
    send(
        &app,
        "GET",
        &format!("/api/v1/videos/{}", hit),
        Some(&bob.access_token),
        None,
    )
    .await;
    send(
        &app,
        "POST",
        &format!("/api/v1/likes/toggle/v/{}", hit),
        Some(&bob.access_token),
        None,
    )
    .await;
    send(
        &app,
        "POST",
        &format!("/api/v1/comments/{}", hit),
        Some(&bob.access_token),
        Some(json!({ "content": "nice" })),
    )
    .await;
    send(
        &app,
        "POST",
        &format!("/api/v1/subscriptions/c/{}", alice.user_id),
        Some(&bob.access_token),
        None,
    )
    .await;
    send(
        &app,
        "POST",
        "/api/v1/playlists",
        Some(&alice.access_token),
        Some(json!({ "title": "Mix" })),
    )
    .await;

    let response = send(
        &app,
        "GET",
        "/api/v1/dashboard/stats",
        Some(&alice.access_token),
        None,
    )
    .await;
    assert_eq!(response.status, StatusCode::OK);

    let overview = &response.data()["overview"];
    assert_eq!(overview["totalVideos"], 2);
    assert_eq!(overview["publishedVideos"], 1);
    assert_eq!(overview["draftVideos"], 1);
    assert_eq!(overview["totalViews"], 1);
    assert_eq!(overview["totalLikes"], 1);
    assert_eq!(overview["totalComments"], 1);
    assert_eq!(overview["subscribersCount"], 1);
    assert_eq!(overview["subscriptionsCount"], 0);
    assert_eq!(overview["playlistsCount"], 1);

    assert_eq!(response.data()["recentActivity"]["videosLast30Days"], 2);
    assert_eq!(response.data()["topVideo"]["title"], "Hit");

    // Bob's own dashboard is empty
    let response = send(
        &app,
        "GET",
        "/api/v1/dashboard/stats",
        Some(&bob.access_token),
        None,
    )
    .await;
    assert_eq!(response.data()["overview"]["totalVideos"], 0);
    assert!(response.data()["topVideo"].is_null());
}

#[tokio::test]
async fn test_channel_videos_with_status_filter() {
    let (app, _db, _jwt) = create_test_app().await;
    let alice = signup(&app, "alice").await;
    let bob = signup(&app, "bob").await;

    let live = create_video(&app, &alice, "Live", true).await;
    create_video(&app, &alice, "Draft", false).await;

    send(
        &app,
        "POST",
        &format!("/api/v1/likes/toggle/v/{}", live),
        Some(&bob.access_token),
        None,
    )
    .await;

    // Drafts are included by default
    let response = send(
        &app,
        "GET",
        "/api/v1/dashboard/videos",
        Some(&alice.access_token),
        None,
    )
    .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.data()["total"], 2);

    let response = send(
        &app,
        "GET",
        "/api/v1/dashboard/videos?status=published",
        Some(&alice.access_token),
        None,
    )
    .await;
    assert_eq!(response.data()["total"], 1);
    let item = &response.data()["items"][0];
    assert_eq!(item["title"], "Live");
    assert_eq!(item["likesCount"], 1);
    assert_eq!(item["engagement"], 1);

    let response = send(
        &app,
        "GET",
        "/api/v1/dashboard/videos?status=bogus",
        Some(&alice.access_token),
        None,
    )
    .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    // Requires authentication
    let response = send(&app, "GET", "/api/v1/dashboard/videos", None, None).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}
