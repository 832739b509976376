//! Tests for the subscriptions API.

mod common;

use axum::http::StatusCode;
use common::{create_test_app, send, signup};

#[tokio::test]
async fn test_toggle_roundtrip() {
    let (app, _db, _jwt) = create_test_app().await;
    let alice = signup(&app, "alice").await;
    let bob = signup(&app, "bob").await;
    let uri = format!("/api/v1/subscriptions/c/{}", bob.user_id);

    let response = send(&app, "POST", &uri, Some(&alice.access_token), None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.data()["subscribed"], true);

    let response = send(&app, "POST", &uri, Some(&alice.access_token), None).await;
    assert_eq!(response.data()["subscribed"], false);
}

#[tokio::test]
async fn test_self_subscription_rejected_without_a_record() {
    let (app, db, _jwt) = create_test_app().await;
    let alice = signup(&app, "alice").await;

    let response = send(
        &app,
        "POST",
        &format!("/api/v1/subscriptions/c/{}", alice.user_id),
        Some(&alice.access_token),
        None,
    )
    .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM subscriptions")
        .fetch_one(db.pool())
        .await
        .unwrap();
    assert_eq!(count.0, 0);
}

#[tokio::test]
async fn test_unknown_channel() {
    let (app, _db, _jwt) = create_test_app().await;
    let alice = signup(&app, "alice").await;

    let response = send(
        &app,
        "POST",
        &format!("/api/v1/subscriptions/c/{}", uuid::Uuid::new_v4()),
        Some(&alice.access_token),
        None,
    )
    .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    let response = send(
        &app,
        "POST",
        "/api/v1/subscriptions/c/not-a-uuid",
        Some(&alice.access_token),
        None,
    )
    .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_listings() {
    let (app, _db, _jwt) = create_test_app().await;
    let alice = signup(&app, "alice").await;
    let bob = signup(&app, "bob").await;
    let carol = signup(&app, "carol").await;

    // Alice and bob subscribe to carol
    for session in [&alice, &bob] {
        let response = send(
            &app,
            "POST",
            &format!("/api/v1/subscriptions/c/{}", carol.user_id),
            Some(&session.access_token),
            None,
        )
        .await;
        assert_eq!(response.status, StatusCode::OK);
    }

    // Carol's subscribers
    let response = send(
        &app,
        "GET",
        &format!("/api/v1/subscriptions/c/{}", carol.user_id),
        Some(&carol.access_token),
        None,
    )
    .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.data()["total"], 2);

    // Alice's subscribed channels
    let response = send(
        &app,
        "GET",
        &format!("/api/v1/subscriptions/u/{}", alice.user_id),
        Some(&alice.access_token),
        None,
    )
    .await;
    assert_eq!(response.data()["total"], 1);
    assert_eq!(response.data()["items"][0]["user"]["username"], "carol");

    // The listings require authentication
    let response = send(
        &app,
        "GET",
        &format!("/api/v1/subscriptions/c/{}", carol.user_id),
        None,
        None,
    )
    .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}
