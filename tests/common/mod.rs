#![allow(dead_code)]

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header::SET_COOKIE};
use serde_json::{Value, json};
use tower::ServiceExt;
use vidcast::{ServerConfig, create_app, db::Database, jwt::JwtConfig};

pub const TEST_PASSWORD: &str = "correct horse battery";

/// Create a test app backed by an in-memory database.
/// Returns (app, db, jwt) - the JwtConfig shares the app's signing secret.
pub async fn create_test_app() -> (Router, Database, JwtConfig) {
    let db = Database::open(":memory:")
        .await
        .expect("Failed to open test database");
    let jwt_secret = b"test-jwt-secret-for-integration-tests".to_vec();
    let jwt = JwtConfig::new(&jwt_secret);
    let config = ServerConfig {
        db: db.clone(),
        jwt_secret,
        access_token_ttl_secs: None,
        refresh_token_ttl_secs: None,
        secure_cookies: false,
        media: None,
    };
    (create_app(&config), db, jwt)
}

/// A decoded API response: status, parsed envelope, Set-Cookie values.
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
    pub cookies: Vec<String>,
}

impl TestResponse {
    /// The `data` field of the envelope.
    pub fn data(&self) -> &Value {
        &self.body["data"]
    }

    /// Find a Set-Cookie value by cookie name and return the cookie value.
    pub fn cookie(&self, name: &str) -> Option<String> {
        let prefix = format!("{}=", name);
        self.cookies
            .iter()
            .find(|c| c.starts_with(&prefix))
            .and_then(|c| c.split(';').next())
            .and_then(|pair| pair.split_once('='))
            .map(|(_, v)| v.to_string())
    }
}

async fn dispatch(app: &Router, request: Request<Body>) -> TestResponse {
    let response = app
        .clone()
        .oneshot(request)
        .await
        .expect("Request failed");

    let status = response.status();
    let cookies = response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .map(|v| v.to_string())
        .collect();

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("Response is not JSON")
    };

    TestResponse {
        status,
        body,
        cookies,
    }
}

/// Send a request with an optional bearer token and JSON body.
pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> TestResponse {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    dispatch(app, request).await
}

/// Send a request authenticated via the Cookie header.
pub async fn send_with_cookie(
    app: &Router,
    method: &str,
    uri: &str,
    cookie: &str,
    body: Option<Value>,
) -> TestResponse {
    let mut builder = Request::builder().method(method).uri(uri).header("cookie", cookie);
    let request = match body {
        Some(body) => {
            builder = builder.header("content-type", "application/json");
            builder.body(Body::from(body.to_string())).unwrap()
        }
        None => builder.body(Body::empty()).unwrap(),
    };
    dispatch(app, request).await
}

/// A logged-in user session.
pub struct Session {
    pub user_id: String,
    pub username: String,
    pub access_token: String,
    pub refresh_token: String,
}

/// Register a user through the API. Panics on failure.
pub async fn register(app: &Router, username: &str) -> Value {
    let response = send(
        app,
        "POST",
        "/api/v1/users/register",
        None,
        Some(json!({
            "fullname": format!("{} Fullname", username),
            "email": format!("{}@example.com", username),
            "username": username,
            "password": TEST_PASSWORD,
        })),
    )
    .await;
    assert_eq!(
        response.status,
        StatusCode::CREATED,
        "register failed: {}",
        response.body
    );
    response.body["data"].clone()
}

/// Log a registered user in through the API.
pub async fn login(app: &Router, username: &str) -> Session {
    let response = send(
        app,
        "POST",
        "/api/v1/users/login",
        None,
        Some(json!({ "username": username, "password": TEST_PASSWORD })),
    )
    .await;
    assert_eq!(
        response.status,
        StatusCode::OK,
        "login failed: {}",
        response.body
    );
    let data = response.data();
    Session {
        user_id: data["user"]["id"].as_str().unwrap().to_string(),
        username: username.to_string(),
        access_token: data["accessToken"].as_str().unwrap().to_string(),
        refresh_token: data["refreshToken"].as_str().unwrap().to_string(),
    }
}

/// Register and log in.
pub async fn signup(app: &Router, username: &str) -> Session {
    register(app, username).await;
    login(app, username).await
}

/// Publish a video through the API, optionally flipping it to published.
/// Returns the video id.
pub async fn create_video(app: &Router, session: &Session, title: &str, publish: bool) -> String {
    let response = send(
        app,
        "POST",
        "/api/v1/videos",
        Some(&session.access_token),
        Some(json!({
            "title": title,
            "description": format!("About {}", title),
            "videoFile": { "url": "https://cdn.example.com/v.mp4", "fileRef": "videos/v" },
            "thumbnail": { "url": "https://cdn.example.com/t.jpg", "fileRef": "thumbs/t" },
            "duration": 120.5,
        })),
    )
    .await;
    assert_eq!(
        response.status,
        StatusCode::CREATED,
        "video create failed: {}",
        response.body
    );
    let id = response.data()["id"].as_str().unwrap().to_string();

    if publish {
        let response = send(
            app,
            "PATCH",
            &format!("/api/v1/videos/toggle/publish/{}", id),
            Some(&session.access_token),
            None,
        )
        .await;
        assert_eq!(response.status, StatusCode::OK);
    }

    id
}
