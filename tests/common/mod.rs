#![allow(dead_code)]

use authgate::credentials::hash_password;
use authgate::db::Database;
use authgate::token::{TokenCodec, TokenEngine, TokenLifetimes};
use authgate::{ServerConfig, create_app};
use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use jsonwebtoken::Algorithm;
use std::sync::Arc;
use tower::ServiceExt;

pub const TEST_SECRET: &[u8] = b"test-secret-long-enough-for-validation-0123";
pub const TEST_USERNAME: &str = "alice";
pub const TEST_PASSWORD: &str = "correct horse battery staple";

pub struct TestContext {
    pub app: axum::Router,
    pub db: Database,
    /// Engine built over the same secret as the app, for crafting and
    /// inspecting tokens directly in tests.
    pub engine: Arc<TokenEngine>,
}

pub async fn setup() -> TestContext {
    setup_with_options(false, true).await
}

pub async fn setup_with_rotation() -> TestContext {
    setup_with_options(true, true).await
}

pub async fn setup_without_blacklist() -> TestContext {
    setup_with_options(false, false).await
}

pub async fn setup_with_options(rotate_refresh: bool, blacklist_enabled: bool) -> TestContext {
    let db = Database::open(":memory:")
        .await
        .expect("Failed to open test database");

    seed_user(&db, TEST_USERNAME, TEST_PASSWORD).await;

    let config = ServerConfig {
        db: db.clone(),
        jwt_secret: TEST_SECRET.to_vec(),
        previous_jwt_secret: None,
        algorithm: Algorithm::HS256,
        lifetimes: TokenLifetimes::default(),
        cookie_name: "refresh".to_string(),
        secure_cookies: false,
        blacklist_enabled,
        rotate_refresh,
        // Oneshot requests carry no connection info, so rate limiting
        // would reject everything.
        rate_limit: false,
    };

    let engine = Arc::new(TokenEngine::new(
        TokenCodec::new(TEST_SECRET, None, Algorithm::HS256),
        TokenLifetimes::default(),
    ));

    TestContext {
        app: create_app(&config),
        db,
        engine,
    }
}

/// Create an active user and return its uuid.
pub async fn seed_user(db: &Database, username: &str, password: &str) -> String {
    let uuid = uuid::Uuid::new_v4().to_string();
    let hash = hash_password(password).expect("Failed to hash password");
    db.users()
        .create(&uuid, username, &hash)
        .await
        .expect("Failed to create user");
    uuid
}

/// POST a JSON body and return the response.
pub async fn post_json(
    app: &axum::Router,
    uri: &str,
    body: serde_json::Value,
) -> Response<Body> {
    app.clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap()
}

/// GET a URI, optionally with a Cookie header.
pub async fn get(app: &axum::Router, uri: &str, cookie: Option<&str>) -> Response<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header("cookie", cookie);
    }
    app.clone()
        .oneshot(builder.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

/// POST with a Cookie header and an empty JSON body.
pub async fn post_with_cookie(app: &axum::Router, uri: &str, cookie: &str) -> Response<Body> {
    app.clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("cookie", cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

/// Extract Set-Cookie headers from response
pub fn extract_set_cookies(response: &Response<Body>) -> Vec<String> {
    response
        .headers()
        .get_all("set-cookie")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .collect()
}

/// Obtain a token pair for the seeded user and return (access, refresh).
pub async fn obtain_pair(ctx: &TestContext) -> (String, String) {
    let response = post_json(
        &ctx.app,
        "/token/pair",
        serde_json::json!({"username": TEST_USERNAME, "password": TEST_PASSWORD}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    (
        json["access"].as_str().unwrap().to_string(),
        json["refresh"].as_str().unwrap().to_string(),
    )
}

/// Assert the uniform invalid-token error contract.
pub async fn assert_token_not_valid(response: Response<Body>) {
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert_eq!(json["code"], "token_not_valid");
    assert_eq!(json["detail"], "Token is invalid or expired");
}
