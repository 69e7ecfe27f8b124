//! Tests for the access/refresh token pair lifecycle.
//!
//! Tests cover:
//! - Credential exchange for a token pair
//! - The uniform no_active_account error for bad credentials
//! - Refresh flow, with and without rotation
//! - Revocation via the blacklist
//! - Stateless verification

mod common;

use authgate::token::{Claims, TokenCodec, TokenType, unix_now};
use axum::http::StatusCode;
use common::*;
use jsonwebtoken::Algorithm;
use serde_json::json;

// =============================================================================
// Obtain pair
// =============================================================================

#[tokio::test]
async fn test_obtain_pair_returns_valid_tokens() {
    let ctx = setup().await;
    let (access, refresh) = obtain_pair(&ctx).await;

    let access_claims = ctx.engine.validate(&access, TokenType::Access).unwrap();
    let refresh_claims = ctx.engine.validate(&refresh, TokenType::Refresh).unwrap();

    assert_eq!(access_claims.sub, refresh_claims.sub);
    assert_ne!(access_claims.jti, refresh_claims.jti);
}

#[tokio::test]
async fn test_obtain_pair_wrong_password() {
    let ctx = setup().await;

    let response = post_json(
        &ctx.app,
        "/token/pair",
        json!({"username": TEST_USERNAME, "password": "wrong"}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert_eq!(json["code"], "no_active_account");
    assert_eq!(
        json["detail"],
        "No active account found with the given credentials"
    );
}

#[tokio::test]
async fn test_obtain_pair_unknown_user() {
    let ctx = setup().await;

    let response = post_json(
        &ctx.app,
        "/token/pair",
        json!({"username": "nobody", "password": TEST_PASSWORD}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert_eq!(json["code"], "no_active_account");
}

#[tokio::test]
async fn test_obtain_pair_inactive_user() {
    let ctx = setup().await;

    let user = ctx
        .db
        .users()
        .get_by_username(TEST_USERNAME)
        .await
        .unwrap()
        .unwrap();
    ctx.db.users().deactivate(user.id).await.unwrap();

    let response = post_json(
        &ctx.app,
        "/token/pair",
        json!({"username": TEST_USERNAME, "password": TEST_PASSWORD}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert_eq!(json["code"], "no_active_account");
}

// =============================================================================
// Refresh
// =============================================================================

#[tokio::test]
async fn test_refresh_returns_new_access_token() {
    let ctx = setup().await;
    let (access, refresh) = obtain_pair(&ctx).await;

    let response = post_json(&ctx.app, "/token/refresh", json!({"refresh": refresh})).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;

    let new_access = json["access"].as_str().unwrap();
    let claims = ctx.engine.validate(new_access, TokenType::Access).unwrap();

    let original = ctx.engine.validate(&access, TokenType::Access).unwrap();
    assert_eq!(claims.sub, original.sub);
    assert_ne!(claims.jti, original.jti);

    // Rotation is off, so no replacement refresh token is issued
    assert!(json.get("refresh").is_none());
}

#[tokio::test]
async fn test_refresh_rejects_access_token() {
    let ctx = setup().await;
    let (access, _) = obtain_pair(&ctx).await;

    let response = post_json(&ctx.app, "/token/refresh", json!({"refresh": access})).await;
    assert_token_not_valid(response).await;
}

#[tokio::test]
async fn test_refresh_rejects_garbage() {
    let ctx = setup().await;

    let response = post_json(
        &ctx.app,
        "/token/refresh",
        json!({"refresh": "not-a-token"}),
    )
    .await;
    assert_token_not_valid(response).await;
}

#[tokio::test]
async fn test_refresh_rejects_blacklisted_token() {
    let ctx = setup().await;
    let (_, refresh) = obtain_pair(&ctx).await;

    let claims = ctx.engine.validate(&refresh, TokenType::Refresh).unwrap();
    ctx.db
        .blacklist()
        .insert(&claims.jti, claims.exp)
        .await
        .unwrap();

    let response = post_json(&ctx.app, "/token/refresh", json!({"refresh": refresh})).await;
    assert_token_not_valid(response).await;
}

// =============================================================================
// Refresh rotation
// =============================================================================

#[tokio::test]
async fn test_rotation_issues_replacement_and_retires_old() {
    let ctx = setup_with_rotation().await;
    let (_, refresh) = obtain_pair(&ctx).await;

    let response = post_json(&ctx.app, "/token/refresh", json!({"refresh": refresh})).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;

    let new_refresh = json["refresh"].as_str().unwrap().to_string();
    ctx.engine
        .validate(&new_refresh, TokenType::Refresh)
        .unwrap();

    // Consumed refresh token is now blacklisted
    let response = post_json(&ctx.app, "/token/refresh", json!({"refresh": refresh})).await;
    assert_token_not_valid(response).await;

    // Replacement still works
    let response = post_json(
        &ctx.app,
        "/token/refresh",
        json!({"refresh": new_refresh}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_rotation_without_blacklist_allows_reuse() {
    let ctx = setup_with_options(true, false).await;
    let (_, refresh) = obtain_pair(&ctx).await;

    let response = post_json(&ctx.app, "/token/refresh", json!({"refresh": refresh})).await;
    assert_eq!(response.status(), StatusCode::OK);

    // Nothing records the consumed jti, so the old token keeps working
    let response = post_json(&ctx.app, "/token/refresh", json!({"refresh": refresh})).await;
    assert_eq!(response.status(), StatusCode::OK);
}

// =============================================================================
// Verify
// =============================================================================

#[tokio::test]
async fn test_verify_accepts_both_token_types() {
    let ctx = setup().await;
    let (access, refresh) = obtain_pair(&ctx).await;

    let response = post_json(&ctx.app, "/token/verify", json!({"token": access})).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = post_json(&ctx.app, "/token/verify", json!({"token": refresh})).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_verify_rejects_garbage() {
    let ctx = setup().await;

    let response = post_json(&ctx.app, "/token/verify", json!({"token": "garbage"})).await;
    assert_token_not_valid(response).await;
}

#[tokio::test]
async fn test_verify_rejects_expired_token() {
    let ctx = setup().await;

    let codec = TokenCodec::new(TEST_SECRET, None, Algorithm::HS256);
    let now = unix_now().unwrap();
    let claims = Claims {
        jti: uuid::Uuid::new_v4().to_string(),
        sub: "someone".to_string(),
        token_type: TokenType::Access,
        iat: now - 600,
        exp: now - 300,
        nbf: None,
        refresh_exp: None,
    };
    let token = codec.encode(&claims).unwrap();

    let response = post_json(&ctx.app, "/token/verify", json!({"token": token})).await;
    assert_token_not_valid(response).await;
}

#[tokio::test]
async fn test_verify_rejects_blacklisted_token() {
    let ctx = setup().await;
    let (access, _) = obtain_pair(&ctx).await;

    let claims = ctx.engine.validate(&access, TokenType::Access).unwrap();
    ctx.db
        .blacklist()
        .insert(&claims.jti, claims.exp)
        .await
        .unwrap();

    let response = post_json(&ctx.app, "/token/verify", json!({"token": access})).await;
    assert_token_not_valid(response).await;
}

#[tokio::test]
async fn test_verify_rejects_foreign_signature() {
    let ctx = setup().await;

    let other = TokenCodec::new(b"a-completely-different-secret-0123456789", None, Algorithm::HS256);
    let now = unix_now().unwrap();
    let claims = Claims {
        jti: uuid::Uuid::new_v4().to_string(),
        sub: "someone".to_string(),
        token_type: TokenType::Access,
        iat: now,
        exp: now + 300,
        nbf: None,
        refresh_exp: None,
    };
    let token = other.encode(&claims).unwrap();

    let response = post_json(&ctx.app, "/token/verify", json!({"token": token})).await;
    assert_token_not_valid(response).await;
}
