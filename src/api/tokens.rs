//! Token lifecycle API endpoints.
//!
//! - POST `/pair` - Exchange credentials for an access + refresh pair
//! - POST `/refresh` - Exchange a refresh token for a new access token
//! - POST `/sliding` - Exchange credentials for a sliding token
//! - POST `/sliding/refresh` - Renew a sliding token within its window
//! - POST `/verify` - Check a token of any kind for plain validity
//! - POST `/pair/cookie` - Pair issuance with the refresh token in a cookie
//! - POST `/refresh/cookie` - Refresh reading the token from the cookie
//! - GET `/cookie/delete` - Clear the refresh cookie (no auth, no blacklist)

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header::SET_COOKIE},
    middleware,
    response::{AppendHeaders, IntoResponse},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::error::{ApiError, ResultExt};
use crate::cookie::CookiePolicy;
use crate::credentials::authenticate;
use crate::db::{Database, User};
use crate::rate_limit::{RateLimitConfig, rate_limit_obtain};
use crate::token::{Claims, TokenEngine, TokenError, TokenType};

#[derive(Clone)]
pub struct TokensState {
    pub db: Database,
    pub engine: Arc<TokenEngine>,
    pub cookie: CookiePolicy,
    /// Consult the blacklist during refresh/verify, and feed it on rotation.
    pub blacklist_enabled: bool,
    /// Issue a new refresh token on every refresh and blacklist the old one.
    pub rotate_refresh: bool,
    /// Per-IP limiter for the credential-exchange endpoints. None in tests.
    pub rate_limit: Option<Arc<RateLimitConfig>>,
}

pub fn router(state: TokensState) -> Router {
    let obtain_routes = Router::new()
        .route("/pair", post(obtain_pair))
        .route("/sliding", post(obtain_sliding))
        .route("/pair/cookie", post(obtain_pair_cookie))
        .with_state(state.clone());

    let obtain_routes = match state.rate_limit.clone() {
        Some(config) => {
            obtain_routes.layer(middleware::from_fn_with_state(config, rate_limit_obtain))
        }
        None => obtain_routes,
    };

    let token_routes = Router::new()
        .route("/refresh", post(refresh_token))
        .route("/sliding/refresh", post(refresh_sliding))
        .route("/verify", post(verify_token))
        .route("/refresh/cookie", post(refresh_token_cookie))
        .route("/cookie/delete", get(delete_cookie))
        .with_state(state);

    Router::new().merge(obtain_routes).merge(token_routes)
}

#[derive(Deserialize)]
struct CredentialsRequest {
    username: String,
    password: String,
}

#[derive(Serialize)]
struct PairResponse {
    access: String,
    refresh: String,
}

#[derive(Deserialize)]
struct RefreshRequest {
    refresh: String,
}

#[derive(Serialize)]
struct AccessResponse {
    access: String,
    /// Present only when refresh rotation is enabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    refresh: Option<String>,
}

#[derive(Deserialize)]
struct TokenRequest {
    token: String,
}

#[derive(Serialize)]
struct SlidingResponse {
    token: String,
}

/// Exchange credentials for the matching active user, or 401.
async fn exchange_credentials(
    state: &TokensState,
    payload: &CredentialsRequest,
) -> Result<User, ApiError> {
    authenticate(&state.db, &payload.username, &payload.password)
        .await
        .db_err("Failed to look up user")?
        .map_err(ApiError::from)
}

/// Fail with the uniform invalid-token response if the jti is blacklisted.
/// No-op when the blacklist is disabled.
async fn check_blacklist(state: &TokensState, claims: &Claims) -> Result<(), ApiError> {
    if !state.blacklist_enabled {
        return Ok(());
    }
    let revoked = state
        .db
        .blacklist()
        .contains(&claims.jti)
        .await
        .db_err("Failed to check blacklist")?;
    if revoked {
        return Err(TokenError::Blacklisted.into());
    }
    Ok(())
}

/// Blacklist a consumed token's jti until its natural expiry.
async fn retire(state: &TokensState, claims: &Claims) -> Result<(), ApiError> {
    if state.blacklist_enabled {
        state
            .db
            .blacklist()
            .insert(&claims.jti, claims.exp)
            .await
            .db_err("Failed to blacklist token")?;
    }
    Ok(())
}

/// Credentials in, access + refresh pair out.
async fn obtain_pair(
    State(state): State<TokensState>,
    Json(payload): Json<CredentialsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = exchange_credentials(&state, &payload).await?;
    let pair = state.engine.issue_pair(&user.uuid)?;

    Ok((
        StatusCode::OK,
        Json(PairResponse {
            access: pair.access.token,
            refresh: pair.refresh.token,
        }),
    ))
}

/// Refresh token in, new access token out. With rotation enabled the
/// response also carries a replacement refresh token and the consumed one
/// is blacklisted.
async fn refresh_token(
    State(state): State<TokensState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let claims = state.engine.validate(&payload.refresh, TokenType::Refresh)?;
    check_blacklist(&state, &claims).await?;

    let access = state.engine.refresh_access(&claims)?;
    let rotated = if state.rotate_refresh {
        let replacement = state.engine.rotate_refresh(&claims)?;
        retire(&state, &claims).await?;
        Some(replacement.token)
    } else {
        None
    };

    Ok((
        StatusCode::OK,
        Json(AccessResponse {
            access: access.token,
            refresh: rotated,
        }),
    ))
}

/// Credentials in, sliding token out.
async fn obtain_sliding(
    State(state): State<TokensState>,
    Json(payload): Json<CredentialsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = exchange_credentials(&state, &payload).await?;
    let issued = state.engine.issue_sliding(&user.uuid)?;

    Ok((
        StatusCode::OK,
        Json(SlidingResponse {
            token: issued.token,
        }),
    ))
}

/// Sliding token in, renewed sliding token out, while the refresh window is
/// open. The superseded token is blacklisted so each lineage has one live
/// token.
async fn refresh_sliding(
    State(state): State<TokensState>,
    Json(payload): Json<TokenRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let claims = state.engine.validate_sliding_refresh(&payload.token)?;
    check_blacklist(&state, &claims).await?;

    let renewed = state.engine.refresh_sliding(&claims)?;
    retire(&state, &claims).await?;

    Ok((
        StatusCode::OK,
        Json(SlidingResponse {
            token: renewed.token,
        }),
    ))
}

/// Check signature, expiry, and not-before for a token of any kind.
/// 200 with an empty body if valid; says nothing about fitness for any
/// particular use.
async fn verify_token(
    State(state): State<TokensState>,
    Json(payload): Json<TokenRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let claims = state.engine.verify(&payload.token)?;
    check_blacklist(&state, &claims).await?;
    Ok(StatusCode::OK)
}

/// Pair issuance in cookie mode: access token in the body, refresh token in
/// an HttpOnly cookie expiring exactly when the token does.
async fn obtain_pair_cookie(
    State(state): State<TokensState>,
    Json(payload): Json<CredentialsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = exchange_credentials(&state, &payload).await?;
    let pair = state.engine.issue_pair(&user.uuid)?;

    let cookie = state
        .cookie
        .set_cookie(&pair.refresh.token, pair.refresh.expires_at);

    Ok((
        StatusCode::OK,
        [(SET_COOKIE, cookie)],
        Json(serde_json::json!({ "access": pair.access.token })),
    ))
}

/// Cookie-mode refresh: the refresh token comes from the cookie instead of
/// the body. Validation is identical to body-mode refresh, including the
/// blacklist check; rotation re-sets the cookie.
async fn refresh_token_cookie(
    State(state): State<TokensState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let token = state
        .cookie
        .read(&headers)
        .ok_or(TokenError::MissingCredential)?;

    let claims = state.engine.validate(token, TokenType::Refresh)?;
    check_blacklist(&state, &claims).await?;

    let access = state.engine.refresh_access(&claims)?;

    let mut cookies = Vec::new();
    if state.rotate_refresh {
        let replacement = state.engine.rotate_refresh(&claims)?;
        retire(&state, &claims).await?;
        cookies.push((
            SET_COOKIE,
            state
                .cookie
                .set_cookie(&replacement.token, replacement.expires_at),
        ));
    }

    Ok((
        StatusCode::OK,
        AppendHeaders(cookies),
        Json(serde_json::json!({ "access": access.token })),
    ))
}

/// Clear the refresh cookie. Unauthenticated, never touches the blacklist:
/// this only removes the client-held copy, so a token captured beforehand
/// stays valid until its natural expiry unless separately blacklisted.
async fn delete_cookie(State(state): State<TokensState>) -> impl IntoResponse {
    (StatusCode::OK, [(SET_COOKIE, state.cookie.clear_cookie())])
}
