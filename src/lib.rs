pub mod api;
pub mod cleanup;
pub mod cli;
pub mod cookie;
pub mod credentials;
pub mod db;
pub mod rate_limit;
pub mod token;

use api::create_api_router;
use axum::Router;
use cookie::CookiePolicy;
use db::Database;
use jsonwebtoken::Algorithm;
use rate_limit::RateLimitConfig;
use std::sync::Arc;
use token::{TokenCodec, TokenEngine, TokenLifetimes};

pub struct ServerConfig {
    /// Database connection (cloneable, uses connection pool internally)
    pub db: Database,
    /// Current secret for signing and verifying tokens
    pub jwt_secret: Vec<u8>,
    /// Previous secret, still accepted for verification during a rotation
    /// overlap window
    pub previous_jwt_secret: Option<Vec<u8>>,
    /// HMAC algorithm used for token signatures
    pub algorithm: Algorithm,
    /// Lifetimes for each token class
    pub lifetimes: TokenLifetimes,
    /// Name of the refresh token cookie
    pub cookie_name: String,
    /// Whether to set Secure flag on cookies (should be true in production with HTTPS)
    pub secure_cookies: bool,
    /// Whether presented tokens are checked against the revocation blacklist
    pub blacklist_enabled: bool,
    /// Whether refresh issues a new refresh token and blacklists the old one
    pub rotate_refresh: bool,
    /// Whether credential endpoints are rate limited per client IP
    pub rate_limit: bool,
}

/// Create the application router with the given configuration.
pub fn create_app(config: &ServerConfig) -> Router {
    let codec = TokenCodec::new(
        &config.jwt_secret,
        config.previous_jwt_secret.as_deref(),
        config.algorithm,
    );
    let engine = Arc::new(TokenEngine::new(codec, config.lifetimes));

    let cookie = CookiePolicy::new(&config.cookie_name, config.secure_cookies);

    let rate_limit = config
        .rate_limit
        .then(|| Arc::new(RateLimitConfig::new()));

    create_api_router(
        config.db.clone(),
        engine,
        cookie,
        config.blacklist_enabled,
        config.rotate_refresh,
        rate_limit,
    )
}

/// Run cleanup tasks and spawn background scheduler.
/// Call this before starting the server.
pub async fn init_cleanup(db: &Database) {
    cleanup::run_cleanup(db).await;
    cleanup::spawn_cleanup_scheduler(db.clone());
}
