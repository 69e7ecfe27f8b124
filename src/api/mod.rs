mod error;
mod tokens;

use axum::Router;
use std::sync::Arc;

use crate::cookie::CookiePolicy;
use crate::db::Database;
use crate::rate_limit::RateLimitConfig;
use crate::token::TokenEngine;

pub use tokens::TokensState;

/// Create the `/token` API router.
pub fn create_api_router(
    db: Database,
    engine: Arc<TokenEngine>,
    cookie: CookiePolicy,
    blacklist_enabled: bool,
    rotate_refresh: bool,
    rate_limit: Option<Arc<RateLimitConfig>>,
) -> Router {
    let tokens_state = TokensState {
        db,
        engine,
        cookie,
        blacklist_enabled,
        rotate_refresh,
        rate_limit,
    };

    Router::new().nest("/token", tokens::router(tokens_state))
}
