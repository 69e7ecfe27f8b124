//! Shared error handling for API endpoints.
//!
//! Every validator/issuer failure leaves the boundary as the same generic
//! 401 `token_not_valid` response. The specific cause is logged, never sent,
//! so a caller cannot probe which check rejected a token.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::{debug, error};

use crate::token::TokenError;

/// Extension trait for concise error mapping on Results.
pub trait ResultExt<T> {
    fn db_err(self, msg: &str) -> Result<T, ApiError>;
}

impl<T, E: std::fmt::Display> ResultExt<T> for Result<T, E> {
    fn db_err(self, msg: &str) -> Result<T, ApiError> {
        self.map_err(|e| ApiError::db_error(msg, e))
    }
}

/// API error type with automatic response conversion.
pub enum ApiError {
    /// 401 with code `token_not_valid`; the one outward face of every
    /// token validation failure.
    InvalidToken,
    /// 401 with code `no_active_account`; credential exchange failed.
    NoActiveAccount,
    /// 500; detail is generic, cause is logged.
    Internal(String),
}

impl ApiError {
    pub fn db_error(context: &str, e: impl std::fmt::Display) -> Self {
        error!("{}: {}", context, e);
        Self::Internal("Database error".into())
    }
}

impl From<TokenError> for ApiError {
    fn from(e: TokenError) -> Self {
        match e {
            TokenError::InvalidCredentials => Self::NoActiveAccount,
            TokenError::Encoding(_) | TokenError::Time => {
                error!(error = %e, "Token issuance failed");
                Self::Internal("Failed to issue token".into())
            }
            _ => {
                debug!(error = %e, "Token rejected");
                Self::InvalidToken
            }
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    detail: String,
    code: &'static str,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail, code) = match self {
            ApiError::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                "Token is invalid or expired".to_string(),
                "token_not_valid",
            ),
            ApiError::NoActiveAccount => (
                StatusCode::UNAUTHORIZED,
                "No active account found with the given credentials".to_string(),
                "no_active_account",
            ),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg, "server_error"),
        };
        (status, Json(ErrorResponse { detail, code })).into_response()
    }
}
