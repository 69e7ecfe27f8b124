//! Claim set shared by all token kinds.

use serde::{Deserialize, Serialize};

/// Token kind embedded in the `typ` claim so a token of one kind cannot be
/// presented where another is required.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    /// Short-lived, single purpose: authenticating API calls.
    Access,
    /// Longer-lived, single purpose: exchanging for a new access token.
    Refresh,
    /// Combines both roles; renewable while its refresh window is open.
    Sliding,
}

impl TokenType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenType::Access => "access",
            TokenType::Refresh => "refresh",
            TokenType::Sliding => "sliding",
        }
    }
}

impl std::fmt::Display for TokenType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Signed token payload.
///
/// One shape covers all three kinds: `refresh_exp` is only present on
/// sliding tokens, `nbf` only when a not-before bound was requested.
/// All timestamps are Unix seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Unique token identifier, used for blacklist lookups.
    pub jti: String,
    /// Subject (user UUID).
    pub sub: String,
    /// Token type tag.
    #[serde(rename = "typ")]
    pub token_type: TokenType,
    /// Issued at.
    pub iat: u64,
    /// Hard expiry.
    pub exp: u64,
    /// Not valid before, if set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nbf: Option<u64>,
    /// Refresh-eligibility cutoff (sliding tokens only). Always <= `exp`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_exp: Option<u64>,
}
