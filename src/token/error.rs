//! Token lifecycle error taxonomy.
//!
//! The HTTP boundary collapses every variant into a generic 401 so callers
//! cannot learn which check failed; the distinctions exist for logging and
//! for tests that assert on cause.

use super::claims::TokenType;

/// Errors produced by the token codec, validator, and issuer.
#[derive(Debug)]
pub enum TokenError {
    /// Token structure is invalid (bad segments, base64, or claim JSON).
    Malformed(jsonwebtoken::errors::Error),
    /// Signature does not verify against any accepted key.
    Signature(jsonwebtoken::errors::Error),
    /// Failed to encode/sign a new token.
    Encoding(jsonwebtoken::errors::Error),
    /// Current time is at or past the token's hard expiry.
    Expired,
    /// Current time is before the token's `nbf` claim.
    NotYetValid,
    /// Sliding token's refresh-eligibility window has closed.
    RefreshWindowExpired,
    /// Token type tag does not match what the operation requires.
    WrongType {
        expected: TokenType,
        found: TokenType,
    },
    /// A claim required by the operation is absent.
    MissingClaim(&'static str),
    /// Token's jti is on the blacklist.
    Blacklisted,
    /// No token was supplied where one is required (e.g. refresh cookie).
    MissingCredential,
    /// Credential exchange failed: unknown user, bad password, or inactive
    /// account. Deliberately a single variant.
    InvalidCredentials,
    /// System clock is unreadable.
    Time,
}

impl std::fmt::Display for TokenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenError::Malformed(e) => write!(f, "Token is malformed: {}", e),
            TokenError::Signature(e) => write!(f, "Token signature is invalid: {}", e),
            TokenError::Encoding(e) => write!(f, "Failed to encode token: {}", e),
            TokenError::Expired => write!(f, "Token is expired"),
            TokenError::NotYetValid => write!(f, "Token is not yet valid"),
            TokenError::RefreshWindowExpired => write!(f, "Token refresh window has expired"),
            TokenError::WrongType { expected, found } => {
                write!(f, "Wrong token type: expected {}, got {}", expected, found)
            }
            TokenError::MissingClaim(claim) => write!(f, "Token is missing the {} claim", claim),
            TokenError::Blacklisted => write!(f, "Token is blacklisted"),
            TokenError::MissingCredential => write!(f, "No token supplied"),
            TokenError::InvalidCredentials => {
                write!(f, "No active account found with the given credentials")
            }
            TokenError::Time => write!(f, "System time error"),
        }
    }
}

impl std::error::Error for TokenError {}
