//! Token issuance and validation.
//!
//! The engine is stateless per call: it holds the key set (via the codec)
//! and the configured lifetimes, nothing else. Refreshing always produces a
//! new token with a fresh jti; issued tokens are never edited. Blacklist
//! consultation is the caller's job, keyed by the validated claims' jti.

use std::time::{SystemTime, UNIX_EPOCH};

use super::claims::{Claims, TokenType};
use super::codec::TokenCodec;
use super::error::TokenError;

/// Token lifetimes in seconds.
#[derive(Debug, Clone, Copy)]
pub struct TokenLifetimes {
    /// Access token lifetime (default 5 minutes).
    pub access: u64,
    /// Refresh token lifetime (default 1 day).
    pub refresh: u64,
    /// Sliding token hard expiry (default 1 day).
    pub sliding: u64,
    /// Sliding token refresh-eligibility window (default 1 hour).
    /// Clamped to the hard expiry at issuance.
    pub sliding_refresh: u64,
}

impl Default for TokenLifetimes {
    fn default() -> Self {
        Self {
            access: 5 * 60,
            refresh: 24 * 60 * 60,
            sliding: 24 * 60 * 60,
            sliding_refresh: 60 * 60,
        }
    }
}

/// A freshly issued token with the metadata callers need for transport and
/// revocation tracking.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    /// The signed token string.
    pub token: String,
    /// Unique token identifier.
    pub jti: String,
    /// Issued-at timestamp (Unix seconds).
    pub issued_at: u64,
    /// Hard expiry timestamp (Unix seconds).
    pub expires_at: u64,
}

/// An access token and a refresh token produced together at
/// credential-exchange time. Independent expiries, independent jtis.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access: IssuedToken,
    pub refresh: IssuedToken,
}

/// Issues and validates tokens against one key set and lifetime table.
#[derive(Clone)]
pub struct TokenEngine {
    codec: TokenCodec,
    lifetimes: TokenLifetimes,
}

impl TokenEngine {
    pub fn new(codec: TokenCodec, lifetimes: TokenLifetimes) -> Self {
        Self { codec, lifetimes }
    }

    pub fn lifetimes(&self) -> &TokenLifetimes {
        &self.lifetimes
    }

    /// Issue an access + refresh pair for an authenticated subject.
    pub fn issue_pair(&self, subject: &str) -> Result<TokenPair, TokenError> {
        let now = unix_now()?;
        Ok(TokenPair {
            access: self.issue_at(subject, TokenType::Access, now)?,
            refresh: self.issue_at(subject, TokenType::Refresh, now)?,
        })
    }

    /// Issue a sliding token for an authenticated subject.
    pub fn issue_sliding(&self, subject: &str) -> Result<IssuedToken, TokenError> {
        self.issue_sliding_at(subject, unix_now()?)
    }

    /// Issue a new access token for the subject of a validated refresh token.
    pub fn refresh_access(&self, refresh_claims: &Claims) -> Result<IssuedToken, TokenError> {
        self.issue_at(&refresh_claims.sub, TokenType::Access, unix_now()?)
    }

    /// Issue a new refresh token for the same subject (token rotation).
    pub fn rotate_refresh(&self, refresh_claims: &Claims) -> Result<IssuedToken, TokenError> {
        self.issue_at(&refresh_claims.sub, TokenType::Refresh, unix_now()?)
    }

    /// Issue a replacement sliding token for the subject of a validated
    /// sliding token. Issued-at, hard expiry, and the refresh window are all
    /// reset from the current time; the old token is not modified.
    pub fn refresh_sliding(&self, sliding_claims: &Claims) -> Result<IssuedToken, TokenError> {
        self.issue_sliding_at(&sliding_claims.sub, unix_now()?)
    }

    /// Validate a token for use as `expected`: signature, type tag, hard
    /// expiry, and not-before. Returns the claims on success.
    pub fn validate(&self, token: &str, expected: TokenType) -> Result<Claims, TokenError> {
        self.validate_at(token, expected, unix_now()?)
    }

    /// `validate` against an explicit clock reading.
    pub fn validate_at(
        &self,
        token: &str,
        expected: TokenType,
        now: u64,
    ) -> Result<Claims, TokenError> {
        let claims = self.codec.decode(token)?;
        if claims.token_type != expected {
            return Err(TokenError::WrongType {
                expected,
                found: claims.token_type,
            });
        }
        check_temporal(&claims, now)?;
        Ok(claims)
    }

    /// Validate a sliding token for refresh: everything `validate` checks,
    /// plus the refresh-eligibility window. A closed window is reported
    /// distinctly from plain expiry.
    pub fn validate_sliding_refresh(&self, token: &str) -> Result<Claims, TokenError> {
        self.validate_sliding_refresh_at(token, unix_now()?)
    }

    /// `validate_sliding_refresh` against an explicit clock reading.
    pub fn validate_sliding_refresh_at(&self, token: &str, now: u64) -> Result<Claims, TokenError> {
        let claims = self.validate_at(token, TokenType::Sliding, now)?;
        let refresh_exp = claims
            .refresh_exp
            .ok_or(TokenError::MissingClaim("refresh_exp"))?;
        if now >= refresh_exp {
            return Err(TokenError::RefreshWindowExpired);
        }
        Ok(claims)
    }

    /// Check a token of any type for plain validity: signature, hard expiry,
    /// not-before. Says nothing about fitness for any particular use.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        self.verify_at(token, unix_now()?)
    }

    /// `verify` against an explicit clock reading.
    pub fn verify_at(&self, token: &str, now: u64) -> Result<Claims, TokenError> {
        let claims = self.codec.decode(token)?;
        check_temporal(&claims, now)?;
        Ok(claims)
    }

    fn issue_at(
        &self,
        subject: &str,
        token_type: TokenType,
        now: u64,
    ) -> Result<IssuedToken, TokenError> {
        let lifetime = match token_type {
            TokenType::Access => self.lifetimes.access,
            TokenType::Refresh => self.lifetimes.refresh,
            TokenType::Sliding => self.lifetimes.sliding,
        };
        self.sign(Claims {
            jti: uuid::Uuid::new_v4().to_string(),
            sub: subject.to_string(),
            token_type,
            iat: now,
            exp: now + lifetime,
            nbf: None,
            refresh_exp: None,
        })
    }

    fn issue_sliding_at(&self, subject: &str, now: u64) -> Result<IssuedToken, TokenError> {
        let exp = now + self.lifetimes.sliding;
        let refresh_exp = (now + self.lifetimes.sliding_refresh).min(exp);
        self.sign(Claims {
            jti: uuid::Uuid::new_v4().to_string(),
            sub: subject.to_string(),
            token_type: TokenType::Sliding,
            iat: now,
            exp,
            nbf: None,
            refresh_exp: Some(refresh_exp),
        })
    }

    fn sign(&self, claims: Claims) -> Result<IssuedToken, TokenError> {
        let token = self.codec.encode(&claims)?;
        Ok(IssuedToken {
            token,
            jti: claims.jti,
            issued_at: claims.iat,
            expires_at: claims.exp,
        })
    }
}

/// Hard expiry and not-before checks. Expiry boundary: `now == exp` is
/// already expired.
fn check_temporal(claims: &Claims, now: u64) -> Result<(), TokenError> {
    if now >= claims.exp {
        return Err(TokenError::Expired);
    }
    if let Some(nbf) = claims.nbf {
        if now < nbf {
            return Err(TokenError::NotYetValid);
        }
    }
    Ok(())
}

/// Current Unix time in seconds.
pub fn unix_now() -> Result<u64, TokenError> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .map_err(|_| TokenError::Time)
}
