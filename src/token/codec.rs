//! Encoding and signature verification for token payloads.
//!
//! The codec is a pure transform: it signs claims on the way out and checks
//! structure + signature on the way in. Temporal checks (expiry, not-before)
//! belong to the validator, so `jsonwebtoken`'s own expiry validation is
//! disabled here.

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};

use super::claims::Claims;
use super::error::TokenError;

/// Signing/verification key set for one HMAC algorithm.
///
/// Decoding tries the current key first, then the previous one (if any), so
/// tokens issued just before a secret rotation stay verifiable for an
/// overlap window.
#[derive(Clone)]
pub struct TokenCodec {
    algorithm: Algorithm,
    encoding_key: EncodingKey,
    decoding_keys: Vec<DecodingKey>,
}

impl TokenCodec {
    /// Create a codec signing with `secret` and verifying against `secret`
    /// plus an optional `previous` secret.
    pub fn new(secret: &[u8], previous: Option<&[u8]>, algorithm: Algorithm) -> Self {
        let mut decoding_keys = vec![DecodingKey::from_secret(secret)];
        if let Some(prev) = previous {
            decoding_keys.push(DecodingKey::from_secret(prev));
        }
        Self {
            algorithm,
            encoding_key: EncodingKey::from_secret(secret),
            decoding_keys,
        }
    }

    /// Sign claims into a compact token string.
    pub fn encode(&self, claims: &Claims) -> Result<String, TokenError> {
        jsonwebtoken::encode(&Header::new(self.algorithm), claims, &self.encoding_key)
            .map_err(TokenError::Encoding)
    }

    /// Decode a token string, verifying its signature against the accepted
    /// key set. No claim is trusted until this passes.
    pub fn decode(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(self.algorithm);
        validation.leeway = 0;
        validation.validate_exp = false;
        validation.required_spec_claims = Default::default();

        let mut last_err = None;
        for key in &self.decoding_keys {
            match jsonwebtoken::decode::<Claims>(token, key, &validation) {
                Ok(data) => return Ok(data.claims),
                Err(e) => last_err = Some(e),
            }
        }

        // decoding_keys is never empty
        let err = last_err.expect("no decoding keys configured");
        match err.kind() {
            ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm | ErrorKind::Crypto(_) => {
                Err(TokenError::Signature(err))
            }
            _ => Err(TokenError::Malformed(err)),
        }
    }
}
