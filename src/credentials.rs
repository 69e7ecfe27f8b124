//! Password hashing and credential verification.
//!
//! Unknown user, wrong password, and deactivated account all collapse into
//! the same `InvalidCredentials` outcome so responses cannot be used to
//! enumerate accounts.

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::password_hash::rand_core::OsRng;
use argon2::Argon2;

use crate::db::{Database, User};
use crate::token::TokenError;

/// Argon2 hash of an arbitrary string, verified against when the username
/// does not exist so lookup misses take as long as hash mismatches.
const DUMMY_HASH: &str = "$argon2id$v=19$m=19456,t=2,p=1$wn5EThyPl4gmigJgBAIOAg$0S/jpdBrLfMwh0PYbt7nSq2uWzBlvK25wsnSC446Keo";

/// Hash a password for storage.
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default()
        .hash_password(password.as_bytes(), &salt)?
        .to_string())
}

/// Verify a password against a stored hash.
pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

/// Exchange credentials for the matching active user.
pub async fn authenticate(
    db: &Database,
    username: &str,
    password: &str,
) -> Result<Result<User, TokenError>, sqlx::Error> {
    let user = db.users().get_by_username(username).await?;

    let Some(user) = user else {
        // Burn comparable time before rejecting
        let _ = verify_password(password, DUMMY_HASH);
        return Ok(Err(TokenError::InvalidCredentials));
    };

    if !verify_password(password, &user.password_hash) || !user.active {
        return Ok(Err(TokenError::InvalidCredentials));
    }

    Ok(Ok(user))
}
