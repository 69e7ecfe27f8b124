//! CLI argument parsing, validation, and startup helpers.

use crate::ServerConfig;
use crate::credentials::hash_password;
use crate::db::Database;
use crate::token::TokenLifetimes;
use clap::Parser;
use jsonwebtoken::Algorithm;
use rand::{Rng, distr::Alphanumeric};
use tracing::{error, info};
use uuid::Uuid;

const MIN_JWT_SECRET_LENGTH: usize = 32;

const GENERATED_PASSWORD_LENGTH: usize = 24;

#[derive(clap::ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
    Compact,
}

/// HMAC signing algorithms supported for token signatures.
#[derive(clap::ValueEnum, Clone, Copy, Debug, Default)]
pub enum SigningAlgorithm {
    #[default]
    Hs256,
    Hs384,
    Hs512,
}

impl From<SigningAlgorithm> for Algorithm {
    fn from(alg: SigningAlgorithm) -> Self {
        match alg {
            SigningAlgorithm::Hs256 => Algorithm::HS256,
            SigningAlgorithm::Hs384 => Algorithm::HS384,
            SigningAlgorithm::Hs512 => Algorithm::HS512,
        }
    }
}

#[derive(Parser, Debug, Clone)]
#[command(name = "Authgate", about = "JWT token issuance and verification service")]
pub struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "8300")]
    pub port: u16,

    /// Path to SQLite database file
    #[arg(short, long, default_value = "authgate.db")]
    pub database: String,

    /// Path to file containing the JWT signing secret. Prefer using the
    /// JWT_SECRET env var instead
    #[arg(long)]
    pub jwt_secret_file: Option<String>,

    /// Path to file containing the previous JWT signing secret, kept for a
    /// verification overlap window after rotation. Prefer the
    /// JWT_PREVIOUS_SECRET env var instead
    #[arg(long)]
    pub previous_secret_file: Option<String>,

    /// Token signing algorithm
    #[arg(long, value_enum, default_value = "hs256")]
    pub algorithm: SigningAlgorithm,

    /// Access token lifetime in seconds
    #[arg(long, default_value = "300")]
    pub access_lifetime: u64,

    /// Refresh token lifetime in seconds
    #[arg(long, default_value = "86400")]
    pub refresh_lifetime: u64,

    /// Sliding token hard expiry in seconds
    #[arg(long, default_value = "86400")]
    pub sliding_lifetime: u64,

    /// Sliding token refresh window in seconds (must not exceed
    /// --sliding-lifetime)
    #[arg(long, default_value = "3600")]
    pub sliding_refresh_lifetime: u64,

    /// Name of the refresh token cookie
    #[arg(long, default_value = crate::cookie::DEFAULT_REFRESH_COOKIE)]
    pub cookie_name: String,

    /// Set the Secure attribute on cookies (use behind HTTPS)
    #[arg(long)]
    pub secure_cookies: bool,

    /// Disable the revocation blacklist
    #[arg(long)]
    pub no_blacklist: bool,

    /// Rotate refresh tokens on every refresh, blacklisting the consumed one
    #[arg(long)]
    pub rotate_refresh: bool,

    /// Disable per-IP rate limiting on the credential endpoints
    #[arg(long)]
    pub no_rate_limit: bool,

    /// Create a user with a generated password on startup and print it
    #[arg(long, value_name = "USERNAME")]
    pub create_user: Option<String>,

    /// Log output format
    #[arg(short, long, default_value = "pretty")]
    pub log_format: LogFormat,
}

/// Initialize logging based on the specified format.
pub fn init_logging(format: &LogFormat) {
    match format {
        LogFormat::Pretty => tracing_subscriber::fmt::init(),
        LogFormat::Json => tracing_subscriber::fmt().json().init(),
        LogFormat::Compact => tracing_subscriber::fmt().compact().init(),
    }
}

/// Load the JWT signing secret from environment variable or file.
/// Returns None and logs an error if the secret cannot be loaded.
pub fn load_jwt_secret(jwt_secret_file: Option<&str>) -> Option<String> {
    let secret = if let Ok(secret) = std::env::var("JWT_SECRET") {
        // Clear the environment variable to prevent leaking
        // SAFETY: We're single-threaded at this point during startup,
        // and no other code is reading this environment variable.
        unsafe { std::env::remove_var("JWT_SECRET") };
        secret
    } else if let Some(path) = jwt_secret_file {
        match std::fs::read_to_string(path) {
            Ok(content) => content.trim().to_string(),
            Err(e) => {
                error!(path = %path, error = %e, "Failed to read JWT secret file");
                return None;
            }
        }
    } else {
        error!(
            "JWT secret is required. Set JWT_SECRET environment variable (recommended) or use --jwt-secret-file"
        );
        return None;
    };

    if secret.len() < MIN_JWT_SECRET_LENGTH {
        error!(
            "JWT secret is shorter than {} characters. Use a longer secret",
            MIN_JWT_SECRET_LENGTH
        );
        return None;
    }

    Some(secret)
}

/// Load the optional previous signing secret for the rotation overlap
/// window. Returns None on a load failure; Ok(None) inside means no
/// previous secret is configured.
pub fn load_previous_secret(previous_secret_file: Option<&str>) -> Option<Option<String>> {
    let secret = if let Ok(secret) = std::env::var("JWT_PREVIOUS_SECRET") {
        // SAFETY: single-threaded startup, same as JWT_SECRET above.
        unsafe { std::env::remove_var("JWT_PREVIOUS_SECRET") };
        secret
    } else if let Some(path) = previous_secret_file {
        match std::fs::read_to_string(path) {
            Ok(content) => content.trim().to_string(),
            Err(e) => {
                error!(path = %path, error = %e, "Failed to read previous secret file");
                return None;
            }
        }
    } else {
        return Some(None);
    };

    if secret.len() < MIN_JWT_SECRET_LENGTH {
        error!(
            "Previous JWT secret is shorter than {} characters",
            MIN_JWT_SECRET_LENGTH
        );
        return None;
    }

    Some(Some(secret))
}

/// Validate the lifetime options. Returns false and logs on inconsistency.
pub fn validate_lifetimes(args: &Args) -> bool {
    if args.access_lifetime == 0
        || args.refresh_lifetime == 0
        || args.sliding_lifetime == 0
        || args.sliding_refresh_lifetime == 0
    {
        error!("Token lifetimes must be non-zero");
        return false;
    }

    if args.sliding_refresh_lifetime > args.sliding_lifetime {
        error!(
            "--sliding-refresh-lifetime ({}) must not exceed --sliding-lifetime ({})",
            args.sliding_refresh_lifetime, args.sliding_lifetime
        );
        return false;
    }

    true
}

/// Handle the --create-user flag: create the user with a generated password
/// and print the credentials once.
pub async fn handle_create_user(db: &Database, username: &str) {
    match db.users().get_by_username(username).await {
        Ok(Some(_)) => {
            error!(username = %username, "User already exists");
            std::process::exit(1);
        }
        Ok(None) => {}
        Err(e) => {
            error!(error = %e, "Failed to check for existing user");
            std::process::exit(1);
        }
    }

    let password: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(GENERATED_PASSWORD_LENGTH)
        .map(char::from)
        .collect();

    let hash = match hash_password(&password) {
        Ok(hash) => hash,
        Err(e) => {
            error!(error = %e, "Failed to hash password");
            std::process::exit(1);
        }
    };

    let uuid = Uuid::new_v4().to_string();
    match db.users().create(&uuid, username, &hash).await {
        Ok(_) => {
            println!();
            println!("User created: {}", username);
            println!("Password: {}", password);
            println!();
        }
        Err(e) => {
            error!(error = %e, "Failed to create user");
            std::process::exit(1);
        }
    }
}

/// Build ServerConfig from validated arguments.
pub fn build_config(
    args: &Args,
    db: Database,
    jwt_secret: String,
    previous_secret: Option<String>,
) -> ServerConfig {
    ServerConfig {
        db,
        jwt_secret: jwt_secret.into_bytes(),
        previous_jwt_secret: previous_secret.map(String::into_bytes),
        algorithm: args.algorithm.into(),
        lifetimes: TokenLifetimes {
            access: args.access_lifetime,
            refresh: args.refresh_lifetime,
            sliding: args.sliding_lifetime,
            sliding_refresh: args.sliding_refresh_lifetime,
        },
        cookie_name: args.cookie_name.clone(),
        secure_cookies: args.secure_cookies,
        blacklist_enabled: !args.no_blacklist,
        rotate_refresh: args.rotate_refresh,
        rate_limit: !args.no_rate_limit,
    }
}

/// Open the database, logging errors if it fails.
pub async fn open_database(path: &str) -> Option<Database> {
    match Database::open(path).await {
        Ok(db) => {
            info!(path = %path, "Database opened");
            Some(db)
        }
        Err(e) => {
            error!(path = %path, error = %e, "Failed to open database");
            None
        }
    }
}
