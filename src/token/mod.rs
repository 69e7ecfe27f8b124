//! Token lifecycle engine: claim construction, signing, validation, and the
//! access/refresh/sliding state machine.
//!
//! Three token kinds:
//! - Access: short-lived (default 5 min), authenticates API calls.
//! - Refresh: longer-lived (default 1 day), exchanged for new access tokens.
//! - Sliding: one artifact carrying both a hard expiry and a renewable
//!   refresh window.

mod claims;
mod codec;
mod engine;
mod error;

pub use claims::{Claims, TokenType};
pub use codec::TokenCodec;
pub use engine::{IssuedToken, TokenEngine, TokenLifetimes, TokenPair, unix_now};
pub use error::TokenError;
