//! Session Management Module
//!
//! Stateless admin sessions carried entirely in a signed cookie.
//!
//! # Modules
//!
//! - [`codec`] - base64url segment encoding
//! - [`mac`] - HMAC-SHA256 signing and constant-time verification
//! - [`token`] - Token construction and the ordered verification checks
//! - [`cookie`] - Session cookie attributes and request extraction

pub mod codec;
pub mod cookie;
pub mod mac;
pub mod token;

// Re-export commonly used items for convenience
pub use cookie::{session_from_request, CookieFactory, CookieOptions, SESSION_COOKIE_NAME};
pub use token::{SessionTokenService, TokenError};
