//! URL-safe, padding-free Base64 used for every token segment.

use base64::{engine::general_purpose, Engine as _};
use thiserror::Error;

/// Failure to turn a token segment back into bytes
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("invalid base64url character {0:?}")]
    InvalidCharacter(char),
    #[error("invalid base64url length {0}")]
    InvalidLength(usize),
    #[error("base64 decode failed: {0}")]
    Base64(#[from] base64::DecodeError),
}

/// Encode bytes as base64url without padding.
///
/// Standard Base64 first, then trailing `=` removed, `+` → `-` and `/` → `_`,
/// in that order.
#[must_use]
pub fn encode(bytes: &[u8]) -> String {
    general_purpose::STANDARD
        .encode(bytes)
        .trim_end_matches('=')
        .replace('+', "-")
        .replace('/', "_")
}

/// Decode a base64url segment produced by [`encode`].
///
/// Padding is restored before decoding. A length that is already a multiple
/// of four gets no padding at all.
///
/// # Errors
///
/// Returns an error if the input contains characters outside the base64url
/// alphabet, has a length no encoder can produce, or carries non-canonical
/// trailing bits.
pub fn decode(input: &str) -> Result<Vec<u8>, DecodeError> {
    if let Some(bad) = input
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
    {
        return Err(DecodeError::InvalidCharacter(bad));
    }

    let missing = (4 - input.len() % 4) % 4;
    if missing == 3 {
        return Err(DecodeError::InvalidLength(input.len()));
    }

    let mut padded = String::with_capacity(input.len() + missing);
    padded.push_str(input);
    padded.extend(std::iter::repeat('=').take(missing));

    let standard = padded.replace('-', "+").replace('_', "/");
    Ok(general_purpose::STANDARD.decode(standard)?)
}
