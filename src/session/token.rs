//! Signed session tokens.
//!
//! A token is three base64url segments joined by dots:
//!
//! ```text
//! base64url(header) "." base64url(payload) "." base64url(hmac-sha256(header "." payload))
//! ```
//!
//! The header is fixed and informational; verification never looks at it
//! beyond requiring the segment to be present and covered by the tag.

use chrono::Utc;
use log::debug;
use serde::Serialize;
use thiserror::Error;

use crate::models::SessionPayload;
use crate::session::codec::{self, DecodeError};
use crate::session::mac::MacEngine;

/// Why a presented token was refused
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("malformed token: {0}")]
    Malformed(String),
    #[error("token signature does not match")]
    SignatureInvalid,
    #[error("token expired at {exp} (now {now})")]
    Expired { exp: i64, now: i64 },
}

impl From<DecodeError> for TokenError {
    fn from(err: DecodeError) -> Self {
        Self::Malformed(err.to_string())
    }
}

impl From<serde_json::Error> for TokenError {
    fn from(err: serde_json::Error) -> Self {
        Self::Malformed(format!("payload: {err}"))
    }
}

#[derive(Serialize)]
struct TokenHeader {
    alg: &'static str,
    typ: &'static str,
}

const HEADER: TokenHeader = TokenHeader {
    alg: "HS256",
    typ: "JWT",
};

/// Mints and verifies session tokens with a secret fixed at construction.
#[derive(Clone, Debug)]
pub struct SessionTokenService {
    mac: MacEngine,
    encoded_header: String,
}

impl SessionTokenService {
    /// Create a service bound to `secret`
    ///
    /// # Errors
    ///
    /// Returns an error if the secret cannot be used as an HMAC key or the
    /// fixed header cannot be serialized
    pub fn new(secret: &[u8]) -> anyhow::Result<Self> {
        let mac = MacEngine::new(secret)?;
        let encoded_header = codec::encode(&serde_json::to_vec(&HEADER)?);
        Ok(Self {
            mac,
            encoded_header,
        })
    }

    /// Serialize, encode and sign `payload`.
    ///
    /// # Errors
    ///
    /// Returns an error only if the payload cannot be serialized to JSON
    pub fn create_session_token(&self, payload: &SessionPayload) -> serde_json::Result<String> {
        let encoded_payload = codec::encode(&serde_json::to_vec(payload)?);
        let signing_input = format!("{}.{encoded_payload}", self.encoded_header);
        let signature = codec::encode(&self.mac.sign(&signing_input));
        Ok(format!("{signing_input}.{signature}"))
    }

    /// Verify `token` against the current wall clock
    #[must_use]
    pub fn verify_session_token(&self, token: &str) -> Option<SessionPayload> {
        self.verify_at(token, Utc::now().timestamp())
    }

    /// Verify `token` as of `now` (seconds since epoch), collapsing every
    /// failure into `None`
    #[must_use]
    pub fn verify_at(&self, token: &str, now: i64) -> Option<SessionPayload> {
        match self.check_at(token, now) {
            Ok(payload) => Some(payload),
            Err(err) => {
                debug!("Rejected session token: {err}");
                None
            }
        }
    }

    /// Run the verification steps in order and report the first failure.
    ///
    /// # Errors
    ///
    /// - [`TokenError::Malformed`] for a wrong segment count, an empty
    ///   segment, or a segment that fails base64url or payload decoding
    /// - [`TokenError::SignatureInvalid`] when the tag does not match
    /// - [`TokenError::Expired`] when `now >= exp`
    pub fn check_at(&self, token: &str, now: i64) -> Result<SessionPayload, TokenError> {
        let (signing_input, payload_segment, signature_segment) = split_token(token)?;

        let provided = codec::decode(signature_segment)?;
        if !self.mac.verify(signing_input, &provided) {
            return Err(TokenError::SignatureInvalid);
        }

        let payload: SessionPayload = serde_json::from_slice(&codec::decode(payload_segment)?)?;
        if !payload.is_live_at(now) {
            return Err(TokenError::Expired {
                exp: payload.exp,
                now,
            });
        }

        Ok(payload)
    }
}

/// Split into (`header.payload`, payload, signature), requiring exactly
/// three non-empty segments.
fn split_token(token: &str) -> Result<(&str, &str, &str), TokenError> {
    let mut segments = token.split('.');
    let (Some(header), Some(payload), Some(signature), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return Err(TokenError::Malformed("expected three segments".to_string()));
    };

    if header.is_empty() || payload.is_empty() || signature.is_empty() {
        return Err(TokenError::Malformed("empty segment".to_string()));
    }

    let signing_input = &token[..header.len() + 1 + payload.len()];
    Ok((signing_input, payload, signature))
}
