//! HMAC-SHA256 tags over token signing input

use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Length in bytes of an HMAC-SHA256 tag
pub const MAC_LEN: usize = 32;

#[derive(Debug, Error)]
#[error("invalid HMAC key: {0}")]
pub struct InvalidKey(String);

/// Keyed HMAC-SHA256 signer.
///
/// The secret is absorbed once at construction; every call clones the keyed
/// state, so the engine is cheap to share between workers.
#[derive(Clone)]
pub struct MacEngine {
    keyed: HmacSha256,
}

impl std::fmt::Debug for MacEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MacEngine").finish_non_exhaustive()
    }
}

impl MacEngine {
    /// Create an engine for the given secret
    ///
    /// # Errors
    ///
    /// Returns an error if the HMAC implementation rejects the key length
    pub fn new(secret: &[u8]) -> Result<Self, InvalidKey> {
        let keyed = <HmacSha256 as Mac>::new_from_slice(secret)
            .map_err(|e| InvalidKey(e.to_string()))?;
        Ok(Self { keyed })
    }

    /// Compute the tag for `message`
    #[must_use]
    pub fn sign(&self, message: &str) -> [u8; MAC_LEN] {
        let mut mac = self.keyed.clone();
        mac.update(message.as_bytes());
        let digest = mac.finalize().into_bytes();

        let mut tag = [0u8; MAC_LEN];
        tag.copy_from_slice(&digest);
        tag
    }

    /// Check `provided` against the tag for `message`.
    ///
    /// A wrong length fails straight away; equal-length tags are compared
    /// without early exit.
    #[must_use]
    pub fn verify(&self, message: &str, provided: &[u8]) -> bool {
        if provided.len() != MAC_LEN {
            return false;
        }
        constant_time_eq(&self.sign(message), provided)
    }
}

/// OR-accumulate the XOR of every byte pair and test the result once.
fn constant_time_eq(expected: &[u8; MAC_LEN], provided: &[u8]) -> bool {
    let diff = expected
        .iter()
        .zip(provided)
        .fold(0u8, |acc, (a, b)| acc | (a ^ b));
    diff == 0
}
