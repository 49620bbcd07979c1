//! Opaque session tokens and session-id derivation.
//!
//! A bearer token is 20 bytes of OS randomness rendered as unpadded
//! lowercase base32 (32 characters). Only the SHA-256 hex digest of the
//! token is ever persisted server-side, so a database leak does not
//! expose valid bearer tokens.

use base32::Alphabet;
use rand::rngs::OsRng;
use rand::TryRngCore;
use sha2::{Digest, Sha256};

/// Bytes of entropy in a freshly generated token (160 bits).
const TOKEN_ENTROPY_BYTES: usize = 20;

/// Generate a cryptographically random session token.
///
/// # Panics
///
/// Panics if the OS random source is unavailable. Token generation must
/// never fall back to weaker randomness, so this is fatal by design.
pub fn generate_session_token() -> String {
    let mut bytes = [0u8; TOKEN_ENTROPY_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .expect("OS random source unavailable");
    base32::encode(Alphabet::Rfc4648Lower { padding: false }, &bytes)
}

/// Derive the session id for a token: the SHA-256 digest of its UTF-8
/// bytes as 64 lowercase hex characters.
///
/// Deterministic and one-way; recovering the token from the id is no
/// easier than brute force over the 160-bit token space.
pub fn derive_session_id(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_token_shape() {
        let token = generate_session_token();
        // 20 bytes -> ceil(160 / 5) = 32 base32 characters, no padding.
        assert_eq!(token.len(), 32);
        assert!(
            token
                .chars()
                .all(|c| matches!(c, 'a'..='z' | '2'..='7')),
            "token must be lowercase unpadded base32: {token}"
        );
    }

    #[test]
    fn test_session_id_shape() {
        let id = derive_session_id("sometoken");
        assert_eq!(id.len(), 64);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_derivation_is_deterministic() {
        let token = generate_session_token();
        assert_eq!(derive_session_id(&token), derive_session_id(&token));

        // Known-answer: SHA-256 of the ASCII bytes of "token".
        assert_eq!(
            derive_session_id("token"),
            "3c469e9d6c5875d37a43f353d4f88e61fcf812c66eee3457465a40b0da4153e0"
        );
    }

    #[test]
    fn test_no_collisions_across_many_tokens() {
        let mut seen = HashSet::new();
        for _ in 0..100_000 {
            let id = derive_session_id(&generate_session_token());
            assert!(seen.insert(id), "session id collision observed");
        }
    }
}
