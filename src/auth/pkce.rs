//! PKCE verifier and challenge generation (RFC 7636, S256)

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::Rng;
use sha2::{Digest, Sha256};

/// Unreserved characters a verifier may use
const VERIFIER_CHARSET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-._~";

/// Shortest verifier the authorization server accepts
pub const MIN_VERIFIER_LENGTH: usize = 43;
/// Longest verifier the authorization server accepts
pub const MAX_VERIFIER_LENGTH: usize = 128;

/// Random verifier of exactly `length` unreserved characters
pub fn generate_verifier(length: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| {
            let idx = rng.gen_range(0..VERIFIER_CHARSET.len());
            VERIFIER_CHARSET[idx] as char
        })
        .collect()
}

/// base64url(SHA-256(verifier)) without padding
pub fn generate_challenge(verifier: &str) -> String {
    let digest = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(digest)
}

/// A verifier together with its derived challenge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PkcePair {
    pub verifier: String,
    pub challenge: String,
}

impl PkcePair {
    pub fn new(length: usize) -> Self {
        let verifier = generate_verifier(length);
        let challenge = generate_challenge(&verifier);
        Self {
            verifier,
            challenge,
        }
    }
}
