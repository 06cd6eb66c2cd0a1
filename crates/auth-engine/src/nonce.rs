//! Replay-protection nonces for the Apple flow.

use rand::Rng;
use sha2::{Digest, Sha256};

const NONCE_CHARSET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVXYZabcdefghijklmnopqrstuvwxyz-._";

/// Default raw nonce length.
pub const NONCE_LENGTH: usize = 32;

/// Generate a random nonce of `length` characters from a URL-safe charset.
pub fn random_nonce(length: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| NONCE_CHARSET[rng.gen_range(0..NONCE_CHARSET.len())] as char)
        .collect()
}

/// Lowercase hex SHA-256 of the input. This is what goes into the provider request.
pub fn sha256_hex(input: &str) -> String {
    hex::encode(Sha256::digest(input.as_bytes()))
}
