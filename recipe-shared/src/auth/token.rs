//! API token generation and hashing
//!
//! Tokens are 40 lowercase hex characters (160 bits from the OS-seeded
//! thread RNG). Only the SHA-256 hash is persisted; the plaintext is shown
//! to the client once, when the token is issued.
//!
//! ```
//! use recipe_shared::auth::token::{generate_token, hash_token, validate_token_format, verify_token};
//!
//! let (token, hash) = generate_token();
//! assert_eq!(token.len(), 40);
//! assert!(validate_token_format(&token));
//! assert_eq!(hash, hash_token(&token));
//! assert!(verify_token(&token, &hash));
//! ```

use rand::RngCore;
use sha2::{Digest, Sha256};

/// Number of random bytes in a token
const TOKEN_BYTES: usize = 20;

/// Length of a token in hex characters
pub const TOKEN_LENGTH: usize = TOKEN_BYTES * 2;

/// Number of leading characters kept in clear for display
pub const TOKEN_PREFIX_LENGTH: usize = 8;

/// Generates a new token, returning `(plaintext, sha256_hex)`
pub fn generate_token() -> (String, String) {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);

    let token = hex::encode(bytes);
    let hash = hash_token(&token);

    (token, hash)
}

/// Hex-encoded SHA-256 of a token
pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// Display prefix of a token
pub fn token_prefix(token: &str) -> String {
    token.chars().take(TOKEN_PREFIX_LENGTH).collect()
}

/// Checks length and alphabet without touching the database
pub fn validate_token_format(token: &str) -> bool {
    token.len() == TOKEN_LENGTH && token.chars().all(|c| matches!(c, '0'..='9' | 'a'..='f'))
}

/// Verifies a plaintext token against a stored hash in constant time
pub fn verify_token(token: &str, stored_hash: &str) -> bool {
    constant_time_compare(&hash_token(token), stored_hash)
}

/// Compares two strings without short-circuiting on the first difference
pub fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    a.bytes()
        .zip(b.bytes())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}
