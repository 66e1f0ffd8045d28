//! Cryptographically random tokens.
//!
//! These are for one-time values (nonces, API keys). Field encryption keys
//! come from [`super::key::derive_key`], never from here.

use aes_gcm_siv::aead::{rand_core::RngCore, OsRng};
use base64::{engine::general_purpose::STANDARD, Engine as _};

/// Byte length of the nonce produced by [`create_nonce`].
pub const DEFAULT_NONCE_BYTES: usize = 8;

/// Generate `len` bytes from the OS CSPRNG.
pub fn random_bytes(len: usize) -> Vec<u8> {
    let mut bytes = vec![0u8; len];
    OsRng.fill_bytes(&mut bytes);
    bytes
}

/// `len` random bytes rendered as lower-case hex (`2 * len` characters).
pub fn random_nonce(len: usize) -> String {
    hex::encode(random_bytes(len))
}

/// `len` random bytes rendered as standard padded base64.
pub fn random_base64(len: usize) -> String {
    STANDARD.encode(random_bytes(len))
}

/// Default one-time nonce: [`DEFAULT_NONCE_BYTES`] random bytes as hex.
pub fn create_nonce() -> String {
    random_nonce(DEFAULT_NONCE_BYTES)
}
