//! [`DerivedKey`]: per-entity cipher key derived from the process signing secret.

use sha2::{Digest, Sha256};
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::cipher::KEY_LEN;

/// Errors produced by key derivation.
#[derive(Debug, Error)]
pub enum KeyError {
    /// The signing secret is empty.
    #[error("signing secret is missing")]
    MissingSecret,
}

/// Fixed-size key buffer that holds exactly [`KEY_LEN`] bytes.
///
/// Keys are recomputed on every call and never stored. The buffer is
/// zeroized on drop.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct DerivedKey(Box<[u8; KEY_LEN]>);

impl DerivedKey {
    pub fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(Box::new(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0[..]
    }

    /// Lower-case hex rendering of the key (64 characters).
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0[..])
    }
}

impl std::fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print key material, not even in debug builds.
        f.write_str("DerivedKey([REDACTED])")
    }
}

/// Derive a cipher key as `SHA-256(secret ‖ salt)`.
///
/// Callers pass a deterministic salt such as a user or organization id, so
/// the same record always maps to the same key without a key store.
///
/// # Errors
///
/// Returns [`KeyError::MissingSecret`] if `secret` is empty.
pub fn derive_key(secret: &str, salt: Option<&str>) -> Result<DerivedKey, KeyError> {
    if secret.is_empty() {
        return Err(KeyError::MissingSecret);
    }
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    if let Some(salt) = salt {
        hasher.update(salt.as_bytes());
    }
    Ok(DerivedKey::from_bytes(hasher.finalize().into()))
}
