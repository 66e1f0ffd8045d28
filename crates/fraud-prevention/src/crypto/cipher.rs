//! AES-256-GCM-SIV encryption and decryption of string payloads.
//!
//! **Algorithm choice:** AES-256-GCM-SIV (RFC 8452) is nonce-misuse-resistant.
//! Reusing a nonce only reveals whether two plaintexts are equal; it does not
//! break confidentiality or authentication the way it would for plain GCM.
//! That property is what makes [`CipherMode::Deterministic`] acceptable.
//!
//! **Do NOT substitute plain AES-256-GCM in deterministic mode.** GCM nonce
//! reuse is catastrophic.

use std::str::FromStr;

use aes_gcm_siv::{
    aead::{rand_core::RngCore, Aead, KeyInit, OsRng},
    Aes256GcmSiv, Nonce,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;

/// Byte length of an AES-256 key (32 bytes = 256 bits).
pub const KEY_LEN: usize = 32;

/// Byte length of an AES-GCM-SIV nonce (12 bytes = 96 bits).
pub const NONCE_LEN: usize = 12;

/// Prefix of values encrypted with a nonce derived from the IV material.
pub const DETERMINISTIC_PREFIX: &str = "d1";

/// Prefix of values encrypted with a random nonce stored alongside.
pub const RANDOMIZED_PREFIX: &str = "v1";

type HmacSha256 = Hmac<Sha256>;

/// How the nonce for a new ciphertext is chosen.
///
/// Decryption accepts both formats regardless of the configured mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CipherMode {
    /// Nonce = `HMAC-SHA256(key, iv_material)[..12]`. Equal inputs produce
    /// equal ciphertexts, so re-saving an unchanged value is a no-op.
    #[default]
    Deterministic,
    /// Fresh OS-random nonce per call, stored in the envelope.
    Randomized,
}

/// A parsed, encrypted value.
///
/// String representations:
/// - deterministic: `d1.<base64url(ciphertext+tag)>`
/// - randomized: `v1.<base64url(nonce)>.<base64url(ciphertext+tag)>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncryptedField {
    Deterministic {
        ciphertext: Vec<u8>,
    },
    Randomized {
        nonce: [u8; NONCE_LEN],
        ciphertext: Vec<u8>,
    },
}

impl EncryptedField {
    /// Encode this value to its canonical string representation.
    pub fn to_string_repr(&self) -> String {
        match self {
            EncryptedField::Deterministic { ciphertext } => format!(
                "{}.{}",
                DETERMINISTIC_PREFIX,
                URL_SAFE_NO_PAD.encode(ciphertext)
            ),
            EncryptedField::Randomized { nonce, ciphertext } => format!(
                "{}.{}.{}",
                RANDOMIZED_PREFIX,
                URL_SAFE_NO_PAD.encode(nonce),
                URL_SAFE_NO_PAD.encode(ciphertext),
            ),
        }
    }

    pub fn mode(&self) -> CipherMode {
        match self {
            EncryptedField::Deterministic { .. } => CipherMode::Deterministic,
            EncryptedField::Randomized { .. } => CipherMode::Randomized,
        }
    }
}

impl FromStr for EncryptedField {
    type Err = CipherError;

    /// Parse an encrypted string back into an [`EncryptedField`].
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::InvalidFormat`] if the string matches neither
    /// envelope structure.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('.').collect();
        match parts.as_slice() {
            [DETERMINISTIC_PREFIX, body] => Ok(EncryptedField::Deterministic {
                ciphertext: decode_part(body)?,
            }),
            [RANDOMIZED_PREFIX, nonce, body] => {
                let nonce_bytes = decode_part(nonce)?;
                if nonce_bytes.len() != NONCE_LEN {
                    return Err(CipherError::InvalidFormat);
                }
                let mut nonce = [0u8; NONCE_LEN];
                nonce.copy_from_slice(&nonce_bytes);
                Ok(EncryptedField::Randomized {
                    nonce,
                    ciphertext: decode_part(body)?,
                })
            }
            _ => Err(CipherError::InvalidFormat),
        }
    }
}

fn decode_part(part: &str) -> Result<Vec<u8>, CipherError> {
    if part.is_empty() {
        return Err(CipherError::InvalidFormat);
    }
    URL_SAFE_NO_PAD
        .decode(part)
        .map_err(|_| CipherError::InvalidFormat)
}

/// Errors produced by the cipher layer.
#[derive(Debug, Error)]
pub enum CipherError {
    /// The key is the wrong length (must be [`KEY_LEN`] bytes).
    #[error("invalid key length: expected {KEY_LEN} bytes")]
    InvalidKeyLength,

    /// Deterministic mode needs non-empty IV material to derive its nonce.
    #[error("IV material must not be empty")]
    InvalidIvMaterial,

    /// AES-GCM-SIV encryption or decryption failed.
    #[error("aead operation failed")]
    AeadFailure,

    /// The encrypted string does not match either envelope format.
    #[error("invalid encrypted field format")]
    InvalidFormat,

    /// Decryption succeeded but the plaintext is not UTF-8.
    #[error("decrypted payload is not valid UTF-8")]
    InvalidUtf8,
}

/// Encrypt `plaintext` with AES-256-GCM-SIV.
///
/// # Errors
///
/// Returns [`CipherError::InvalidKeyLength`] if `key` is not [`KEY_LEN`] bytes,
/// [`CipherError::InvalidIvMaterial`] for deterministic mode with empty IV
/// material, and [`CipherError::AeadFailure`] on an internal AEAD error.
pub fn encrypt_field(
    plaintext: &[u8],
    key: &[u8],
    iv_material: &str,
    mode: CipherMode,
) -> Result<EncryptedField, CipherError> {
    let cipher = build_cipher(key)?;

    let nonce_bytes = match mode {
        CipherMode::Deterministic => derive_nonce(key, iv_material)?,
        CipherMode::Randomized => {
            let mut nonce = [0u8; NONCE_LEN];
            OsRng.fill_bytes(&mut nonce);
            nonce
        }
    };

    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce_bytes), plaintext)
        .map_err(|_| CipherError::AeadFailure)?;

    Ok(match mode {
        CipherMode::Deterministic => EncryptedField::Deterministic { ciphertext },
        CipherMode::Randomized => EncryptedField::Randomized {
            nonce: nonce_bytes,
            ciphertext,
        },
    })
}

/// Decrypt an [`EncryptedField`] back to plaintext bytes.
///
/// `iv_material` is only consulted for the deterministic format.
///
/// # Errors
///
/// Returns [`CipherError::AeadFailure`] if authentication fails (wrong key,
/// wrong IV material or tampered data).
pub fn decrypt_field(
    field: &EncryptedField,
    key: &[u8],
    iv_material: &str,
) -> Result<Vec<u8>, CipherError> {
    let cipher = build_cipher(key)?;
    let (nonce, ciphertext) = match field {
        EncryptedField::Deterministic { ciphertext } => (derive_nonce(key, iv_material)?, ciphertext),
        EncryptedField::Randomized { nonce, ciphertext } => (*nonce, ciphertext),
    };
    cipher
        .decrypt(Nonce::from_slice(&nonce), ciphertext.as_ref())
        .map_err(|_| CipherError::AeadFailure)
}

fn build_cipher(key: &[u8]) -> Result<Aes256GcmSiv, CipherError> {
    if key.len() != KEY_LEN {
        return Err(CipherError::InvalidKeyLength);
    }
    Aes256GcmSiv::new_from_slice(key).map_err(|_| CipherError::InvalidKeyLength)
}

fn derive_nonce(key: &[u8], iv_material: &str) -> Result<[u8; NONCE_LEN], CipherError> {
    if iv_material.is_empty() {
        return Err(CipherError::InvalidIvMaterial);
    }
    let mut mac =
        <HmacSha256 as Mac>::new_from_slice(key).map_err(|_| CipherError::InvalidKeyLength)?;
    mac.update(iv_material.as_bytes());
    let tag = mac.finalize().into_bytes();

    let mut nonce = [0u8; NONCE_LEN];
    nonce.copy_from_slice(&tag[..NONCE_LEN]);
    Ok(nonce)
}

/// String-in, string-out cipher bound to a [`CipherMode`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Cipher {
    mode: CipherMode,
}

impl Cipher {
    pub fn new(mode: CipherMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> CipherMode {
        self.mode
    }

    /// Encrypt a UTF-8 string into its printable envelope.
    pub fn encrypt(&self, plaintext: &str, key: &[u8], iv_material: &str) -> Result<String, CipherError> {
        encrypt_field(plaintext.as_bytes(), key, iv_material, self.mode).map(|f| f.to_string_repr())
    }

    /// Exact inverse of [`Cipher::encrypt`] for either envelope format.
    pub fn decrypt(&self, ciphertext: &str, key: &[u8], iv_material: &str) -> Result<String, CipherError> {
        let field: EncryptedField = ciphertext.parse()?;
        let plaintext = decrypt_field(&field, key, iv_material)?;
        String::from_utf8(plaintext).map_err(|_| CipherError::InvalidUtf8)
    }
}
