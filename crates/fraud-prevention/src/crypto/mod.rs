//! AES-256-GCM-SIV field encryption primitives and key derivation.
//!
//! This module is intentionally free of schema and form dependencies.
//!
//! # Ciphertext formats
//!
//! ```text
//! d1.<base64url-no-pad(ciphertext+tag)>                           deterministic
//! v1.<base64url-no-pad(nonce)>.<base64url-no-pad(ciphertext+tag)> randomized
//! ```
//!
//! The prefix lets a reader decrypt either format whatever the writer's
//! configured [`CipherMode`] is.

pub mod cipher;
pub mod key;
pub mod random;

pub use cipher::{Cipher, CipherError, CipherMode, KEY_LEN};
pub use key::{derive_key, DerivedKey, KeyError};
pub use random::{create_nonce, random_base64, random_nonce};
