//! Whole-profile encryption for user records.
//!
//! Unlike the field codec, this path never fails loudly: a profile that
//! cannot be sealed or opened comes back as `None` and the caller stores or
//! shows nothing.

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::PiiConfig;
use crate::forms::FieldCodec;

/// Encrypts serializable profiles under a key derived per entity.
#[derive(Debug, Clone)]
pub struct ProfileCipher {
    codec: Option<FieldCodec>,
}

impl ProfileCipher {
    /// Without a signing key and offset every call returns `None`.
    pub fn from_config(cfg: &PiiConfig) -> Self {
        let codec = match FieldCodec::from_config(cfg) {
            Ok(codec) => Some(codec),
            Err(e) => {
                warn!(error = %e, "profile encryption disabled");
                None
            }
        };
        Self { codec }
    }

    pub fn new(codec: FieldCodec) -> Self {
        Self { codec: Some(codec) }
    }

    pub fn is_enabled(&self) -> bool {
        self.codec.is_some()
    }

    /// Serialize `value` to JSON and encrypt it for `entity_id`.
    ///
    /// `None` for a blank value (`null`, `false`, `0`, `""`) or on any failure.
    pub fn encrypt_profile<T: Serialize + ?Sized>(&self, value: &T, entity_id: Option<&str>) -> Option<String> {
        let codec = self.codec.as_ref()?;
        let value = match serde_json::to_value(value) {
            Ok(v) if is_blank(&v) => return None,
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "profile could not be serialized");
                return None;
            }
        };

        let result = codec
            .key_for(entity_id)
            .and_then(|key| codec.encrypt_str(&value.to_string(), &key));
        match result {
            Ok(ciphertext) => Some(ciphertext),
            Err(e) => {
                warn!(error = %e, "profile could not be encrypted");
                None
            }
        }
    }

    /// Decrypt and parse a profile sealed by [`ProfileCipher::encrypt_profile`].
    ///
    /// `None` for empty input or on any failure.
    pub fn decrypt_profile<T: DeserializeOwned>(&self, sealed: &str, entity_id: Option<&str>) -> Option<T> {
        if sealed.is_empty() {
            return None;
        }
        let codec = self.codec.as_ref()?;

        let plaintext = match codec
            .key_for(entity_id)
            .and_then(|key| codec.decrypt_str(sealed, &key))
        {
            Ok(plaintext) => plaintext,
            Err(e) => {
                debug!(error = %e, "profile could not be decrypted");
                return None;
            }
        };
        match serde_json::from_str(&plaintext) {
            Ok(profile) => Some(profile),
            Err(e) => {
                debug!(error = %e, "decrypted profile has an unexpected shape");
                None
            }
        }
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null | Value::Bool(false) => true,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}
