//! Split a submitted object into clear public values and one encrypted
//! bundle of everything else, and merge it back.

use common::{EncryptedFieldObject, PiiError};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::field::Field;
use crate::config::PiiConfig;
use crate::crypto::{derive_key, Cipher, CipherMode, DerivedKey};

/// Encrypts and decrypts field objects with keys derived from one secret.
#[derive(Clone)]
pub struct FieldCodec {
    cipher: Cipher,
    secret: String,
    iv_material: String,
}

impl FieldCodec {
    pub fn new(secret: impl Into<String>, iv_material: impl Into<String>, mode: CipherMode) -> Self {
        Self {
            cipher: Cipher::new(mode),
            secret: secret.into(),
            iv_material: iv_material.into(),
        }
    }

    /// # Errors
    ///
    /// Returns [`PiiError::ConfigMissing`] if the signing key or offset is unset.
    pub fn from_config(cfg: &PiiConfig) -> Result<Self, PiiError> {
        let (secret, iv_material) = cfg.signing_secrets()?;
        Ok(Self::new(secret, iv_material, cfg.cipher_mode))
    }

    pub fn mode(&self) -> CipherMode {
        self.cipher.mode()
    }

    /// Key for one entity (user, organization, ...); `None` gives the
    /// unsalted master key.
    pub fn key_for(&self, entity_id: Option<&str>) -> Result<DerivedKey, PiiError> {
        derive_key(&self.secret, entity_id).map_err(|e| PiiError::CryptoFailure(e.to_string()))
    }

    /// Encrypt one string under `key` with the configured IV material.
    pub fn encrypt_str(&self, plaintext: &str, key: &DerivedKey) -> Result<String, PiiError> {
        self.cipher
            .encrypt(plaintext, key.as_bytes(), &self.iv_material)
            .map_err(|e| {
                warn!(error = %e, "encryption failed");
                PiiError::CryptoFailure("error encrypting field data".into())
            })
    }

    /// Inverse of [`FieldCodec::encrypt_str`]; reads both envelope formats.
    pub fn decrypt_str(&self, ciphertext: &str, key: &DerivedKey) -> Result<String, PiiError> {
        self.cipher
            .decrypt(ciphertext, key.as_bytes(), &self.iv_material)
            .map_err(|e| {
                warn!(error = %e, "decryption failed");
                PiiError::CryptoFailure("error decrypting field data".into())
            })
    }

    /// Partition `input` by the `public` flag of its top-level fields and
    /// encrypt the private part as a single JSON blob.
    ///
    /// # Errors
    ///
    /// - [`PiiError::BadRequest`] if `input` is not a JSON object.
    /// - [`PiiError::SchemaMismatch`] for a key with no top-level field.
    /// - [`PiiError::Serialization`] / [`PiiError::CryptoFailure`] if the
    ///   private part cannot be encoded or encrypted.
    pub fn encrypt_field_object(
        &self,
        input: &Value,
        fields: &[Field],
        key: &DerivedKey,
    ) -> Result<EncryptedFieldObject, PiiError> {
        let Value::Object(obj) = input else {
            return Err(PiiError::BadRequest("couldn't encrypt object".into()));
        };

        let mut public = Map::new();
        let mut private = Map::new();
        for (slug, value) in obj {
            let field = fields.iter().find(|f| f.slug == *slug).ok_or_else(|| {
                PiiError::SchemaMismatch(format!("slug \"{slug}\" not found in field definition"))
            })?;
            if field.public {
                public.insert(slug.clone(), value.clone());
            } else {
                private.insert(slug.clone(), value.clone());
            }
        }

        let encrypted = if private.is_empty() {
            None
        } else {
            let plaintext =
                serde_json::to_string(&private).map_err(|e| PiiError::Serialization(e.to_string()))?;
            Some(self.encrypt_str(&plaintext, key)?)
        };

        debug!(
            public = public.len(),
            private = private.len(),
            "field object partitioned"
        );
        Ok(EncryptedFieldObject {
            public: (!public.is_empty()).then_some(public),
            encrypted,
        })
    }

    /// Rebuild the flat object: public values first, then the decrypted
    /// bundle. On a key present in both, the decrypted value wins.
    ///
    /// # Errors
    ///
    /// - [`PiiError::CryptoFailure`] if the bundle does not decrypt under `key`.
    /// - [`PiiError::Serialization`] if the plaintext is not a JSON object.
    pub fn decrypt_field_object(
        &self,
        input: &EncryptedFieldObject,
        key: &DerivedKey,
    ) -> Result<Map<String, Value>, PiiError> {
        let mut out = input.public.clone().unwrap_or_default();
        let Some(ciphertext) = input.encrypted.as_deref().filter(|c| !c.is_empty()) else {
            return Ok(out);
        };

        let plaintext = self.decrypt_str(ciphertext, key)?;
        let private: Map<String, Value> =
            serde_json::from_str(&plaintext).map_err(|e| PiiError::Serialization(e.to_string()))?;

        for (slug, value) in private {
            if out.contains_key(&slug) {
                warn!(slug = %slug, "slug stored both in clear and encrypted; using encrypted value");
            }
            out.insert(slug, value);
        }
        Ok(out)
    }
}

impl std::fmt::Debug for FieldCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldCodec")
            .field("mode", &self.cipher.mode())
            .field("secret", &"[REDACTED]")
            .field("iv_material", &"[REDACTED]")
            .finish()
    }
}
