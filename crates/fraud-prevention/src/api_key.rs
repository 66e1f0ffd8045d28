//! Bearer API keys sealed at rest with the master key.
//!
//! Sealing is always deterministic, so a presented token can be sealed again
//! and looked up by its stored value.

use common::PiiError;

use crate::config::PiiConfig;
use crate::crypto::{random_base64, CipherMode};
use crate::forms::FieldCodec;

/// Random bytes in a freshly issued token.
pub const TOKEN_BYTES: usize = 32;

/// A new key: `token` is shown to the client once, `sealed` is stored.
#[derive(Clone, PartialEq, Eq)]
pub struct IssuedApiKey {
    pub token: String,
    pub sealed: String,
}

impl std::fmt::Debug for IssuedApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IssuedApiKey")
            .field("token", &"[REDACTED]")
            .field("sealed", &self.sealed)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct ApiKeySealer {
    codec: FieldCodec,
}

impl ApiKeySealer {
    /// Uses the configured secrets; the configured cipher mode is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`PiiError::ConfigMissing`] if the signing key or offset is unset.
    pub fn from_config(cfg: &PiiConfig) -> Result<Self, PiiError> {
        let (secret, iv_material) = cfg.signing_secrets()?;
        Ok(Self {
            codec: FieldCodec::new(secret, iv_material, CipherMode::Deterministic),
        })
    }

    /// Generate a token and its sealed form.
    pub fn issue(&self) -> Result<IssuedApiKey, PiiError> {
        let token = random_base64(TOKEN_BYTES);
        let sealed = self.seal(&token)?;
        Ok(IssuedApiKey { token, sealed })
    }

    /// Sealed form of a presented token, for lookup.
    pub fn seal(&self, token: &str) -> Result<String, PiiError> {
        if token.is_empty() {
            return Err(PiiError::BadRequest("api key is empty".into()));
        }
        let key = self.codec.key_for(None)?;
        self.codec.encrypt_str(token, &key)
    }

    pub fn reveal(&self, sealed: &str) -> Result<String, PiiError> {
        let key = self.codec.key_for(None)?;
        self.codec.decrypt_str(sealed, &key)
    }
}
