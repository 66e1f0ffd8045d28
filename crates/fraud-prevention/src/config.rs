//! Configuration loading and validation for the PII layer.
//!
//! Values are read from `PII_`-prefixed environment variables. The signing
//! secret and IV material are optional at load time: components that need
//! them fail closed when they are absent (the codec with
//! [`PiiError::ConfigMissing`], the profile path by returning `None`).

use std::collections::HashMap;

use anyhow::{Context, Result};
use common::PiiError;
use serde::{Deserialize, Deserializer};

use crate::crypto::CipherMode;

/// Validated PII layer configuration.
#[derive(Clone, Deserialize)]
pub struct PiiConfig {
    /// Process-wide signing secret from which every cipher key is derived
    /// (`PII_SIGNING_KEY`).
    #[serde(default)]
    pub signing_key: Option<String>,

    /// IV material for deterministic encryption (`PII_SIGNING_OFFSET`).
    #[serde(default)]
    pub signing_offset: Option<String>,

    /// Nonce strategy for new ciphertexts (`PII_CIPHER_MODE`).
    #[serde(default)]
    pub cipher_mode: CipherMode,

    /// Mail domains that ignore `.` in the local part
    /// (`PII_DOT_INSENSITIVE_DOMAINS`, comma-separated).
    #[serde(
        default = "default_dot_insensitive_domains",
        deserialize_with = "deserialize_domains"
    )]
    pub dot_insensitive_domains: Vec<String>,

    /// Tracing log level (e.g. `"info"`, `"debug"`).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_dot_insensitive_domains() -> Vec<String> {
    vec!["gmail.com".into(), "googlemail.com".into()]
}
fn default_log_level() -> String {
    "info".into()
}

fn deserialize_domains<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        List(Vec<String>),
        Csv(String),
    }

    let domains = match Raw::deserialize(deserializer)? {
        Raw::List(list) => list,
        Raw::Csv(csv) => csv.split(',').map(str::to_owned).collect(),
    };
    Ok(domains
        .into_iter()
        .map(|d| d.trim().to_lowercase())
        .filter(|d| !d.is_empty())
        .collect())
}

impl PiiConfig {
    /// Load and validate configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable cannot be parsed or fails validation.
    pub fn from_env() -> Result<Self> {
        Self::load(config::Environment::with_prefix("PII"))
    }

    /// Load from an explicit variable map instead of the process environment.
    ///
    /// Keys use the same `PII_*` names as [`PiiConfig::from_env`].
    pub fn from_vars(vars: HashMap<String, String>) -> Result<Self> {
        Self::load(config::Environment::with_prefix("PII").source(Some(vars)))
    }

    fn load(env: config::Environment) -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(env)
            .build()
            .context("failed to build configuration from environment")?;

        let c: PiiConfig = cfg
            .try_deserialize()
            .context("failed to deserialise configuration")?;

        c.validate()?;
        Ok(c)
    }

    /// Validate all fields, returning a descriptive error on the first failure.
    fn validate(&self) -> Result<()> {
        if let Some(key) = &self.signing_key {
            ensure_non_empty(key, "PII_SIGNING_KEY")?;
        }
        if let Some(offset) = &self.signing_offset {
            ensure_non_empty(offset, "PII_SIGNING_OFFSET")?;
        }
        ensure_non_empty(&self.log_level, "PII_LOG_LEVEL")?;
        Ok(())
    }

    /// Signing secret and IV material, or [`PiiError::ConfigMissing`].
    pub fn signing_secrets(&self) -> std::result::Result<(&str, &str), PiiError> {
        let key = self
            .signing_key
            .as_deref()
            .ok_or_else(|| PiiError::ConfigMissing("PII_SIGNING_KEY is not set".into()))?;
        let offset = self
            .signing_offset
            .as_deref()
            .ok_or_else(|| PiiError::ConfigMissing("PII_SIGNING_OFFSET is not set".into()))?;
        Ok((key, offset))
    }

    /// Configuration with the given secrets and defaults for everything else.
    pub fn with_secrets(signing_key: impl Into<String>, signing_offset: impl Into<String>) -> Self {
        Self {
            signing_key: Some(signing_key.into()),
            signing_offset: Some(signing_offset.into()),
            ..Self::default()
        }
    }
}

impl Default for PiiConfig {
    fn default() -> Self {
        Self {
            signing_key: None,
            signing_offset: None,
            cipher_mode: CipherMode::default(),
            dot_insensitive_domains: default_dot_insensitive_domains(),
            log_level: default_log_level(),
        }
    }
}

impl std::fmt::Debug for PiiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "[REDACTED]");
        f.debug_struct("PiiConfig")
            .field("signing_key", &redact(&self.signing_key))
            .field("signing_offset", &redact(&self.signing_offset))
            .field("cipher_mode", &self.cipher_mode)
            .field("dot_insensitive_domains", &self.dot_insensitive_domains)
            .field("log_level", &self.log_level)
            .finish()
    }
}

fn ensure_non_empty(value: &str, name: &str) -> Result<()> {
    if value.trim().is_empty() {
        anyhow::bail!("{name} must not be empty when set");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn defaults_are_correct() {
        assert_eq!(default_dot_insensitive_domains(), vec!["gmail.com", "googlemail.com"]);
        assert_eq!(default_log_level(), "info");
        assert_eq!(PiiConfig::default().cipher_mode, CipherMode::Deterministic);
    }

    #[test]
    fn loads_from_vars() {
        let cfg = PiiConfig::from_vars(vars(&[
            ("PII_SIGNING_KEY", "secret"),
            ("PII_SIGNING_OFFSET", "offset-material"),
            ("PII_CIPHER_MODE", "randomized"),
            ("PII_DOT_INSENSITIVE_DOMAINS", "Gmail.com, example.org"),
        ]))
        .unwrap();
        assert_eq!(cfg.signing_secrets().unwrap(), ("secret", "offset-material"));
        assert_eq!(cfg.cipher_mode, CipherMode::Randomized);
        assert_eq!(cfg.dot_insensitive_domains, vec!["gmail.com", "example.org"]);
        assert_eq!(cfg.log_level, "info");
    }

    #[test]
    fn missing_secrets_load_but_fail_closed() {
        let cfg = PiiConfig::from_vars(HashMap::new()).unwrap();
        assert!(matches!(cfg.signing_secrets(), Err(PiiError::ConfigMissing(_))));
    }

    #[test]
    fn validate_rejects_blank_signing_key() {
        let cfg = PiiConfig {
            signing_key: Some("  ".into()),
            ..PiiConfig::with_secrets("x", "y")
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_empty_log_level() {
        let cfg = PiiConfig {
            log_level: "".into(),
            ..PiiConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn debug_redacts_secrets() {
        let cfg = PiiConfig::with_secrets("super-secret", "offset");
        let debug = format!("{cfg:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("REDACTED"));
    }
}
