//! Common error types shared across crates.

use std::fmt;

use thiserror::Error;

/// Top-level error type for the PII encryption and form layer.
///
/// Variants map to HTTP status codes that callers return to clients:
/// - [`PiiError::BadRequest`] → 400
/// - [`PiiError::SchemaMismatch`] → 400
/// - [`PiiError::Validation`] → 422
/// - [`PiiError::CryptoFailure`] → 500
/// - [`PiiError::Serialization`] → 500
/// - [`PiiError::Upload`] → 502
/// - [`PiiError::ConfigMissing`] → 503
#[derive(Debug, Error)]
pub enum PiiError {
    /// The input was not the shape the operation accepts (e.g. not an object).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The input carried a key that the field definition does not declare.
    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),

    /// Encryption, decryption or key derivation failed.
    #[error("crypto failure: {0}")]
    CryptoFailure(String),

    /// JSON encoding or decoding of an encrypted bundle failed.
    #[error("serialization failure: {0}")]
    Serialization(String),

    /// One or more fields failed validation.
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),

    /// The signing secret or IV material is not configured.
    #[error("configuration missing: {0}")]
    ConfigMissing(String),

    /// The file store rejected an upload.
    #[error("upload failed: {0}")]
    Upload(String),
}

impl PiiError {
    /// Returns the HTTP status code that should be sent for this error.
    pub fn http_status(&self) -> u16 {
        match self {
            PiiError::BadRequest(_) | PiiError::SchemaMismatch(_) => 400,
            PiiError::Validation(_) => 422,
            PiiError::CryptoFailure(_) | PiiError::Serialization(_) => 500,
            PiiError::Upload(_) => 502,
            PiiError::ConfigMissing(_) => 503,
        }
    }

    /// Short machine-readable code, used as [`crate::protocol::ErrorResponse::code`].
    pub fn code(&self) -> &'static str {
        match self {
            PiiError::BadRequest(_) => "bad_request",
            PiiError::SchemaMismatch(_) => "schema_mismatch",
            PiiError::CryptoFailure(_) => "crypto_failure",
            PiiError::Serialization(_) => "serialization_error",
            PiiError::Validation(_) => "validation_failed",
            PiiError::ConfigMissing(_) => "config_missing",
            PiiError::Upload(_) => "upload_failed",
        }
    }
}

impl From<ValidationErrors> for PiiError {
    fn from(errors: ValidationErrors) -> Self {
        PiiError::Validation(errors)
    }
}

/// Every violation found by a single validation pass, in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(Vec<String>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: impl Into<String>) {
        self.0.push(message.into());
    }

    pub fn extend(&mut self, other: ValidationErrors) {
        self.0.extend(other.0);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn messages(&self) -> &[String] {
        &self.0
    }

    pub fn into_messages(self) -> Vec<String> {
        self.0
    }
}

impl From<Vec<String>> for ValidationErrors {
    fn from(messages: Vec<String>) -> Self {
        Self(messages)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(" "))
    }
}

impl std::error::Error for ValidationErrors {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_status_codes() {
        assert_eq!(PiiError::BadRequest("x".into()).http_status(), 400);
        assert_eq!(PiiError::SchemaMismatch("x".into()).http_status(), 400);
        assert_eq!(PiiError::Validation(ValidationErrors::new()).http_status(), 422);
        assert_eq!(PiiError::CryptoFailure("x".into()).http_status(), 500);
        assert_eq!(PiiError::Serialization("x".into()).http_status(), 500);
        assert_eq!(PiiError::Upload("x".into()).http_status(), 502);
        assert_eq!(PiiError::ConfigMissing("x".into()).http_status(), 503);
    }

    #[test]
    fn display_includes_message() {
        let e = PiiError::SchemaMismatch(r#"slug "foo" not found"#.into());
        assert!(e.to_string().contains(r#"slug "foo" not found"#));
    }

    #[test]
    fn validation_errors_accumulate_and_display() {
        let mut errors = ValidationErrors::new();
        errors.push(r#"Field "email" is missing or invalid."#);
        let mut nested = ValidationErrors::new();
        nested.push(r#"Field "zip" is missing or invalid."#);
        errors.extend(nested);

        assert_eq!(errors.len(), 2);
        let e = PiiError::from(errors);
        assert_eq!(e.code(), "validation_failed");
        assert!(e.to_string().contains("zip"));
    }
}
