//! Value types exchanged with the persistence and HTTP layers.
//!
//! These types are serialised as JSON: [`EncryptedFieldObject`] is stored
//! verbatim by the persistence layer, [`FieldResult`] trees arrive from form
//! submissions, and [`ErrorResponse`] is the body for any non-2xx status.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::PiiError;

// ---------------------------------------------------------------------------
// Encrypted field object
// ---------------------------------------------------------------------------

/// Persisted form of a submitted object: public values in clear, everything
/// else in a single cipher-text blob.
///
/// Either part is omitted when no field of that category was present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EncryptedFieldObject {
    /// Values of fields declared `public: true`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public: Option<Map<String, Value>>,
    /// Encrypted JSON map of every other field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encrypted: Option<String>,
}

// ---------------------------------------------------------------------------
// Field results
// ---------------------------------------------------------------------------

/// A submitted value paired with the slug of the field it answers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldResult {
    pub slug: String,
    pub value: FieldValue,
}

/// Value of a [`FieldResult`]: either a plain JSON value or, for group
/// fields, an ordered list of child results.
///
/// On the wire a nested value is a JSON array whose every item has the
/// `{slug, value}` shape; any other JSON (including other arrays) is a scalar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Nested(Vec<FieldResult>),
    Scalar(Value),
}

impl FieldResult {
    pub fn new(slug: impl Into<String>, value: FieldValue) -> Self {
        Self {
            slug: slug.into(),
            value,
        }
    }

    pub fn scalar(slug: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(slug, FieldValue::Scalar(value.into()))
    }

    pub fn nested(slug: impl Into<String>, children: Vec<FieldResult>) -> Self {
        Self::new(slug, FieldValue::Nested(children))
    }
}

impl FieldValue {
    /// Child results when this is a group value.
    pub fn as_nested(&self) -> Option<&[FieldResult]> {
        match self {
            FieldValue::Nested(children) => Some(children),
            FieldValue::Scalar(_) => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Scalar(Value::Null))
    }
}

// ---------------------------------------------------------------------------
// Error response
// ---------------------------------------------------------------------------

/// Standard error response body returned on any non-2xx status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Short machine-readable error code (e.g. `"schema_mismatch"`).
    pub code: String,
    /// Human-readable description safe to expose to callers.
    pub message: String,
    /// Individual validation messages, when the error is a validation failure.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<String>,
}

impl ErrorResponse {
    /// Construct an [`ErrorResponse`] from a code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: Vec::new(),
        }
    }

    /// Build the client-facing body for a [`PiiError`].
    ///
    /// Crypto and serialization failures get a generic message so that no
    /// detail about key material or ciphertext leaks to the client.
    pub fn from_error(err: &PiiError) -> Self {
        match err {
            PiiError::CryptoFailure(_) | PiiError::Serialization(_) => {
                Self::new(err.code(), "could not process protected data")
            }
            PiiError::Validation(errors) => Self {
                code: err.code().into(),
                message: "one or more fields are missing or invalid".into(),
                details: errors.messages().to_vec(),
            },
            _ => Self::new(err.code(), err.to_string()),
        }
    }
}
