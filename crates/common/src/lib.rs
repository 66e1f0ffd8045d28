//! Error taxonomy and persisted value types shared across the fraud-prevention crates.

pub mod error;
pub mod protocol;

pub use error::{PiiError, ValidationErrors};
pub use protocol::{EncryptedFieldObject, ErrorResponse, FieldResult, FieldValue};
