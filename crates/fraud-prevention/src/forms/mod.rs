//! Form schemas and the operations on submitted form data.
//!
//! - [`field`]: the declarative [`Field`] model.
//! - [`schema`]: preprocessing and lookups over definitions.
//! - [`registry`]: lock-free cache of loaded definitions.
//! - [`codec`]: public/encrypted partitioning of submitted objects.
//! - [`normalization`], [`results`], [`files`]: identity strings, result
//!   tree conversion and file handling.
//! - [`validation`]: accumulate-all validation against a schema.

pub mod codec;
pub mod field;
pub mod files;
pub mod normalization;
pub mod registry;
pub mod results;
pub mod schema;
pub mod validation;

pub use codec::FieldCodec;
pub use field::{Field, FieldKind, ReCaptchaConfig, SelectOption, Validators};
pub use files::{FileStore, PendingFile, UploadedFile};
pub use normalization::{normalize_phone, Normalizer};
pub use registry::{parse_definition, CachedForm, FormRegistry, RegistryError};
pub use validation::validate_form_data;
