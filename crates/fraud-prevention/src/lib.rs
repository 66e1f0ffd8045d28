//! `fraud-prevention`: field-level PII encryption and form-data handling.
//!
//! Typical submission flow:
//! 1. Load [`PiiConfig`] from the environment and call
//!    [`telemetry::init_tracing`].
//! 2. Register form definitions in a [`forms::FormRegistry`].
//! 3. Validate submitted data with [`forms::validate_form_data`].
//! 4. Upload files with [`forms::files::upload_files`] and splice their paths
//!    in with [`forms::files::merge_files`].
//! 5. Seal the result with [`forms::FieldCodec::encrypt_field_object`] under
//!    a key derived for the owning entity.
//!
//! Normalized emails and phone numbers ([`forms::Normalizer`],
//! [`forms::normalize_phone`]) are stored next to the originals for
//! duplicate detection.

pub mod api_key;
pub mod config;
pub mod crypto;
pub mod forms;
pub mod profile;
pub mod telemetry;

pub use api_key::{ApiKeySealer, IssuedApiKey};
pub use common::{EncryptedFieldObject, ErrorResponse, FieldResult, FieldValue, PiiError, ValidationErrors};
pub use config::PiiConfig;
pub use forms::{Field, FieldCodec, FieldKind};
pub use profile::ProfileCipher;
