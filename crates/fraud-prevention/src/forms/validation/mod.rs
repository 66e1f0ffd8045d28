//! Form data validation against a field schema.
//!
//! Validation visits every field and collects every failure, so a caller can
//! report all problems with a submission at once.

mod rules;

pub use rules::{is_email, is_phone, validate_value};

use common::ValidationErrors;
use serde_json::Value;
use tracing::debug;

use super::field::Field;

/// Message used when the schema has fields but no data was submitted.
pub const DATA_REQUIRED: &str = "Data is required but has not been provided.";

/// Validate `data` (a JSON object keyed by slug) against `fields`.
///
/// `fields` should be the preprocessed definition, so that select fields
/// carry their derived `values` rule. Group fields are validated recursively
/// against their child fields; a failing group contributes its own message
/// followed by its children's. A group whose value is missing fails when it
/// declares child fields.
///
/// # Errors
///
/// Returns every failure message in schema order.
pub fn validate_form_data(data: Option<&Value>, fields: &[Field]) -> Result<(), ValidationErrors> {
    if fields.is_empty() {
        return Ok(());
    }
    let Some(data) = data.filter(|d| !d.is_null()) else {
        debug!("no data submitted for a non-empty schema");
        return Err(vec![DATA_REQUIRED.to_owned()].into());
    };

    let mut errors = ValidationErrors::new();
    for field in fields {
        let value = data.get(field.slug.as_str());

        if field.is_group() || field.validators.group {
            let children = field.children().unwrap_or_default();
            if let Err(group_errors) = validate_form_data(value, children) {
                debug!(group = %field.slug, failures = group_errors.len(), "group failed validation");
                errors.push(format!(
                    "Field Group \"{}\" has missing or invalid values.",
                    field.slug
                ));
                errors.extend(group_errors);
            }
        }

        if field.validators.has_value_rules() && !validate_value(value, &field.validators) {
            debug!(field = %field.slug, "field failed validation");
            errors.push(format!("Field \"{}\" is missing or invalid.", field.slug));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
