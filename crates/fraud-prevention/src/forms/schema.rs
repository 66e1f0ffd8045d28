//! Schema preprocessing and lookup helpers.
//!
//! Every function here takes the definition by reference and returns a new
//! value, so a definition shared across concurrent requests is never mutated.

use std::collections::HashSet;

use common::PiiError;
use serde_json::{Map, Value};

use super::field::{Field, FieldKind};

/// Canonicalise a definition before use.
///
/// For every select field, shorthand options become `{value}` entries and,
/// unless the field already has a non-empty `values` validator, one is
/// derived from the options. Groups are processed recursively.
pub fn preprocess(fields: &[Field]) -> Vec<Field> {
    fields.iter().cloned().map(preprocess_field).collect()
}

fn preprocess_field(mut field: Field) -> Field {
    match &mut field.kind {
        FieldKind::Group { fields } => *fields = preprocess(fields),
        FieldKind::Select { options } => {
            options.iter_mut().for_each(|o| o.expand());

            let has_values = field
                .validators
                .values
                .as_ref()
                .is_some_and(|v| !v.is_empty());
            if !has_values {
                field.validators.values = Some(options.iter().map(|o| o.value().clone()).collect());
            }
        }
        _ => {}
    }
    field
}

/// Copy of the definition that is safe to show to an untrusted client.
///
/// Strips the reCAPTCHA server secret, recursing into groups.
pub fn make_public(fields: &[Field]) -> Vec<Field> {
    fields
        .iter()
        .map(|field| {
            let mut field = field.clone();
            match &mut field.kind {
                FieldKind::Group { fields } => *fields = make_public(fields),
                FieldKind::ReCaptcha => {
                    if let Some(rc) = field.validators.re_captcha.as_mut() {
                        rc.secret = None;
                    }
                }
                _ => {}
            }
            field
        })
        .collect()
}

/// Check the sibling-uniqueness invariant of slugs at every level.
///
/// # Errors
///
/// Returns [`PiiError::BadRequest`] naming the first empty or duplicated slug.
pub fn check_definition(fields: &[Field]) -> Result<(), PiiError> {
    let mut seen = HashSet::new();
    for field in fields {
        if field.slug.is_empty() {
            return Err(PiiError::BadRequest("field definition contains an empty slug".into()));
        }
        if !seen.insert(field.slug.as_str()) {
            return Err(PiiError::BadRequest(format!(
                "slug \"{}\" is declared more than once",
                field.slug
            )));
        }
        if let Some(children) = field.children() {
            check_definition(children)?;
        }
    }
    Ok(())
}

/// Slugs of `fields` in order; with `recursive`, each group's slug is
/// followed by its children's.
pub fn extract_slugs(fields: &[Field], recursive: bool) -> Vec<String> {
    let mut slugs = Vec::new();
    for field in fields {
        slugs.push(field.slug.clone());
        if recursive {
            if let Some(children) = field.children() {
                slugs.extend(extract_slugs(children, recursive));
            }
        }
    }
    slugs
}

/// Depth-first search for a field by slug at any level.
pub fn find_field<'a>(slug: &str, fields: &'a [Field]) -> Option<&'a Field> {
    for field in fields {
        if field.slug == slug {
            return Some(field);
        }
        if let Some(found) = field.children().and_then(|c| find_field(slug, c)) {
            return Some(found);
        }
    }
    None
}

/// Whether `obj` has any key that `reference` lacks.
pub fn has_extra_keys(obj: &Map<String, Value>, reference: &Map<String, Value>) -> bool {
    obj.keys().any(|k| !reference.contains_key(k))
}
