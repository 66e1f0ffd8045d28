//! Conversion between submitted [`FieldResult`] trees and plain JSON objects.

use common::{FieldResult, FieldValue};
use serde_json::{Map, Value};

/// Flatten a result tree into a nested object keyed by slug.
///
/// Results with an empty slug, or whose slug is in `excluded_slugs` (at any
/// depth), are dropped. Group results become nested objects; everything
/// else, including plain arrays, is copied as-is.
pub fn field_results_to_object(results: &[FieldResult], excluded_slugs: &[&str]) -> Map<String, Value> {
    let mut obj = Map::new();
    for result in results {
        if result.slug.is_empty() || excluded_slugs.contains(&result.slug.as_str()) {
            continue;
        }
        let value = match &result.value {
            FieldValue::Nested(children) => Value::Object(field_results_to_object(children, excluded_slugs)),
            FieldValue::Scalar(value) => value.clone(),
        };
        obj.insert(result.slug.clone(), value);
    }
    obj
}

/// Rebuild a result tree from a plain object.
///
/// Nested objects become group results; arrays and `null` stay scalar so
/// that [`field_results_to_object`] gives the original object back.
pub fn object_to_field_results(obj: &Map<String, Value>) -> Vec<FieldResult> {
    obj.iter()
        .map(|(slug, value)| match value {
            Value::Object(inner) => FieldResult::nested(slug.clone(), object_to_field_results(inner)),
            other => FieldResult::scalar(slug.clone(), other.clone()),
        })
        .collect()
}

/// Slugs of a result tree in order; with `recursive`, each group's slug is
/// followed by its children's.
pub fn extract_result_slugs(results: &[FieldResult], recursive: bool) -> Vec<String> {
    let mut slugs = Vec::new();
    for result in results {
        slugs.push(result.slug.clone());
        if recursive {
            if let FieldValue::Nested(children) = &result.value {
                slugs.extend(extract_result_slugs(children, recursive));
            }
        }
    }
    slugs
}

/// Depth-first search for a result by slug at any level.
pub fn find_result<'a>(slug: &str, results: &'a [FieldResult]) -> Option<&'a FieldResult> {
    for result in results {
        if result.slug == slug {
            return Some(result);
        }
        if let Some(found) = result
            .value
            .as_nested()
            .and_then(|children| find_result(slug, children))
        {
            return Some(found);
        }
    }
    None
}
