//! File fields: schema addresses, the upload call contract, and splicing
//! stored paths back into submitted results.
//!
//! Files arrive out of band (multipart) and are uploaded before the form
//! result is stored. Callers must await [`upload_files`] before calling
//! [`merge_files`].

use bytes::Bytes;
use common::{FieldResult, FieldValue, PiiError};
use serde_json::Value;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::field::{Field, FieldKind};

/// Path segment meaning "inside a group's list of results".
pub const GROUP_SEGMENT: &str = "[]";

/// A file received with a submission, not yet stored.
#[derive(Debug, Clone)]
pub struct PendingFile {
    /// Slug of the file field this upload answers.
    pub field_name: String,
    pub original_name: String,
    pub mime_type: String,
    pub bytes: Bytes,
}

/// A stored file and the path the store returned for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub field_name: String,
    pub original_name: String,
    pub mime_type: String,
    pub path: String,
}

/// Object storage used for uploaded form files.
#[trait_variant::make(FileStore: Send)]
pub trait LocalFileStore {
    /// Store `bytes` as `folder/object_name` and return the stored path.
    async fn upload(
        &self,
        bytes: Bytes,
        object_name: &str,
        mime_type: &str,
        folder: &str,
    ) -> Result<String, PiiError>;
}

/// Upload every pending file, one at a time, under a unique object name.
///
/// # Errors
///
/// Returns [`PiiError::Upload`] on the first failed or empty-path upload;
/// files already stored are not rolled back.
pub async fn upload_files<S: FileStore>(
    store: &S,
    files: &[PendingFile],
    folder: &str,
) -> Result<Vec<UploadedFile>, PiiError> {
    let mut uploaded = Vec::with_capacity(files.len());
    for file in files {
        let object_name = format!("{}-{}", Uuid::new_v4(), file.original_name);
        let path = store
            .upload(file.bytes.clone(), &object_name, &file.mime_type, folder)
            .await
            .map_err(|e| {
                warn!(field = %file.field_name, error = %e, "file upload failed");
                PiiError::Upload(format!("error uploading file for field \"{}\"", file.field_name))
            })?;
        if path.is_empty() {
            return Err(PiiError::Upload(format!(
                "store returned no path for field \"{}\"",
                file.field_name
            )));
        }
        uploaded.push(UploadedFile {
            field_name: file.field_name.clone(),
            original_name: file.original_name.clone(),
            mime_type: file.mime_type.clone(),
            path,
        });
    }
    info!(count = uploaded.len(), folder = %folder, "form files uploaded");
    Ok(uploaded)
}

/// Dotted addresses of every file field, e.g. `"receipt"` or
/// `"documents.[].passport"` for a file inside the `documents` group.
pub fn extract_file_paths(fields: &[Field]) -> Vec<String> {
    let mut paths = Vec::new();
    collect_file_paths(fields, "", &mut paths);
    paths
}

fn collect_file_paths(fields: &[Field], prefix: &str, out: &mut Vec<String>) {
    for field in fields {
        let path = if prefix.is_empty() {
            field.slug.clone()
        } else {
            format!("{prefix}.{}", field.slug)
        };
        match &field.kind {
            FieldKind::File => out.push(path),
            FieldKind::Group { fields } => {
                collect_file_paths(fields, &format!("{path}.{GROUP_SEGMENT}"), out)
            }
            _ => {}
        }
    }
}

/// Values found anywhere in `input` under the slug of any file field.
///
/// `null` and empty-string values are skipped.
pub fn extract_files(input: &Value, fields: &[Field]) -> Vec<Value> {
    extract_file_paths(fields)
        .iter()
        .filter_map(|path| path.rsplit('.').next())
        .filter_map(|slug| find_property(input, slug))
        .filter(|v| !v.is_null() && v.as_str() != Some(""))
        .cloned()
        .collect()
}

/// Depth-first search of objects and arrays for the first property named `key`.
pub fn find_property<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    match value {
        Value::Object(map) => {
            for (k, v) in map {
                if k == key {
                    return Some(v);
                }
                if let Some(found) = find_property(v, key) {
                    return Some(found);
                }
            }
            None
        }
        Value::Array(items) => items.iter().find_map(|item| find_property(item, key)),
        _ => None,
    }
}

/// Copy of `input` with every uploaded file's stored path placed at its
/// schema address.
///
/// A top-level file result is replaced or appended. For a file inside a
/// group, the group's result must already be present (a `null` value is
/// treated as an empty group); the file result is then replaced or appended
/// among its children. Addresses that do not match the submitted shape, and
/// file fields with no upload, are skipped.
pub fn merge_files(input: &[FieldResult], fields: &[Field], uploaded: &[UploadedFile]) -> Vec<FieldResult> {
    let mut merged = input.to_vec();
    for path in extract_file_paths(fields) {
        let segments: Vec<&str> = path.split('.').collect();
        let Some(file_slug) = segments.last() else {
            continue;
        };
        let Some(upload) = uploaded.iter().find(|u| u.field_name == *file_slug) else {
            continue;
        };
        if !splice(&mut merged, &segments, &upload.path) {
            debug!(path = %path, "uploaded file does not match submitted shape; skipped");
        }
    }
    merged
}

fn splice(results: &mut Vec<FieldResult>, segments: &[&str], stored_path: &str) -> bool {
    match segments {
        [slug] => {
            let value = FieldValue::Scalar(Value::String(stored_path.to_owned()));
            match results.iter_mut().find(|r| r.slug == *slug) {
                Some(existing) => existing.value = value,
                None => results.push(FieldResult::new(*slug, value)),
            }
            true
        }
        [group, GROUP_SEGMENT, rest @ ..] if !rest.is_empty() => {
            let Some(target) = results.iter_mut().find(|r| r.slug == *group) else {
                return false;
            };
            if target.value.is_null() {
                target.value = FieldValue::Nested(Vec::new());
            }
            match &mut target.value {
                FieldValue::Nested(children) => splice(children, rest, stored_path),
                FieldValue::Scalar(_) => false,
            }
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    fn schema() -> Vec<Field> {
        vec![
            Field::text("name"),
            Field::file("receipt"),
            Field::group("documents", vec![Field::text("note"), Field::file("passport")]),
        ]
    }

    fn upload(field: &str, path: &str) -> UploadedFile {
        UploadedFile {
            field_name: field.into(),
            original_name: format!("{field}.pdf"),
            mime_type: "application/pdf".into(),
            path: path.into(),
        }
    }

    #[test]
    fn file_paths_use_group_segment() {
        assert_eq!(extract_file_paths(&schema()), vec!["receipt", "documents.[].passport"]);
    }

    #[test]
    fn merge_appends_top_level_and_nested() {
        let input = vec![
            FieldResult::scalar("name", "Ann"),
            FieldResult::nested("documents", vec![FieldResult::scalar("note", "hi")]),
        ];
        let uploaded = vec![upload("receipt", "forms/r.pdf"), upload("passport", "forms/p.pdf")];
        let merged = merge_files(&input, &schema(), &uploaded);

        assert_eq!(merged[2], FieldResult::scalar("receipt", "forms/r.pdf"));
        let docs = merged[1].value.as_nested().unwrap();
        assert_eq!(docs[1], FieldResult::scalar("passport", "forms/p.pdf"));
        // Input untouched.
        assert_eq!(input.len(), 2);
    }

    #[test]
    fn merge_replaces_existing_entries() {
        let input = vec![
            FieldResult::scalar("receipt", "placeholder"),
            FieldResult::nested("documents", vec![FieldResult::scalar("passport", "old")]),
        ];
        let uploaded = vec![upload("receipt", "new-r"), upload("passport", "new-p")];
        let merged = merge_files(&input, &schema(), &uploaded);
        assert_eq!(merged[0], FieldResult::scalar("receipt", "new-r"));
        assert_eq!(merged[1].value.as_nested().unwrap()[0], FieldResult::scalar("passport", "new-p"));
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn merge_fills_null_group() {
        let input = vec![FieldResult::scalar("documents", Value::Null)];
        let merged = merge_files(&input, &schema(), &[upload("passport", "p")]);
        assert_eq!(
            merged[0],
            FieldResult::nested("documents", vec![FieldResult::scalar("passport", "p")])
        );
    }

    #[test]
    fn merge_skips_mismatched_shapes() {
        // Group absent, and group present as a non-list scalar.
        let merged = merge_files(&[], &schema(), &[upload("passport", "p")]);
        assert!(merged.is_empty());

        let input = vec![FieldResult::scalar("documents", "oops")];
        let merged = merge_files(&input, &schema(), &[upload("passport", "p")]);
        assert_eq!(merged, input);
    }

    #[test]
    fn extract_files_finds_values_at_any_depth() {
        let input = json!({
            "receipt": "r.pdf",
            "documents": {"note": "x", "passport": "p.pdf"}
        });
        assert_eq!(extract_files(&input, &schema()), vec![json!("r.pdf"), json!("p.pdf")]);

        let sparse = json!({"receipt": null});
        assert!(extract_files(&sparse, &schema()).is_empty());
    }

    struct RecordingStore {
        names: Mutex<Vec<String>>,
    }

    impl FileStore for RecordingStore {
        async fn upload(
            &self,
            bytes: Bytes,
            object_name: &str,
            _mime_type: &str,
            folder: &str,
        ) -> Result<String, PiiError> {
            assert!(!bytes.is_empty());
            self.names.lock().unwrap().push(object_name.to_owned());
            Ok(format!("{folder}/{object_name}"))
        }
    }

    struct FailingStore;

    impl FileStore for FailingStore {
        async fn upload(&self, _: Bytes, _: &str, _: &str, _: &str) -> Result<String, PiiError> {
            Err(PiiError::Upload("bucket unavailable".into()))
        }
    }

    fn pending(field: &str) -> PendingFile {
        PendingFile {
            field_name: field.into(),
            original_name: "scan.pdf".into(),
            mime_type: "application/pdf".into(),
            bytes: Bytes::from_static(b"%PDF-1.4"),
        }
    }

    #[tokio::test]
    async fn upload_files_gives_unique_names() {
        let store = RecordingStore {
            names: Mutex::new(Vec::new()),
        };
        let uploaded = upload_files(&store, &[pending("receipt"), pending("passport")], "forms")
            .await
            .unwrap();

        assert_eq!(uploaded.len(), 2);
        assert_eq!(uploaded[1].field_name, "passport");
        assert!(uploaded[0].path.starts_with("forms/"));
        assert!(uploaded[0].path.ends_with("-scan.pdf"));
        let names = store.names.lock().unwrap();
        assert_ne!(names[0], names[1]);
    }

    #[tokio::test]
    async fn upload_failure_aborts() {
        let result = upload_files(&FailingStore, &[pending("receipt")], "forms").await;
        assert!(matches!(result, Err(PiiError::Upload(_))));
    }
}
