//! In-memory registry of form definitions, keyed by form name.
//!
//! Definitions are preprocessed once when loaded, so request paths only
//! clone `Arc`s. The registry uses `arc-swap` for lock-free reads.

use std::{collections::HashMap, sync::Arc};

use arc_swap::ArcSwap;
use common::PiiError;
use thiserror::Error;
use tracing::info;

use super::field::Field;
use super::files::extract_file_paths;
use super::schema::{check_definition, make_public, preprocess};

/// Errors from the form registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The requested form name has no entry in the registry.
    #[error("unknown form: {0}")]
    UnknownForm(String),
}

/// A single registered form and the views derived from it.
#[derive(Debug, Clone)]
pub struct CachedForm {
    /// Preprocessed definition, used for validation and encryption.
    pub fields: Arc<Vec<Field>>,
    /// Same definition with server-only secrets removed.
    pub public_fields: Arc<Vec<Field>>,
    /// Dotted addresses of every file field.
    pub file_paths: Arc<Vec<String>>,
}

impl CachedForm {
    fn build(fields: &[Field]) -> Self {
        let fields = preprocess(fields);
        Self {
            public_fields: Arc::new(make_public(&fields)),
            file_paths: Arc::new(extract_file_paths(&fields)),
            fields: Arc::new(fields),
        }
    }
}

/// Shared, lock-free registry of forms keyed by name.
///
/// Clones share the same underlying map; [`FormRegistry::replace_all`]
/// atomically swaps in a new one.
#[derive(Clone, Debug)]
pub struct FormRegistry {
    inner: Arc<ArcSwap<HashMap<String, CachedForm>>>,
}

impl FormRegistry {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ArcSwap::new(Arc::new(HashMap::new()))),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.load().is_empty()
    }

    /// Look up a form by name.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownForm`] if `name` is not present.
    pub fn get(&self, name: &str) -> Result<CachedForm, RegistryError> {
        self.inner
            .load()
            .get(name)
            .cloned()
            .ok_or_else(|| RegistryError::UnknownForm(name.to_owned()))
    }

    /// Atomically replace every registered form.
    pub fn replace_all(&self, forms: HashMap<String, Vec<Field>>) {
        let new_map: HashMap<String, CachedForm> = forms
            .into_iter()
            .map(|(name, fields)| {
                let entry = CachedForm::build(&fields);
                (name, entry)
            })
            .collect();
        info!(forms = new_map.len(), "form registry replaced");
        self.inner.store(Arc::new(new_map));
    }
}

impl Default for FormRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse a definition written as YAML or JSON.
///
/// # Errors
///
/// - [`PiiError::Serialization`] if the text is neither.
/// - [`PiiError::BadRequest`] if a level has empty or duplicate slugs.
pub fn parse_definition(text: &str) -> Result<Vec<Field>, PiiError> {
    let fields: Vec<Field> = match serde_yaml::from_str(text) {
        Ok(fields) => fields,
        Err(_) => serde_json::from_str(text).map_err(|e| PiiError::Serialization(e.to_string()))?,
    };
    check_definition(&fields)?;
    Ok(fields)
}
