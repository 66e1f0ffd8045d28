//! Canonical identity strings for duplicate detection.
//!
//! The normalized value is stored next to the user-entered one and used only
//! for lookups and uniqueness checks, so users cannot claim extra entries by
//! writing the same mailbox or number slightly differently.

use std::collections::HashSet;

use crate::config::PiiConfig;

/// Email normalizer configured with the set of dot-insensitive mail domains.
#[derive(Debug, Clone)]
pub struct Normalizer {
    dot_insensitive: HashSet<String>,
}

impl Normalizer {
    pub fn new<I, S>(dot_insensitive_domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            dot_insensitive: dot_insensitive_domains
                .into_iter()
                .map(|d| d.as_ref().to_lowercase())
                .collect(),
        }
    }

    pub fn from_config(cfg: &PiiConfig) -> Self {
        Self::new(&cfg.dot_insensitive_domains)
    }

    /// Lower-case, drop `+` sub-addressing, and drop `.` from the local part
    /// for dot-insensitive domains. Only the first two `@`-separated segments
    /// are kept. `None` for empty input.
    ///
    /// Idempotent: normalizing a normalized address returns it unchanged.
    pub fn normalize_email(&self, email: &str) -> Option<String> {
        if email.is_empty() {
            return None;
        }
        let email = email.to_lowercase();
        // Anything after a second `@` is dropped.
        let mut parts = email.split('@');
        let local = parts.next().unwrap_or_default();
        let domain = parts.next();

        let mut local = match local.split_once('+') {
            Some((head, _)) => head.to_owned(),
            None => local.to_owned(),
        };

        match domain {
            Some(domain) => {
                if self.dot_insensitive.contains(domain) {
                    local.retain(|c| c != '.');
                }
                Some(format!("{local}@{domain}"))
            }
            None => Some(local),
        }
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::from_config(&PiiConfig::default())
    }
}

/// Remove `.`, `+`, `-` and whitespace. `None` for empty input.
///
/// Parentheses are kept, so `(555) 123` and `555 123` stay distinct.
pub fn normalize_phone(phone: &str) -> Option<String> {
    if phone.is_empty() {
        return None;
    }
    Some(
        phone
            .chars()
            .filter(|c| !matches!(c, '.' | '+' | '-') && !c.is_whitespace())
            .collect(),
    )
}
