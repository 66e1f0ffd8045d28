//! Per-value checks for the typed subset of [`Validators`].

use serde_json::Value;
use tracing::warn;

use crate::forms::field::Validators;
use crate::forms::normalization::normalize_phone;

/// Maximum email length (per RFC 5321).
const EMAIL_MAX_LENGTH: usize = 254;

/// Whether `value` satisfies every rule in `validators`.
///
/// An absent value (missing, `null`, blank string, empty array or `false`)
/// passes unless the field is `required` or a reCAPTCHA.
pub fn validate_value(value: Option<&Value>, validators: &Validators) -> bool {
    let Some(value) = value.filter(|v| !is_blank(v)) else {
        return !validators.required && validators.re_captcha.is_none();
    };

    if let Some(allowed) = validators.values.as_ref().filter(|a| !a.is_empty()) {
        let ok = match value {
            Value::Array(items) => items.iter().all(|i| allowed.contains(i)),
            other => allowed.contains(other),
        };
        if !ok {
            return false;
        }
    }

    if validators.min_length.is_some() || validators.max_length.is_some() {
        let Some(len) = length_of(value) else {
            return false;
        };
        if validators.min_length.is_some_and(|min| len < min)
            || validators.max_length.is_some_and(|max| len > max)
        {
            return false;
        }
    }

    if validators.min.is_some() || validators.max.is_some() {
        let Some(n) = number_of(value) else {
            return false;
        };
        if validators.min.is_some_and(|min| n < min) || validators.max.is_some_and(|max| n > max) {
            return false;
        }
    }

    if let Some(pattern) = &validators.pattern {
        if !matches_pattern(value, pattern) {
            return false;
        }
    }

    if validators.email && !value.as_str().is_some_and(is_email) {
        return false;
    }

    if validators.phone && !value.as_str().is_some_and(is_phone) {
        return false;
    }

    // The token's presence is checked here; verifying it with the provider
    // is done by the caller's integration.
    if validators.re_captcha.is_some() && !value.is_string() {
        return false;
    }

    true
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null | Value::Bool(false) => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

fn length_of(value: &Value) -> Option<usize> {
    match value {
        Value::String(s) => Some(s.chars().count()),
        Value::Array(items) => Some(items.len()),
        _ => None,
    }
}

fn number_of(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn matches_pattern(value: &Value, pattern: &str) -> bool {
    let Some(s) = value.as_str() else {
        return false;
    };
    match regex_lite::Regex::new(&format!("^(?:{pattern})$")) {
        Ok(re) => re.is_match(s),
        Err(e) => {
            warn!(error = %e, "invalid pattern validator; rejecting value");
            false
        }
    }
}

/// Structural check only; deliverability is confirmed out of band.
pub fn is_email(email: &str) -> bool {
    if email.len() > EMAIL_MAX_LENGTH {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || local.len() > 64 || local.chars().any(char::is_whitespace) {
        return false;
    }
    if domain.is_empty() || !domain.contains('.') || domain.contains("..") {
        return false;
    }
    if domain.starts_with(['.', '-']) || domain.ends_with(['.', '-']) {
        return false;
    }
    domain
        .chars()
        .all(|c| c.is_alphanumeric() || c == '.' || c == '-')
}

/// 7 to 15 digits once separators are removed (E.164 bounds).
pub fn is_phone(phone: &str) -> bool {
    let Some(stripped) = normalize_phone(phone) else {
        return false;
    };
    let digits = stripped.chars().filter(char::is_ascii_digit).count();
    stripped
        .chars()
        .all(|c| c.is_ascii_digit() || c == '(' || c == ')')
        && (7..=15).contains(&digits)
}
