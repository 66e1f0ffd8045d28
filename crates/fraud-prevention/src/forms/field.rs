//! Declarative form schema: [`Field`] nodes, their kinds and validators.
//!
//! A definition is JSON (or YAML) such as:
//!
//! ```json
//! [
//!   {"slug": "email", "type": "email", "validators": {"required": true, "email": true}},
//!   {"slug": "country", "type": "select", "public": true, "options": ["US", "CA"]},
//!   {"slug": "address", "type": "group", "fields": [{"slug": "zip", "type": "text"}]}
//! ]
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One form input: its slug, kind, visibility and validation rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    /// Unique among siblings.
    pub slug: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    /// `false` (the default) means the value must be encrypted at rest.
    #[serde(default, skip_serializing_if = "is_false")]
    pub public: bool,

    #[serde(default, skip_serializing_if = "Validators::is_empty")]
    pub validators: Validators,

    #[serde(flatten)]
    pub kind: FieldKind,
}

/// The closed set of field kinds, tagged by the `type` attribute.
///
/// Only `select` carries options and only `group` carries child fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum FieldKind {
    Text,
    Email,
    Phone,
    Number,
    Date,
    Checkbox,
    Hidden,
    Select {
        #[serde(default)]
        options: Vec<SelectOption>,
    },
    Group {
        #[serde(default)]
        fields: Vec<Field>,
    },
    File,
    ReCaptcha,
}

/// A select option, either written out or as a bare value.
///
/// Bare values (`"US"`) are expanded to `{value: "US"}` by
/// [`super::schema::preprocess`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SelectOption {
    Labeled {
        value: Value,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
    },
    Shorthand(Value),
}

impl SelectOption {
    pub fn value(&self) -> &Value {
        match self {
            SelectOption::Labeled { value, .. } | SelectOption::Shorthand(value) => value,
        }
    }

    /// Rewrite shorthand into the labeled form.
    pub fn expand(&mut self) {
        if let SelectOption::Shorthand(value) = self {
            *self = SelectOption::Labeled {
                value: std::mem::take(value),
                label: None,
            };
        }
    }
}

/// Named constraints on a field's value.
///
/// The typed subset is enforced by [`super::validation`]; any other key is
/// preserved in `extra` and ignored during validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Validators {
    #[serde(default, skip_serializing_if = "is_false")]
    pub required: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,

    /// Regular expression the whole string value must match.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,

    /// Allowed values. Derived from the options of select fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<Value>>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub email: bool,

    #[serde(default, skip_serializing_if = "is_false")]
    pub phone: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub re_captcha: Option<ReCaptchaConfig>,

    /// Marks a field whose value is validated as a group of child fields.
    #[serde(default, skip_serializing_if = "is_false")]
    pub group: bool,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// reCAPTCHA settings. `secret` is server-only and stripped by
/// [`super::schema::make_public`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReCaptchaConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn is_false(b: &bool) -> bool {
    !*b
}

impl Validators {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Whether any rule applies to the field's own value (everything but the
    /// group marker).
    pub fn has_value_rules(&self) -> bool {
        let without_group = Validators {
            group: false,
            ..self.clone()
        };
        !without_group.is_empty()
    }
}

impl Field {
    pub fn new(slug: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            slug: slug.into(),
            label: None,
            public: false,
            validators: Validators::default(),
            kind,
        }
    }

    pub fn text(slug: impl Into<String>) -> Self {
        Self::new(slug, FieldKind::Text)
    }

    pub fn file(slug: impl Into<String>) -> Self {
        Self::new(slug, FieldKind::File)
    }

    pub fn group(slug: impl Into<String>, fields: Vec<Field>) -> Self {
        Self::new(slug, FieldKind::Group { fields })
    }

    pub fn select(slug: impl Into<String>, options: Vec<SelectOption>) -> Self {
        Self::new(slug, FieldKind::Select { options })
    }

    /// Mark the field as stored in clear.
    pub fn into_public(mut self) -> Self {
        self.public = true;
        self
    }

    pub fn with_validators(mut self, validators: Validators) -> Self {
        self.validators = validators;
        self
    }

    pub fn is_group(&self) -> bool {
        matches!(self.kind, FieldKind::Group { .. })
    }

    pub fn is_select(&self) -> bool {
        matches!(self.kind, FieldKind::Select { .. })
    }

    pub fn is_file(&self) -> bool {
        matches!(self.kind, FieldKind::File)
    }

    pub fn is_re_captcha(&self) -> bool {
        matches!(self.kind, FieldKind::ReCaptcha)
    }

    /// Child fields of a group, `None` for every other kind.
    pub fn children(&self) -> Option<&[Field]> {
        match &self.kind {
            FieldKind::Group { fields } => Some(fields),
            _ => None,
        }
    }

    /// Options of a select, `None` for every other kind.
    pub fn options(&self) -> Option<&[SelectOption]> {
        match &self.kind {
            FieldKind::Select { options } => Some(options),
            _ => None,
        }
    }
}
