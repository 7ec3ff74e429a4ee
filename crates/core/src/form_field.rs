//! Form field definitions (field types, layout hints, validation rules).
//!
//! A [`FormField`] is the unit the form builder edits. Its position in the
//! form is carried by `order_index`, which is owned by
//! [`FieldList`](crate::field_list::FieldList) and must never be edited
//! through a [`FieldPatch`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::CoreError;
use crate::types::{new_id, Id};

// ---------------------------------------------------------------------------
// Field types
// ---------------------------------------------------------------------------

/// The fixed vocabulary of field types offered by the builder palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Textarea,
    Number,
    Date,
    Checkbox,
    Select,
    Radio,
    File,
    Image,
    Richtext,
    Location,
    Signature,
    Table,
    Section,
    Separator,
    Spacer,
    Email,
    #[serde(alias = "phone")]
    Tel,
    Url,
    Rating,
    Slider,
}

impl FieldType {
    /// Every field type, in palette order.
    pub const ALL: &'static [FieldType] = &[
        Self::Text,
        Self::Textarea,
        Self::Number,
        Self::Date,
        Self::Checkbox,
        Self::Select,
        Self::Radio,
        Self::File,
        Self::Image,
        Self::Richtext,
        Self::Location,
        Self::Signature,
        Self::Table,
        Self::Section,
        Self::Separator,
        Self::Spacer,
        Self::Email,
        Self::Tel,
        Self::Url,
        Self::Rating,
        Self::Slider,
    ];

    /// Wire tag used in JSON payloads and the `field_type` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Textarea => "textarea",
            Self::Number => "number",
            Self::Date => "date",
            Self::Checkbox => "checkbox",
            Self::Select => "select",
            Self::Radio => "radio",
            Self::File => "file",
            Self::Image => "image",
            Self::Richtext => "richtext",
            Self::Location => "location",
            Self::Signature => "signature",
            Self::Table => "table",
            Self::Section => "section",
            Self::Separator => "separator",
            Self::Spacer => "spacer",
            Self::Email => "email",
            Self::Tel => "tel",
            Self::Url => "url",
            Self::Rating => "rating",
            Self::Slider => "slider",
        }
    }

    /// Label given to a freshly added field of this type.
    pub fn default_label(&self) -> &'static str {
        match self {
            Self::Text => "Text Field",
            Self::Textarea => "Text Area",
            Self::Number => "Number",
            Self::Date => "Date",
            Self::Checkbox => "Checkbox",
            Self::Select => "Dropdown",
            Self::Radio => "Radio Group",
            Self::File => "File Upload",
            Self::Image => "Image",
            Self::Richtext => "Rich Text",
            Self::Location => "Location",
            Self::Signature => "Signature",
            Self::Table => "Table",
            Self::Section => "Section",
            Self::Separator => "Separator",
            Self::Spacer => "Spacer",
            Self::Email => "Email",
            Self::Tel => "Phone",
            Self::Url => "URL",
            Self::Rating => "Rating",
            Self::Slider => "Slider",
        }
    }

    /// Choice types carry an option list.
    pub fn is_choice(&self) -> bool {
        matches!(self, Self::Select | Self::Radio)
    }

    /// Layout-only types never collect a value.
    pub fn is_decorative(&self) -> bool {
        matches!(self, Self::Section | Self::Separator | Self::Spacer)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "phone" {
            return Ok(Self::Tel);
        }
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| CoreError::MalformedInput(format!("Unknown field type '{s}'")))
    }
}

// ---------------------------------------------------------------------------
// Layout
// ---------------------------------------------------------------------------

/// Rendering width hint for a field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldLayout {
    #[default]
    Full,
    Half,
    Third,
}

impl FieldLayout {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Half => "half",
            Self::Third => "third",
        }
    }
}

impl FromStr for FieldLayout {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "full" => Ok(Self::Full),
            "half" => Ok(Self::Half),
            "third" => Ok(Self::Third),
            other => Err(CoreError::MalformedInput(format!(
                "Unknown field layout '{other}'"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Options and validation rules
// ---------------------------------------------------------------------------

/// One choice of a select or radio field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldOption {
    pub label: String,
    pub value: String,
}

/// Number of options a new choice field starts with.
pub const DEFAULT_OPTION_COUNT: usize = 3;

/// `Option 1`/`option-1` .. `Option N`/`option-N`.
pub fn default_options() -> Vec<FieldOption> {
    (1..=DEFAULT_OPTION_COUNT)
        .map(|n| FieldOption {
            label: format!("Option {n}"),
            value: format!("option-{n}"),
        })
        .collect()
}

/// Input constraints attached to a field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationRules {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

impl ValidationRules {
    /// Check that the rules are self-consistent, numeric bounds are finite
    /// and the pattern compiles.
    pub fn check(&self) -> Result<(), CoreError> {
        for (name, bound) in [("min", self.min), ("max", self.max)] {
            if let Some(value) = bound.filter(|v| !v.is_finite()) {
                return Err(CoreError::Validation(format!(
                    "{name} must be a finite number, got {value}"
                )));
            }
        }
        if let (Some(min), Some(max)) = (self.min_length, self.max_length) {
            if min > max {
                return Err(CoreError::Validation(format!(
                    "minLength {min} is greater than maxLength {max}"
                )));
            }
        }
        if let (Some(min), Some(max)) = (self.min, self.max) {
            if min > max {
                return Err(CoreError::Validation(format!(
                    "min {min} is greater than max {max}"
                )));
            }
        }
        if let Some(pattern) = &self.pattern {
            regex::Regex::new(pattern).map_err(|e| {
                CoreError::Validation(format!("Invalid pattern '{pattern}': {e}"))
            })?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// FormField
// ---------------------------------------------------------------------------

/// A single input definition within a form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormField {
    pub id: Id,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<FieldOption>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationRules>,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub readonly: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    #[serde(default)]
    pub layout: FieldLayout,
    #[serde(default)]
    pub order_index: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<Id>,
}

impl FormField {
    /// Create a field of the given type with palette defaults and a fresh id.
    pub fn new(field_type: FieldType) -> Self {
        Self::with_label(field_type, field_type.default_label())
    }

    /// Create a field of the given type with a custom label.
    pub fn with_label(field_type: FieldType, label: &str) -> Self {
        Self {
            id: new_id(),
            field_type,
            label: label.to_string(),
            placeholder: Some(format!("Enter {}", label.to_lowercase())),
            required: false,
            options: field_type.is_choice().then(default_options),
            description: None,
            validation: None,
            hidden: false,
            readonly: false,
            default_value: None,
            layout: FieldLayout::Full,
            order_index: 0,
            parent_id: None,
        }
    }

    /// Check the field's attributes for consistency.
    pub fn validate(&self) -> Result<(), CoreError> {
        if let Some(options) = &self.options {
            if !self.field_type.is_choice() && !options.is_empty() {
                return Err(CoreError::Validation(format!(
                    "Field '{}' of type {} cannot have options",
                    self.label, self.field_type
                )));
            }
            for (i, option) in options.iter().enumerate() {
                if options[..i].iter().any(|o| o.value == option.value) {
                    return Err(CoreError::Validation(format!(
                        "Field '{}' has duplicate option value '{}'",
                        self.label, option.value
                    )));
                }
            }
        }
        if self.parent_id == Some(self.id) {
            return Err(CoreError::Validation(format!(
                "Field '{}' cannot be its own parent",
                self.label
            )));
        }
        if let Some(rules) = &self.validation {
            rules.check()?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Partial updates
// ---------------------------------------------------------------------------

/// Deserialize a present-but-null JSON value as `Some(None)`.
fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Attributes to merge into an existing field.
///
/// `None` leaves an attribute unchanged. Nullable attributes use
/// `Option<Option<T>>` so an explicit `null` clears them.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldPatch {
    #[serde(rename = "type")]
    pub field_type: Option<FieldType>,
    pub label: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub placeholder: Option<Option<String>>,
    pub required: Option<bool>,
    #[serde(default, deserialize_with = "double_option")]
    pub options: Option<Option<Vec<FieldOption>>>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub validation: Option<Option<ValidationRules>>,
    pub hidden: Option<bool>,
    pub readonly: Option<bool>,
    #[serde(default, deserialize_with = "double_option")]
    pub default_value: Option<Option<String>>,
    pub layout: Option<FieldLayout>,
    #[serde(default, deserialize_with = "double_option")]
    pub parent_id: Option<Option<Id>>,
}

impl FieldPatch {
    /// Merge the patch into `field`. Returns `true` if anything changed.
    pub fn apply(&self, field: &mut FormField) -> bool {
        let before = field.clone();

        if let Some(t) = self.field_type {
            field.field_type = t;
        }
        if let Some(label) = &self.label {
            field.label.clone_from(label);
        }
        if let Some(placeholder) = &self.placeholder {
            field.placeholder.clone_from(placeholder);
        }
        if let Some(required) = self.required {
            field.required = required;
        }
        if let Some(options) = &self.options {
            field.options.clone_from(options);
        }
        if let Some(description) = &self.description {
            field.description.clone_from(description);
        }
        if let Some(validation) = &self.validation {
            field.validation.clone_from(validation);
        }
        if let Some(hidden) = self.hidden {
            field.hidden = hidden;
        }
        if let Some(readonly) = self.readonly {
            field.readonly = readonly;
        }
        if let Some(default_value) = &self.default_value {
            field.default_value.clone_from(default_value);
        }
        if let Some(layout) = self.layout {
            field.layout = layout;
        }
        if let Some(parent_id) = self.parent_id {
            field.parent_id = parent_id;
        }

        *field != before
    }
}

// ---------------------------------------------------------------------------
// Palette drop payloads
// ---------------------------------------------------------------------------

/// Payload carried by a palette item dragged onto the canvas.
#[derive(Debug, Clone, Deserialize)]
struct DropPayload {
    id: String,
    name: Option<String>,
}

/// Parse a dropped palette payload into a new field.
///
/// The payload is `{"id": <type tag>, "name": <label>}`. A missing name
/// falls back to the type's default label.
pub fn field_from_drop_payload(payload: &str) -> Result<FormField, CoreError> {
    let parsed: DropPayload = serde_json::from_str(payload)
        .map_err(|e| CoreError::MalformedInput(format!("Unparseable drop payload: {e}")))?;
    let field_type: FieldType = parsed.id.parse()?;
    let field = match parsed.name.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => FormField::with_label(field_type, name),
        _ => FormField::new(field_type),
    };
    Ok(field)
}
