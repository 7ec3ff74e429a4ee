//! Form records, lifecycle status and the publish/archive transitions.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{Id, Timestamp};

/// Maximum length of a form title.
pub const MAX_TITLE_LEN: usize = 200;

/// Maximum number of fields a single form may hold.
pub const MAX_FIELDS_PER_FORM: usize = 500;

/// Title given to a form the user has not named yet.
pub const UNTITLED_FORM: &str = "Untitled Form";

/// Lifecycle status of a form.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormStatus {
    #[default]
    Draft,
    Published,
    Archived,
}

impl FormStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Published => "published",
            Self::Archived => "archived",
        }
    }
}

impl fmt::Display for FormStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FormStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(Self::Draft),
            "published" => Ok(Self::Published),
            "archived" => Ok(Self::Archived),
            other => Err(CoreError::MalformedInput(format!(
                "Unknown form status '{other}'"
            ))),
        }
    }
}

/// A persisted form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormRecord {
    pub id: Id,
    pub title: String,
    pub description: Option<String>,
    pub company_id: Id,
    pub created_by: Id,
    pub published: bool,
    pub status: FormStatus,
    pub version: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl FormRecord {
    /// `published` implies `status == published`, and vice versa.
    pub fn is_consistent(&self) -> bool {
        self.published == (self.status == FormStatus::Published)
    }

    /// Compute the update that publishes this form.
    pub fn publish_update(&self) -> Result<FormUpdate, CoreError> {
        if self.status == FormStatus::Archived {
            return Err(CoreError::Conflict(
                "Archived forms cannot be published".into(),
            ));
        }
        Ok(FormUpdate {
            published: Some(true),
            status: Some(FormStatus::Published),
            ..Default::default()
        })
    }

    /// Compute the update that archives this form.
    pub fn archive_update(&self) -> FormUpdate {
        FormUpdate {
            published: Some(false),
            status: Some(FormStatus::Archived),
            ..Default::default()
        }
    }
}

/// Attributes for inserting a new form.
///
/// The id is generated by the caller so fields can reference the form
/// before it is written.
#[derive(Debug, Clone, PartialEq)]
pub struct NewForm {
    pub id: Id,
    pub title: String,
    pub description: Option<String>,
    pub company_id: Id,
    pub created_by: Id,
}

/// Partial update of a form record. `None` leaves the column unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormUpdate {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub published: Option<bool>,
    pub status: Option<FormStatus>,
    pub version: Option<i32>,
}

impl FormUpdate {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Apply the update to a record in memory.
    pub fn apply_to(&self, record: &mut FormRecord) {
        if let Some(title) = &self.title {
            record.title.clone_from(title);
        }
        if let Some(description) = &self.description {
            record.description.clone_from(description);
        }
        if let Some(published) = self.published {
            record.published = published;
        }
        if let Some(status) = self.status {
            record.status = status;
        }
        if let Some(version) = self.version {
            record.version = version;
        }
    }
}

/// The form-level attributes of a form being edited.
///
/// `form_id` is `None` until the first successful remote save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormDraft {
    pub form_id: Option<Id>,
    pub title: String,
    pub description: Option<String>,
}

impl Default for FormDraft {
    fn default() -> Self {
        Self {
            form_id: None,
            title: UNTITLED_FORM.to_string(),
            description: None,
        }
    }
}

/// Validate a form title.
pub fn validate_title(title: &str) -> Result<(), CoreError> {
    let len = title.trim().chars().count();
    if len == 0 {
        return Err(CoreError::Validation("Form title must not be empty".into()));
    }
    if len > MAX_TITLE_LEN {
        return Err(CoreError::Validation(format!(
            "Form title is {len} characters, exceeding the maximum of {MAX_TITLE_LEN}"
        )));
    }
    Ok(())
}

/// Validate that a field count does not exceed the per-form limit.
pub fn validate_field_count(count: usize) -> Result<(), CoreError> {
    if count > MAX_FIELDS_PER_FORM {
        Err(CoreError::Validation(format!(
            "Form has {count} fields, exceeding the maximum of {MAX_FIELDS_PER_FORM}"
        )))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::types::new_id;

    fn record(status: FormStatus, published: bool) -> FormRecord {
        let now = chrono::Utc::now();
        FormRecord {
            id: new_id(),
            title: "Site inspection".into(),
            description: None,
            company_id: new_id(),
            created_by: new_id(),
            published,
            status,
            version: 1,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn publish_keeps_flag_and_status_consistent() {
        let mut form = record(FormStatus::Draft, false);
        let update = form.publish_update().unwrap();
        update.apply_to(&mut form);
        assert!(form.published);
        assert_eq!(form.status, FormStatus::Published);
        assert!(form.is_consistent());
    }

    #[test]
    fn archived_form_cannot_be_published() {
        let form = record(FormStatus::Archived, false);
        assert_matches!(form.publish_update(), Err(CoreError::Conflict(_)));
    }

    #[test]
    fn archive_clears_published() {
        let mut form = record(FormStatus::Published, true);
        form.archive_update().apply_to(&mut form);
        assert!(!form.published);
        assert_eq!(form.status, FormStatus::Archived);
        assert!(form.is_consistent());
    }

    #[test]
    fn inconsistent_record_detected() {
        assert!(!record(FormStatus::Draft, true).is_consistent());
    }

    #[test]
    fn status_parses_from_column_value() {
        assert_eq!("archived".parse::<FormStatus>().unwrap(), FormStatus::Archived);
        assert!("deleted".parse::<FormStatus>().is_err());
    }

    #[test]
    fn title_limits() {
        assert!(validate_title("Toolbox talk").is_ok());
        assert!(validate_title("   ").is_err());
        assert!(validate_title(&"x".repeat(MAX_TITLE_LEN + 1)).is_err());
    }

    #[test]
    fn field_count_limit() {
        assert!(validate_field_count(MAX_FIELDS_PER_FORM).is_ok());
        let err = validate_field_count(MAX_FIELDS_PER_FORM + 1).unwrap_err();
        assert!(err.to_string().contains("exceeding the maximum"));
    }
}
