//! Form submissions: filled-in instances of a published form.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::form::{FormRecord, FormStatus};
use crate::form_field::FormField;
use crate::types::{Id, Timestamp};

/// Review status of a submission.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    #[default]
    Submitted,
    InProgress,
    Rejected,
    Approved,
}

impl SubmissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Submitted => "submitted",
            Self::InProgress => "in_progress",
            Self::Rejected => "rejected",
            Self::Approved => "approved",
        }
    }
}

impl std::str::FromStr for SubmissionStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "submitted" => Ok(Self::Submitted),
            "in_progress" => Ok(Self::InProgress),
            "rejected" => Ok(Self::Rejected),
            "approved" => Ok(Self::Approved),
            other => Err(CoreError::MalformedInput(format!(
                "Unknown submission status '{other}'"
            ))),
        }
    }
}

/// Where the submitting device was.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoLocation {
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy: f64,
}

/// What the submitting device was.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceInfo {
    pub user_agent: String,
    pub platform: String,
}

/// A persisted submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionRecord {
    pub id: Id,
    pub form_id: Id,
    pub submitted_by: Id,
    pub submitted_at: Timestamp,
    pub data: serde_json::Value,
    pub status: SubmissionStatus,
    pub location: Option<GeoLocation>,
    pub device_info: Option<DeviceInfo>,
}

/// Attributes for inserting a submission.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSubmission {
    pub form_id: Id,
    pub submitted_by: Id,
    pub data: serde_json::Value,
    pub location: Option<GeoLocation>,
    pub device_info: Option<DeviceInfo>,
}

/// Check that `data` can be accepted for `form`.
///
/// The form must be published, `data` must be a JSON object keyed by field
/// id, and every required, visible, value-bearing field must have a
/// non-empty value.
pub fn validate_submission(
    form: &FormRecord,
    fields: &[FormField],
    data: &serde_json::Value,
) -> Result<(), CoreError> {
    if form.status != FormStatus::Published {
        return Err(CoreError::Conflict(format!(
            "Form {} is {} and does not accept submissions",
            form.id, form.status
        )));
    }
    let Some(values) = data.as_object() else {
        return Err(CoreError::Validation(
            "Submission data must be a JSON object".into(),
        ));
    };

    let missing: Vec<&str> = fields
        .iter()
        .filter(|f| f.required && !f.hidden && !f.field_type.is_decorative())
        .filter(|f| is_blank(values.get(&f.id.to_string())))
        .map(|f| f.label.as_str())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Missing required fields: {}",
            missing.join(", ")
        )))
    }
}

fn is_blank(value: Option<&serde_json::Value>) -> bool {
    match value {
        None | Some(serde_json::Value::Null) => true,
        Some(serde_json::Value::String(s)) => s.trim().is_empty(),
        Some(serde_json::Value::Array(a)) => a.is_empty(),
        Some(_) => false,
    }
}
