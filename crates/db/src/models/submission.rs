//! `form_submissions` rows.

use hsseq_core::backend::BackendError;
use hsseq_core::submission::{DeviceInfo, GeoLocation, SubmissionRecord, SubmissionStatus};
use hsseq_core::types::{Id, Timestamp};
use sqlx::types::Json;
use sqlx::FromRow;

/// A row from the `form_submissions` table.
#[derive(Debug, Clone, FromRow)]
pub struct SubmissionRow {
    pub id: Id,
    pub form_id: Id,
    pub submitted_by: Id,
    pub submitted_at: Timestamp,
    pub data: serde_json::Value,
    pub status: String,
    pub location: Option<Json<GeoLocation>>,
    pub device_info: Option<Json<DeviceInfo>>,
}

impl TryFrom<SubmissionRow> for SubmissionRecord {
    type Error = BackendError;

    fn try_from(row: SubmissionRow) -> Result<Self, Self::Error> {
        let status = row.status.parse::<SubmissionStatus>().map_err(|_| {
            BackendError::ConstraintViolation(format!(
                "ck_form_submissions_status: submission {} has status '{}'",
                row.id, row.status
            ))
        })?;
        Ok(SubmissionRecord {
            id: row.id,
            form_id: row.form_id,
            submitted_by: row.submitted_by,
            submitted_at: row.submitted_at,
            data: row.data,
            status,
            location: row.location.map(|Json(l)| l),
            device_info: row.device_info.map(|Json(d)| d),
        })
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use hsseq_core::types::new_id;

    use super::*;

    fn row(status: &str) -> SubmissionRow {
        SubmissionRow {
            id: new_id(),
            form_id: new_id(),
            submitted_by: new_id(),
            submitted_at: chrono::Utc::now(),
            data: serde_json::json!({ "hazard": "Loose cable" }),
            status: status.into(),
            location: Some(Json(GeoLocation {
                latitude: 52.37,
                longitude: 4.9,
                accuracy: 12.0,
            })),
            device_info: None,
        }
    }

    #[test]
    fn json_columns_are_unwrapped() {
        let record = SubmissionRecord::try_from(row("approved")).unwrap();
        assert_eq!(record.status, SubmissionStatus::Approved);
        assert_eq!(record.location.unwrap().accuracy, 12.0);
        assert!(record.device_info.is_none());
        assert_eq!(record.data["hazard"], "Loose cable");
    }

    #[test]
    fn unknown_status_is_a_constraint_violation() {
        assert_matches!(
            SubmissionRecord::try_from(row("lost")),
            Err(BackendError::ConstraintViolation(_))
        );
    }
}
