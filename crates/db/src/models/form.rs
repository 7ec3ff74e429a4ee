//! `forms` rows.

use hsseq_core::backend::BackendError;
use hsseq_core::form::{FormRecord, FormStatus};
use hsseq_core::types::{Id, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `forms` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct FormRow {
    pub id: Id,
    pub title: String,
    pub description: Option<String>,
    pub company_id: Id,
    pub created_by: Id,
    pub published: bool,
    pub status: String,
    pub version: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl TryFrom<FormRow> for FormRecord {
    type Error = BackendError;

    fn try_from(row: FormRow) -> Result<Self, Self::Error> {
        let status = row.status.parse::<FormStatus>().map_err(|_| {
            BackendError::ConstraintViolation(format!(
                "ck_forms_status: form {} has status '{}'",
                row.id, row.status
            ))
        })?;
        Ok(FormRecord {
            id: row.id,
            title: row.title,
            description: row.description,
            company_id: row.company_id,
            created_by: row.created_by,
            published: row.published,
            status,
            version: row.version,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
