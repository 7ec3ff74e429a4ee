//! Repository for the `form_submissions` table.

use hsseq_core::submission::NewSubmission;
use hsseq_core::types::Id;
use sqlx::types::Json;
use sqlx::PgPool;

use crate::models::submission::SubmissionRow;

/// Column list for `form_submissions` queries.
const COLUMNS: &str = "\
    id, form_id, submitted_by, submitted_at, data, status, location, device_info";

/// Provides data access for form submissions.
pub struct SubmissionRepo;

impl SubmissionRepo {
    pub async fn create(
        pool: &PgPool,
        submission: &NewSubmission,
    ) -> Result<SubmissionRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO form_submissions (form_id, submitted_by, data, location, device_info) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, SubmissionRow>(&query)
            .bind(submission.form_id)
            .bind(submission.submitted_by)
            .bind(&submission.data)
            .bind(submission.location.as_ref().map(Json))
            .bind(submission.device_info.as_ref().map(Json))
            .fetch_one(pool)
            .await
    }

    /// List a form's submissions, newest first.
    pub async fn list_by_form(
        pool: &PgPool,
        form_id: Id,
    ) -> Result<Vec<SubmissionRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM form_submissions \
             WHERE form_id = $1 ORDER BY submitted_at DESC"
        );
        sqlx::query_as::<_, SubmissionRow>(&query)
            .bind(form_id)
            .fetch_all(pool)
            .await
    }
}
