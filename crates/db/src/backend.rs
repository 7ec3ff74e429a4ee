//! [`FormBackend`] over PostgreSQL.
//!
//! Multi-step writes (creating a form with its fields, applying a
//! reconciliation batch) run in a single transaction, so a failed save
//! leaves the stored form untouched.

use async_trait::async_trait;
use hsseq_core::backend::{BackendError, FieldChanges, FormBackend};
use hsseq_core::codec::FieldRecord;
use hsseq_core::form::{FormRecord, FormUpdate, NewForm};
use hsseq_core::submission::{NewSubmission, SubmissionRecord};
use hsseq_core::types::Id;

use crate::repositories::{FormFieldRepo, FormRepo, SubmissionRepo};
use crate::{health_check, DbPool};

/// SQLSTATE class of integrity constraint violations.
const INTEGRITY_CONSTRAINT_CLASS: &str = "23";
/// SQLSTATE class of connection exceptions.
const CONNECTION_EXCEPTION_CLASS: &str = "08";
/// Server shutting down, crashed, starting up, or out of connection slots.
const SERVER_UNAVAILABLE: [&str; 4] = ["57P01", "57P02", "57P03", "53300"];

#[derive(Clone)]
pub struct PgFormBackend {
    pool: DbPool,
}

impl PgFormBackend {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

/// Map a sqlx error onto the backend error taxonomy.
///
/// Only failures to reach the server are `Unreachable`. Anything else the
/// server or driver reports is `Internal` and will not succeed on retry.
pub fn classify_sqlx_error(err: sqlx::Error) -> BackendError {
    match err {
        sqlx::Error::RowNotFound => BackendError::NotFound {
            entity: "Row",
            id: Id::nil(),
        },
        sqlx::Error::Database(db_err) => {
            let code = db_err.code();
            classify_sqlstate(code.as_deref(), db_err.message())
        }
        sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_) => BackendError::Unreachable(err.to_string()),
        other => {
            tracing::error!(error = %other, "Unexpected database error");
            BackendError::Internal(other.to_string())
        }
    }
}

/// Map a database-reported error by its SQLSTATE.
pub fn classify_sqlstate(code: Option<&str>, message: &str) -> BackendError {
    match code {
        Some(code) if code.starts_with(INTEGRITY_CONSTRAINT_CLASS) => {
            BackendError::ConstraintViolation(message.to_string())
        }
        Some(code)
            if code.starts_with(CONNECTION_EXCEPTION_CLASS) || SERVER_UNAVAILABLE.contains(&code) =>
        {
            tracing::warn!(code, error = %message, "Database unavailable");
            BackendError::Unreachable(message.to_string())
        }
        _ => {
            tracing::error!(code = ?code, error = %message, "Database error");
            BackendError::Internal(message.to_string())
        }
    }
}

fn form_not_found(id: Id) -> BackendError {
    BackendError::NotFound { entity: "Form", id }
}

fn field_not_found(id: Id) -> BackendError {
    BackendError::NotFound {
        entity: "FormField",
        id,
    }
}

#[async_trait]
impl FormBackend for PgFormBackend {
    async fn ping(&self) -> Result<(), BackendError> {
        health_check(&self.pool).await.map_err(classify_sqlx_error)
    }

    async fn create_form(&self, form: &NewForm) -> Result<FormRecord, BackendError> {
        FormRepo::create(&self.pool, form)
            .await
            .map_err(classify_sqlx_error)?
            .try_into()
    }

    async fn create_form_with_fields(
        &self,
        form: &NewForm,
        fields: &[FieldRecord],
    ) -> Result<FormRecord, BackendError> {
        let mut tx = self.pool.begin().await.map_err(classify_sqlx_error)?;
        let row = FormRepo::create(&mut *tx, form)
            .await
            .map_err(classify_sqlx_error)?;
        FormFieldRepo::create_many(&mut *tx, fields)
            .await
            .map_err(classify_sqlx_error)?;
        tx.commit().await.map_err(classify_sqlx_error)?;

        tracing::debug!(form_id = %form.id, fields = fields.len(), "Form inserted");
        row.try_into()
    }

    async fn get_form(&self, id: Id) -> Result<Option<FormRecord>, BackendError> {
        FormRepo::find_by_id(&self.pool, id)
            .await
            .map_err(classify_sqlx_error)?
            .map(FormRecord::try_from)
            .transpose()
    }

    async fn list_forms(&self, company_id: Id) -> Result<Vec<FormRecord>, BackendError> {
        FormRepo::list_by_company(&self.pool, company_id)
            .await
            .map_err(classify_sqlx_error)?
            .into_iter()
            .map(FormRecord::try_from)
            .collect()
    }

    async fn update_form(&self, id: Id, update: &FormUpdate) -> Result<FormRecord, BackendError> {
        FormRepo::update(&self.pool, id, update)
            .await
            .map_err(classify_sqlx_error)?
            .ok_or_else(|| form_not_found(id))?
            .try_into()
    }

    async fn delete_form(&self, id: Id) -> Result<(), BackendError> {
        let deleted = FormRepo::delete(&self.pool, id)
            .await
            .map_err(classify_sqlx_error)?;
        if deleted {
            Ok(())
        } else {
            Err(form_not_found(id))
        }
    }

    async fn list_fields(&self, form_id: Id) -> Result<Vec<FieldRecord>, BackendError> {
        let rows = FormFieldRepo::list_by_form(&self.pool, form_id)
            .await
            .map_err(classify_sqlx_error)?;
        Ok(rows.into_iter().map(FieldRecord::from).collect())
    }

    async fn create_fields(&self, fields: &[FieldRecord]) -> Result<Vec<FieldRecord>, BackendError> {
        let rows = FormFieldRepo::create_many(&self.pool, fields)
            .await
            .map_err(classify_sqlx_error)?;
        Ok(rows.into_iter().map(FieldRecord::from).collect())
    }

    async fn update_field(&self, field: &FieldRecord) -> Result<FieldRecord, BackendError> {
        FormFieldRepo::update(&self.pool, field)
            .await
            .map_err(classify_sqlx_error)?
            .map(FieldRecord::from)
            .ok_or_else(|| field_not_found(field.id))
    }

    async fn delete_field(&self, id: Id) -> Result<(), BackendError> {
        let deleted = FormFieldRepo::delete(&self.pool, id)
            .await
            .map_err(classify_sqlx_error)?;
        if deleted {
            Ok(())
        } else {
            Err(field_not_found(id))
        }
    }

    async fn apply_field_changes(&self, changes: &FieldChanges) -> Result<(), BackendError> {
        let mut tx = self.pool.begin().await.map_err(classify_sqlx_error)?;

        if !changes.delete.is_empty() {
            let deleted = FormFieldRepo::delete_many(&mut *tx, &changes.delete)
                .await
                .map_err(classify_sqlx_error)?;
            if deleted != changes.delete.len() as u64 {
                let missing = changes.delete.first().copied().unwrap_or_default();
                return Err(field_not_found(missing));
            }
        }
        for field in &changes.update {
            FormFieldRepo::update(&mut *tx, field)
                .await
                .map_err(classify_sqlx_error)?
                .ok_or_else(|| field_not_found(field.id))?;
        }
        FormFieldRepo::create_many(&mut *tx, &changes.create)
            .await
            .map_err(classify_sqlx_error)?;

        tx.commit().await.map_err(classify_sqlx_error)?;
        tracing::debug!(
            deleted = changes.delete.len(),
            updated = changes.update.len(),
            created = changes.create.len(),
            "Field changes committed",
        );
        Ok(())
    }

    async fn create_submission(
        &self,
        submission: &NewSubmission,
    ) -> Result<SubmissionRecord, BackendError> {
        SubmissionRepo::create(&self.pool, submission)
            .await
            .map_err(classify_sqlx_error)?
            .try_into()
    }

    async fn list_submissions(&self, form_id: Id) -> Result<Vec<SubmissionRecord>, BackendError> {
        SubmissionRepo::list_by_form(&self.pool, form_id)
            .await
            .map_err(classify_sqlx_error)?
            .into_iter()
            .map(SubmissionRecord::try_from)
            .collect()
    }
}
