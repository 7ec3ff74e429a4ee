//! The persistence boundary of the form builder.
//!
//! [`FormBackend`] is implemented by the PostgreSQL backend in `hsseq-db`
//! and by [`memory::MemoryBackend`] for tests and local development.

pub mod memory;

use async_trait::async_trait;

use crate::codec::FieldRecord;
use crate::form::{FormRecord, FormUpdate, NewForm};
use crate::submission::{NewSubmission, SubmissionRecord};
use crate::types::Id;

/// Failures reported by a persistence backend.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BackendError {
    /// The backend could not be reached (network, pool exhausted, shut down).
    #[error("Persistence backend unreachable: {0}")]
    Unreachable(String),

    /// An integrity constraint (unique, foreign key, check, not null,
    /// exclusion) rejected the write.
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// The backend answered but the operation failed for another reason,
    /// such as a schema mismatch or an undecodable row. Retrying will not help.
    #[error("Persistence backend error: {0}")]
    Internal(String),

    /// The targeted row does not exist.
    #[error("{entity} with id {id} not found")]
    NotFound { entity: &'static str, id: Id },
}

impl BackendError {
    pub fn is_unreachable(&self) -> bool {
        matches!(self, Self::Unreachable(_))
    }
}

/// A batch of field writes computed by the reconciler.
///
/// Applied in order: deletions, then updates, then creations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldChanges {
    pub delete: Vec<Id>,
    pub update: Vec<FieldRecord>,
    pub create: Vec<FieldRecord>,
}

impl FieldChanges {
    pub fn is_empty(&self) -> bool {
        self.delete.is_empty() && self.update.is_empty() && self.create.is_empty()
    }

    /// Total number of row operations in the batch.
    pub fn len(&self) -> usize {
        self.delete.len() + self.update.len() + self.create.len()
    }
}

/// CRUD operations on forms, their fields and their submissions.
#[async_trait]
pub trait FormBackend: Send + Sync {
    /// Cheap reachability probe.
    async fn ping(&self) -> Result<(), BackendError>;

    async fn create_form(&self, form: &NewForm) -> Result<FormRecord, BackendError>;

    /// Insert a new form and its initial fields.
    ///
    /// The default inserts the form, then the fields, as two independent
    /// calls. Backends with transactions should override this.
    async fn create_form_with_fields(
        &self,
        form: &NewForm,
        fields: &[FieldRecord],
    ) -> Result<FormRecord, BackendError> {
        let record = self.create_form(form).await?;
        if !fields.is_empty() {
            self.create_fields(fields).await?;
        }
        Ok(record)
    }

    async fn get_form(&self, id: Id) -> Result<Option<FormRecord>, BackendError>;

    /// Forms of a company, most recently updated first.
    async fn list_forms(&self, company_id: Id) -> Result<Vec<FormRecord>, BackendError>;

    async fn update_form(&self, id: Id, update: &FormUpdate) -> Result<FormRecord, BackendError>;

    /// Delete a form together with its fields and submissions.
    async fn delete_form(&self, id: Id) -> Result<(), BackendError>;

    /// Fields of a form ordered by `order_index`.
    async fn list_fields(&self, form_id: Id) -> Result<Vec<FieldRecord>, BackendError>;

    async fn create_fields(&self, fields: &[FieldRecord]) -> Result<Vec<FieldRecord>, BackendError>;

    async fn update_field(&self, field: &FieldRecord) -> Result<FieldRecord, BackendError>;

    async fn delete_field(&self, id: Id) -> Result<(), BackendError>;

    /// Apply a reconciliation batch.
    ///
    /// The default issues independent calls and stops at the first failure,
    /// leaving already-applied steps in place. Backends with transactions
    /// should override this to make the batch atomic.
    async fn apply_field_changes(&self, changes: &FieldChanges) -> Result<(), BackendError> {
        for id in &changes.delete {
            self.delete_field(*id).await?;
        }
        for field in &changes.update {
            self.update_field(field).await?;
        }
        if !changes.create.is_empty() {
            self.create_fields(&changes.create).await?;
        }
        Ok(())
    }

    async fn create_submission(
        &self,
        submission: &NewSubmission,
    ) -> Result<SubmissionRecord, BackendError>;

    /// Submissions of a form, newest first.
    async fn list_submissions(&self, form_id: Id) -> Result<Vec<SubmissionRecord>, BackendError>;
}
