//! In-memory [`FormBackend`] with opt-in call recording and failure
//! injection.
//!
//! Used by the test suites of every crate and by the API when no database
//! is configured. Enforces the same constraints as the SQL schema: unique
//! field ids, fields must reference an existing form, and deleting a form
//! removes its fields and submissions.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;

use super::{BackendError, FormBackend};
use crate::codec::FieldRecord;
use crate::form::{FormRecord, FormStatus, FormUpdate, NewForm};
use crate::submission::{NewSubmission, SubmissionRecord, SubmissionStatus};
use crate::types::{new_id, Id};

/// A write or read issued against the backend, in call order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
    CreateForm,
    GetForm(Id),
    ListForms(Id),
    UpdateForm(Id),
    DeleteForm(Id),
    ListFields(Id),
    CreateField(Id),
    UpdateField(Id),
    DeleteField(Id),
    CreateSubmission(Id),
    ListSubmissions(Id),
}

impl BackendCall {
    /// Whether the call writes a `form_fields` row.
    pub fn is_field_write(&self) -> bool {
        matches!(
            self,
            Self::CreateField(_) | Self::UpdateField(_) | Self::DeleteField(_)
        )
    }
}

#[derive(Default)]
struct State {
    forms: HashMap<Id, FormRecord>,
    fields: HashMap<Id, FieldRecord>,
    submissions: Vec<SubmissionRecord>,
    calls: Vec<BackendCall>,
    record_calls: bool,
    unreachable: bool,
    fail_field_creates: Option<BackendError>,
}

/// Process-local backend keeping every table in a `HashMap`.
#[derive(Default)]
pub struct MemoryBackend {
    state: Mutex<State>,
}

impl MemoryBackend {
    /// A backend that keeps no call log.
    pub fn new() -> Self {
        Self::default()
    }

    /// A backend that logs every call for [`calls`](Self::calls) and
    /// [`field_writes`](Self::field_writes). The log is never trimmed.
    pub fn recording() -> Self {
        let backend = Self::default();
        backend.lock().record_calls = true;
        backend
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make every subsequent call fail with `Unreachable` (or stop doing so).
    pub fn set_reachable(&self, reachable: bool) {
        self.lock().unreachable = !reachable;
    }

    /// Make `create_fields` fail with `err` until cleared with `None`.
    pub fn fail_field_creates(&self, err: Option<BackendError>) {
        self.lock().fail_field_creates = err;
    }

    /// Every call recorded so far. Empty unless built with
    /// [`recording`](Self::recording).
    pub fn calls(&self) -> Vec<BackendCall> {
        self.lock().calls.clone()
    }

    /// Only the calls that wrote field rows.
    pub fn field_writes(&self) -> Vec<BackendCall> {
        self.lock()
            .calls
            .iter()
            .filter(|c| c.is_field_write())
            .cloned()
            .collect()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    /// Snapshot of the stored fields of a form, ordered by `order_index`.
    pub fn stored_fields(&self, form_id: Id) -> Vec<FieldRecord> {
        sorted_fields(&self.lock(), form_id)
    }

    pub fn stored_form(&self, id: Id) -> Option<FormRecord> {
        self.lock().forms.get(&id).cloned()
    }

    /// Record `call`, or fail if the backend is marked unreachable.
    fn enter(&self, call: BackendCall) -> Result<MutexGuard<'_, State>, BackendError> {
        let mut state = self.lock();
        if state.unreachable {
            return Err(BackendError::Unreachable("memory backend offline".into()));
        }
        state.record(call);
        Ok(state)
    }
}

impl State {
    fn record(&mut self, call: BackendCall) {
        if self.record_calls {
            self.calls.push(call);
        }
    }
}

fn sorted_fields(state: &State, form_id: Id) -> Vec<FieldRecord> {
    let mut fields: Vec<FieldRecord> = state
        .fields
        .values()
        .filter(|f| f.form_id == form_id)
        .cloned()
        .collect();
    fields.sort_by_key(|f| f.order_index);
    fields
}

#[async_trait]
impl FormBackend for MemoryBackend {
    async fn ping(&self) -> Result<(), BackendError> {
        if self.lock().unreachable {
            Err(BackendError::Unreachable("memory backend offline".into()))
        } else {
            Ok(())
        }
    }

    async fn create_form(&self, form: &NewForm) -> Result<FormRecord, BackendError> {
        let mut state = self.enter(BackendCall::CreateForm)?;
        let now = Utc::now();
        if state.forms.contains_key(&form.id) {
            return Err(BackendError::ConstraintViolation(format!(
                "duplicate key value violates unique constraint \"forms_pkey\" ({})",
                form.id
            )));
        }
        let record = FormRecord {
            id: form.id,
            title: form.title.clone(),
            description: form.description.clone(),
            company_id: form.company_id,
            created_by: form.created_by,
            published: false,
            status: FormStatus::Draft,
            version: 1,
            created_at: now,
            updated_at: now,
        };
        state.forms.insert(record.id, record.clone());
        Ok(record)
    }

    async fn get_form(&self, id: Id) -> Result<Option<FormRecord>, BackendError> {
        let state = self.enter(BackendCall::GetForm(id))?;
        Ok(state.forms.get(&id).cloned())
    }

    async fn list_forms(&self, company_id: Id) -> Result<Vec<FormRecord>, BackendError> {
        let state = self.enter(BackendCall::ListForms(company_id))?;
        let mut forms: Vec<FormRecord> = state
            .forms
            .values()
            .filter(|f| f.company_id == company_id)
            .cloned()
            .collect();
        forms.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(forms)
    }

    async fn update_form(&self, id: Id, update: &FormUpdate) -> Result<FormRecord, BackendError> {
        let mut state = self.enter(BackendCall::UpdateForm(id))?;
        let record = state
            .forms
            .get_mut(&id)
            .ok_or(BackendError::NotFound { entity: "Form", id })?;
        update.apply_to(record);
        record.updated_at = Utc::now();
        Ok(record.clone())
    }

    async fn delete_form(&self, id: Id) -> Result<(), BackendError> {
        let mut state = self.enter(BackendCall::DeleteForm(id))?;
        if state.forms.remove(&id).is_none() {
            return Err(BackendError::NotFound { entity: "Form", id });
        }
        state.fields.retain(|_, f| f.form_id != id);
        state.submissions.retain(|s| s.form_id != id);
        Ok(())
    }

    async fn list_fields(&self, form_id: Id) -> Result<Vec<FieldRecord>, BackendError> {
        let state = self.enter(BackendCall::ListFields(form_id))?;
        Ok(sorted_fields(&state, form_id))
    }

    async fn create_fields(&self, fields: &[FieldRecord]) -> Result<Vec<FieldRecord>, BackendError> {
        let mut state = self.lock();
        if state.unreachable {
            return Err(BackendError::Unreachable("memory backend offline".into()));
        }
        if let Some(err) = state.fail_field_creates.clone() {
            return Err(err);
        }
        // Validate the whole insert before writing, like a multi-row INSERT.
        for (i, field) in fields.iter().enumerate() {
            if !state.forms.contains_key(&field.form_id) {
                return Err(BackendError::ConstraintViolation(format!(
                    "form_fields.form_id {} references a missing form",
                    field.form_id
                )));
            }
            if state.fields.contains_key(&field.id) || fields[..i].iter().any(|f| f.id == field.id)
            {
                return Err(BackendError::ConstraintViolation(format!(
                    "duplicate key value violates unique constraint \"form_fields_pkey\" ({})",
                    field.id
                )));
            }
        }
        for field in fields {
            state.record(BackendCall::CreateField(field.id));
            state.fields.insert(field.id, field.clone());
        }
        Ok(fields.to_vec())
    }

    async fn update_field(&self, field: &FieldRecord) -> Result<FieldRecord, BackendError> {
        let mut state = self.enter(BackendCall::UpdateField(field.id))?;
        let stored = state.fields.get_mut(&field.id).ok_or(BackendError::NotFound {
            entity: "FormField",
            id: field.id,
        })?;
        *stored = field.clone();
        Ok(field.clone())
    }

    async fn delete_field(&self, id: Id) -> Result<(), BackendError> {
        let mut state = self.enter(BackendCall::DeleteField(id))?;
        state
            .fields
            .remove(&id)
            .map(|_| ())
            .ok_or(BackendError::NotFound {
                entity: "FormField",
                id,
            })
    }

    async fn create_submission(
        &self,
        submission: &NewSubmission,
    ) -> Result<SubmissionRecord, BackendError> {
        let mut state = self.enter(BackendCall::CreateSubmission(submission.form_id))?;
        if !state.forms.contains_key(&submission.form_id) {
            return Err(BackendError::ConstraintViolation(format!(
                "form_submissions.form_id {} references a missing form",
                submission.form_id
            )));
        }
        let record = SubmissionRecord {
            id: new_id(),
            form_id: submission.form_id,
            submitted_by: submission.submitted_by,
            submitted_at: Utc::now(),
            data: submission.data.clone(),
            status: SubmissionStatus::Submitted,
            location: submission.location.clone(),
            device_info: submission.device_info.clone(),
        };
        state.submissions.push(record.clone());
        Ok(record)
    }

    async fn list_submissions(&self, form_id: Id) -> Result<Vec<SubmissionRecord>, BackendError> {
        let state = self.enter(BackendCall::ListSubmissions(form_id))?;
        let mut out: Vec<SubmissionRecord> = state
            .submissions
            .iter()
            .filter(|s| s.form_id == form_id)
            .cloned()
            .collect();
        out.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
        Ok(out)
    }
}
