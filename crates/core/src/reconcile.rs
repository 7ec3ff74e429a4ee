//! Reconciliation of a locally edited form against persisted storage.
//!
//! A save either creates the form and all its fields (first save), or
//! diffs the local field list against the persisted rows and issues the
//! minimal batch of deletions, updates and creations.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::backend::{FieldChanges, FormBackend};
use crate::codec::{encode_field, encode_fields, FieldRecord};
use crate::error::CoreError;
use crate::form::{validate_field_count, validate_title, FormDraft, FormRecord, FormUpdate, NewForm};
use crate::form_field::FormField;
use crate::provenance::{classify, Provenance};
use crate::types::{new_id, Id, Identity};

/// Outcome of a successful save.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PersistResult {
    /// The form record as persisted after the save.
    pub form: FormRecord,
    /// The saved fields, renumbered to their positions.
    pub fields: Vec<FormField>,
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
}

impl PersistResult {
    pub fn changed_fields(&self) -> usize {
        self.created + self.updated + self.deleted
    }
}

/// Diff `local` against the persisted rows of `form_id`.
///
/// Removed fields are deleted, new fields created, and existing fields
/// updated only when their encoded row differs from the persisted one.
pub fn plan_changes(form_id: Id, local: &[FormField], persisted: &[FieldRecord]) -> FieldChanges {
    let local_ids: Vec<Id> = local.iter().map(|f| f.id).collect();
    let persisted_ids: Vec<Id> = persisted.iter().map(|r| r.id).collect();
    let persisted_by_id: HashMap<Id, &FieldRecord> = persisted.iter().map(|r| (r.id, r)).collect();
    let local_by_id: HashMap<Id, (usize, &FormField)> = local
        .iter()
        .enumerate()
        .map(|(i, f)| (f.id, (i, f)))
        .collect();

    let mut changes = FieldChanges::default();
    for (id, provenance) in classify(&local_ids, &persisted_ids) {
        match provenance {
            Provenance::Removed => changes.delete.push(id),
            Provenance::New | Provenance::Existing => {
                let Some((index, field)) = local_by_id.get(&id) else {
                    continue;
                };
                let row = encode_field(field, form_id, *index);
                match persisted_by_id.get(&id) {
                    Some(stored) if **stored == row => {}
                    Some(_) => changes.update.push(row),
                    None => changes.create.push(row),
                }
            }
        }
    }
    changes
}

/// Reject field lists that cannot be saved as-is.
pub fn validate_fields(fields: &[FormField]) -> Result<(), CoreError> {
    validate_field_count(fields.len())?;
    let mut seen = HashSet::with_capacity(fields.len());
    for field in fields {
        if !seen.insert(field.id) {
            return Err(CoreError::Validation(format!(
                "Field id {} appears more than once",
                field.id
            )));
        }
        field.validate()?;
    }
    Ok(())
}

/// Persist `draft` and `fields` on behalf of `identity`.
///
/// On failure nothing is assumed about which backend steps were applied;
/// the caller keeps its local state and may retry.
pub async fn reconcile_and_save(
    backend: &dyn FormBackend,
    draft: &FormDraft,
    fields: &[FormField],
    identity: &Identity,
) -> Result<PersistResult, CoreError> {
    validate_title(&draft.title)?;
    validate_fields(fields)?;

    let saved_fields: Vec<FormField> = fields
        .iter()
        .enumerate()
        .map(|(i, f)| FormField {
            order_index: i as i32,
            ..f.clone()
        })
        .collect();

    let Some(form_id) = draft.form_id else {
        return create_new(backend, draft, saved_fields, identity).await;
    };

    let form = backend
        .get_form(form_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Form",
            id: form_id,
        })?;
    if form.company_id != identity.company_id {
        return Err(CoreError::Forbidden(format!(
            "Form {form_id} belongs to another company"
        )));
    }

    let persisted = backend.list_fields(form_id).await?;
    let changes = plan_changes(form_id, &saved_fields, &persisted);

    if !changes.is_empty() {
        backend.apply_field_changes(&changes).await?;
    }

    let header_changed = form.title != draft.title || form.description != draft.description;
    let form = if header_changed || !changes.is_empty() {
        let update = FormUpdate {
            title: Some(draft.title.clone()),
            description: Some(draft.description.clone()),
            version: Some(form.version + 1),
            ..Default::default()
        };
        backend.update_form(form_id, &update).await?
    } else {
        form
    };

    tracing::info!(
        form_id = %form_id,
        deleted = changes.delete.len(),
        updated = changes.update.len(),
        created = changes.create.len(),
        version = form.version,
        "Form reconciled",
    );

    Ok(PersistResult {
        form,
        fields: saved_fields,
        created: changes.create.len(),
        updated: changes.update.len(),
        deleted: changes.delete.len(),
    })
}

async fn create_new(
    backend: &dyn FormBackend,
    draft: &FormDraft,
    fields: Vec<FormField>,
    identity: &Identity,
) -> Result<PersistResult, CoreError> {
    let new_form = NewForm {
        id: new_id(),
        title: draft.title.clone(),
        description: draft.description.clone(),
        company_id: identity.company_id,
        created_by: identity.user_id,
    };
    let rows = encode_fields(&fields, new_form.id);
    let form = backend.create_form_with_fields(&new_form, &rows).await?;

    tracing::info!(
        form_id = %form.id,
        created = rows.len(),
        user_id = %identity.user_id,
        "Form created",
    );

    Ok(PersistResult {
        form,
        created: rows.len(),
        fields,
        updated: 0,
        deleted: 0,
    })
}
