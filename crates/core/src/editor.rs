//! One form-editing session.
//!
//! [`FormEditor`] holds the local draft, the field list and the last-known
//! persisted snapshot, and drives saves through [`reconcile_and_save`]. When
//! the backend is unreachable a save falls back to the offline draft slot;
//! the snapshot is restored when connectivity returns.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::backend::FormBackend;
use crate::codec::decode_fields;
use crate::draft_store::{clear_snapshot, load_snapshot, save_snapshot, DraftStore, OfflineSnapshot};
use crate::error::CoreError;
use crate::field_list::{FieldList, MoveDirection};
use crate::form::{FormDraft, FormRecord};
use crate::form_field::{field_from_drop_payload, FieldPatch, FieldType, FormField};
use crate::notify::{NotificationKind, NotificationSink};
use crate::provenance::{classify, Provenance};
use crate::reconcile::{reconcile_and_save, PersistResult};
use crate::types::{Id, Identity};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connectivity {
    Online,
    Offline,
}

/// How a save completed.
#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    /// Persisted to the backend.
    Saved(PersistResult),
    /// Written to the offline slot instead.
    SavedOffline,
}

pub struct FormEditor {
    backend: Arc<dyn FormBackend>,
    slot: Arc<dyn DraftStore>,
    sink: Arc<dyn NotificationSink>,
    draft: FormDraft,
    fields: FieldList,
    persisted: Vec<FormField>,
    pending: bool,
    connectivity: Connectivity,
    saving: Arc<AtomicBool>,
}

/// Marks a save or publish in flight until dropped, including when the
/// owning future is cancelled.
struct InFlight(Arc<AtomicBool>);

impl InFlight {
    fn start(flag: &Arc<AtomicBool>) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(Arc::clone(flag))
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl FormEditor {
    /// Start editing a new, unsaved form.
    pub fn new(
        backend: Arc<dyn FormBackend>,
        slot: Arc<dyn DraftStore>,
        sink: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            backend,
            slot,
            sink,
            draft: FormDraft::default(),
            fields: FieldList::new(),
            persisted: Vec::new(),
            pending: false,
            connectivity: Connectivity::Online,
            saving: Arc::new(AtomicBool::new(false)),
        }
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn draft(&self) -> &FormDraft {
        &self.draft
    }

    pub fn form_id(&self) -> Option<Id> {
        self.draft.form_id
    }

    pub fn fields(&self) -> &[FormField] {
        self.fields.fields()
    }

    pub fn selected(&self) -> Option<&FormField> {
        self.fields.selected()
    }

    /// Fields as of the last successful remote save or load.
    pub fn persisted_fields(&self) -> &[FormField] {
        &self.persisted
    }

    pub fn has_pending_changes(&self) -> bool {
        self.pending
    }

    pub fn is_online(&self) -> bool {
        self.connectivity == Connectivity::Online
    }

    pub fn is_saving(&self) -> bool {
        self.saving.load(Ordering::SeqCst)
    }

    /// Provenance of every local and removed field relative to the last
    /// persisted snapshot.
    pub fn provenance(&self) -> Vec<(Id, Provenance)> {
        let persisted: Vec<Id> = self.persisted.iter().map(|f| f.id).collect();
        classify(&self.fields.ids(), &persisted)
    }

    // -----------------------------------------------------------------------
    // Local edits
    // -----------------------------------------------------------------------

    pub fn add_field(&mut self, field_type: FieldType, at: Option<usize>) -> &FormField {
        self.pending = true;
        self.fields.add_field(field_type, at)
    }

    /// Add a field from a palette drop payload.
    ///
    /// Malformed payloads are logged and ignored.
    pub fn drop_field(&mut self, payload: &str, at: Option<usize>) -> Option<&FormField> {
        match field_from_drop_payload(payload) {
            Ok(field) => {
                self.pending = true;
                Some(self.fields.insert_field(field, at))
            }
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring dropped field");
                None
            }
        }
    }

    pub fn delete_field(&mut self, id: Id) -> bool {
        let removed = self.fields.delete_field(id);
        self.pending |= removed;
        removed
    }

    pub fn move_field(&mut self, id: Id, direction: MoveDirection) -> bool {
        let moved = self.fields.move_field(id, direction);
        self.pending |= moved;
        moved
    }

    pub fn update_field(&mut self, id: Id, patch: &FieldPatch) -> Result<bool, CoreError> {
        let changed = self.fields.update_field(id, patch)?;
        self.pending |= changed;
        Ok(changed)
    }

    pub fn select(&mut self, id: Id) -> bool {
        self.fields.select(id)
    }

    pub fn clear_selection(&mut self) {
        self.fields.clear_selection();
    }

    pub fn set_title(&mut self, title: &str) {
        if self.draft.title != title {
            self.draft.title = title.to_string();
            self.pending = true;
        }
    }

    pub fn set_description(&mut self, description: Option<&str>) {
        let description = description.map(str::to_string);
        if self.draft.description != description {
            self.draft.description = description;
            self.pending = true;
        }
    }

    // -----------------------------------------------------------------------
    // Persistence
    // -----------------------------------------------------------------------

    /// Replace the session with a persisted form.
    pub async fn load(&mut self, form_id: Id, identity: &Identity) -> Result<(), CoreError> {
        let form = self.backend.get_form(form_id).await?.ok_or(CoreError::NotFound {
            entity: "Form",
            id: form_id,
        })?;
        if form.company_id != identity.company_id {
            return Err(CoreError::Forbidden(format!(
                "Form {form_id} belongs to another company"
            )));
        }
        let fields = decode_fields(&self.backend.list_fields(form_id).await?)?;

        self.draft = FormDraft {
            form_id: Some(form.id),
            title: form.title,
            description: form.description,
        };
        self.fields = FieldList::from_fields(fields);
        self.persisted = self.fields.fields().to_vec();
        self.pending = false;
        tracing::debug!(form_id = %form_id, fields = self.persisted.len(), "Form loaded");
        Ok(())
    }

    /// Save the session, remotely if possible and to the offline slot
    /// otherwise.
    ///
    /// On any error the local state is left as it was.
    pub async fn save(&mut self, identity: Option<&Identity>) -> Result<SaveOutcome, CoreError> {
        let Some(identity) = identity else {
            return Err(self.fail(CoreError::Unauthorized(
                "You must be signed in to save forms".into(),
            )));
        };
        if !self.is_online() {
            return self.save_offline();
        }

        let in_flight = InFlight::start(&self.saving);
        let result =
            reconcile_and_save(self.backend.as_ref(), &self.draft, self.fields.fields(), identity)
                .await;
        drop(in_flight);

        match result {
            Ok(result) => {
                self.draft.form_id = Some(result.form.id);
                self.draft.title.clone_from(&result.form.title);
                self.draft.description.clone_from(&result.form.description);
                self.fields.replace_all(result.fields.clone());
                self.persisted.clone_from(&result.fields);
                self.pending = false;
                if let Err(e) = clear_snapshot(self.slot.as_ref()) {
                    tracing::warn!(error = %e, "Failed to clear offline draft after save");
                }
                self.sink.notify(NotificationKind::Success, "Form saved");
                Ok(SaveOutcome::Saved(result))
            }
            Err(CoreError::Unreachable(reason)) => {
                tracing::warn!(reason = %reason, "Backend unreachable, saving offline");
                self.connectivity = Connectivity::Offline;
                self.save_offline()
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Publish the saved form.
    ///
    /// Rejected while there are unsaved changes, while offline, and before
    /// the first save.
    pub async fn publish(&mut self, identity: Option<&Identity>) -> Result<FormRecord, CoreError> {
        let Some(identity) = identity else {
            return Err(self.fail(CoreError::Unauthorized(
                "You must be signed in to publish forms".into(),
            )));
        };
        if self.pending {
            return Err(self.fail(CoreError::Conflict(
                "Save your changes before publishing".into(),
            )));
        }
        if !self.is_online() {
            return Err(self.fail(CoreError::Unreachable(
                "You are offline. Reconnect to publish".into(),
            )));
        }
        let Some(form_id) = self.draft.form_id else {
            return Err(self.fail(CoreError::Conflict(
                "Save the form before publishing".into(),
            )));
        };

        let in_flight = InFlight::start(&self.saving);
        let result = self.publish_remote(form_id, identity).await;
        drop(in_flight);

        match result {
            Ok(form) => {
                tracing::info!(form_id = %form_id, version = form.version, "Form published");
                self.sink.notify(NotificationKind::Success, "Form published");
                Ok(form)
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    async fn publish_remote(&self, form_id: Id, identity: &Identity) -> Result<FormRecord, CoreError> {
        let form = self.backend.get_form(form_id).await?.ok_or(CoreError::NotFound {
            entity: "Form",
            id: form_id,
        })?;
        if form.company_id != identity.company_id {
            return Err(CoreError::Forbidden(format!(
                "Form {form_id} belongs to another company"
            )));
        }
        let update = form.publish_update()?;
        Ok(self.backend.update_form(form_id, &update).await?)
    }

    /// Record a connectivity change.
    ///
    /// Going online restores a pending offline draft and, if the form has
    /// already been persisted, saves it.
    pub async fn set_connectivity(
        &mut self,
        status: Connectivity,
        identity: Option<&Identity>,
    ) -> Result<Option<SaveOutcome>, CoreError> {
        let was = self.connectivity;
        self.connectivity = status;
        if status == Connectivity::Offline || was == Connectivity::Online {
            return Ok(None);
        }
        if !self.restore_offline_draft()? {
            return Ok(None);
        }
        match (self.draft.form_id, identity) {
            (Some(_), Some(identity)) if !self.is_saving() => {
                self.save(Some(identity)).await.map(Some)
            }
            _ => Ok(None),
        }
    }

    /// Make the pending offline snapshot, if any, the active state.
    ///
    /// Returns whether a snapshot was restored. The snapshot stays in the
    /// slot until a remote save succeeds.
    pub fn restore_offline_draft(&mut self) -> Result<bool, CoreError> {
        let snapshot = match load_snapshot(self.slot.as_ref()) {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => return Ok(false),
            Err(e) => return Err(self.fail(e)),
        };
        self.draft = FormDraft {
            form_id: snapshot.form_id,
            title: snapshot.title,
            description: snapshot.description,
        };
        self.fields.replace_all(snapshot.fields);
        self.pending = true;
        tracing::info!(
            form_id = ?self.draft.form_id,
            fields = self.fields.len(),
            saved_at = %snapshot.saved_at,
            "Offline draft restored",
        );
        self.sink
            .notify(NotificationKind::Info, "Your offline changes were restored");
        Ok(true)
    }

    fn save_offline(&mut self) -> Result<SaveOutcome, CoreError> {
        let snapshot = OfflineSnapshot {
            form_id: self.draft.form_id,
            title: self.draft.title.clone(),
            description: self.draft.description.clone(),
            fields: self.fields.fields().to_vec(),
            saved_at: chrono::Utc::now(),
        };
        if let Err(e) = save_snapshot(self.slot.as_ref(), &snapshot) {
            return Err(self.fail(e));
        }
        self.pending = false;
        self.sink.notify(
            NotificationKind::Info,
            "You are offline. The form was saved locally and will sync when you reconnect",
        );
        Ok(SaveOutcome::SavedOffline)
    }

    /// Report `err` through the sink and hand it back.
    fn fail(&self, err: CoreError) -> CoreError {
        tracing::warn!(error = %err, form_id = ?self.draft.form_id, "Form editor operation failed");
        self.sink.notify(NotificationKind::Error, &err.to_string());
        err
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use assert_matches::assert_matches;
    use async_trait::async_trait;

    use super::*;
    use crate::backend::memory::{BackendCall, MemoryBackend};
    use crate::backend::BackendError;
    use crate::codec::FieldRecord;
    use crate::form::{FormUpdate, NewForm};
    use crate::submission::{NewSubmission, SubmissionRecord};
    use crate::draft_store::MemoryDraftStore;
    use crate::form::FormStatus;
    use crate::notify::NotificationLog;
    use crate::types::new_id;

    struct Harness {
        backend: Arc<MemoryBackend>,
        slot: Arc<MemoryDraftStore>,
        log: Arc<NotificationLog>,
        editor: FormEditor,
        who: Identity,
    }

    fn harness() -> Harness {
        let backend = Arc::new(MemoryBackend::recording());
        let slot = Arc::new(MemoryDraftStore::new());
        let log = Arc::new(NotificationLog::new());
        let editor = FormEditor::new(backend.clone(), slot.clone(), log.clone());
        Harness {
            backend,
            slot,
            log,
            editor,
            who: Identity {
                user_id: new_id(),
                company_id: new_id(),
            },
        }
    }

    /// Delegates to a [`MemoryBackend`] but never completes form writes.
    struct HangingBackend(MemoryBackend);

    #[async_trait]
    impl FormBackend for HangingBackend {
        async fn ping(&self) -> Result<(), BackendError> {
            self.0.ping().await
        }

        async fn create_form(&self, _form: &NewForm) -> Result<FormRecord, BackendError> {
            std::future::pending().await
        }

        async fn get_form(&self, id: Id) -> Result<Option<FormRecord>, BackendError> {
            self.0.get_form(id).await
        }

        async fn list_forms(&self, company_id: Id) -> Result<Vec<FormRecord>, BackendError> {
            self.0.list_forms(company_id).await
        }

        async fn update_form(&self, _id: Id, _update: &FormUpdate) -> Result<FormRecord, BackendError> {
            std::future::pending().await
        }

        async fn delete_form(&self, id: Id) -> Result<(), BackendError> {
            self.0.delete_form(id).await
        }

        async fn list_fields(&self, form_id: Id) -> Result<Vec<FieldRecord>, BackendError> {
            self.0.list_fields(form_id).await
        }

        async fn create_fields(&self, fields: &[FieldRecord]) -> Result<Vec<FieldRecord>, BackendError> {
            self.0.create_fields(fields).await
        }

        async fn update_field(&self, field: &FieldRecord) -> Result<FieldRecord, BackendError> {
            self.0.update_field(field).await
        }

        async fn delete_field(&self, id: Id) -> Result<(), BackendError> {
            self.0.delete_field(id).await
        }

        async fn create_submission(
            &self,
            submission: &NewSubmission,
        ) -> Result<SubmissionRecord, BackendError> {
            self.0.create_submission(submission).await
        }

        async fn list_submissions(&self, form_id: Id) -> Result<Vec<SubmissionRecord>, BackendError> {
            self.0.list_submissions(form_id).await
        }
    }

    // -----------------------------------------------------------------------
    // Local edits
    // -----------------------------------------------------------------------

    #[test]
    fn select_field_gets_three_default_options() {
        let mut h = harness();
        let field = h.editor.add_field(FieldType::Select, None).clone();
        let options = field.options.unwrap();
        assert_eq!(options.len(), 3);
        assert_eq!(options[0].label, "Option 1");
        assert_eq!(options[2].value, "option-3");
        assert_eq!(h.editor.selected().map(|f| f.id), Some(field.id));
        assert!(h.editor.has_pending_changes());
        assert!(h.backend.calls().is_empty());
    }

    #[test]
    fn noop_edits_do_not_mark_pending() {
        let mut h = harness();
        assert!(!h.editor.delete_field(new_id()));
        h.editor.set_title(crate::form::UNTITLED_FORM);
        h.editor.set_description(None);
        assert!(!h.editor.has_pending_changes());
    }

    #[test]
    fn malformed_drop_is_ignored_silently() {
        let mut h = harness();
        assert!(h.editor.drop_field("{oops", None).is_none());
        assert!(h.editor.drop_field(r#"{"id":"hologram"}"#, None).is_none());
        assert!(h.editor.fields().is_empty());
        assert!(!h.editor.has_pending_changes());
        assert!(h.log.drain().is_empty());
    }

    #[test]
    fn valid_drop_inserts_at_position() {
        let mut h = harness();
        h.editor.add_field(FieldType::Text, None);
        h.editor.add_field(FieldType::Text, None);
        let dropped = h
            .editor
            .drop_field(r#"{"id":"signature","name":"Supervisor sign-off"}"#, Some(1))
            .map(|f| f.id)
            .unwrap();
        assert_eq!(h.editor.fields()[1].id, dropped);
        assert_eq!(h.editor.fields()[1].label, "Supervisor sign-off");
        assert_eq!(h.editor.fields()[2].order_index, 2);
    }

    // -----------------------------------------------------------------------
    // Saving
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn save_without_identity_is_unauthorized() {
        let mut h = harness();
        h.editor.add_field(FieldType::Text, None);
        let result = h.editor.save(None).await;
        assert_matches!(result, Err(CoreError::Unauthorized(_)));
        assert!(h.editor.has_pending_changes());
        assert_eq!(h.log.last().map(|(k, _)| k), Some(NotificationKind::Error));
        assert!(h.backend.calls().is_empty());
    }

    #[tokio::test]
    async fn save_assigns_form_id_and_clears_pending() {
        let mut h = harness();
        h.editor.set_title("Vehicle check");
        h.editor.add_field(FieldType::Checkbox, None);

        let outcome = h.editor.save(Some(&h.who)).await.unwrap();

        assert_matches!(outcome, SaveOutcome::Saved(ref r) if r.created == 1);
        let form_id = h.editor.form_id().unwrap();
        assert_eq!(h.backend.stored_form(form_id).unwrap().title, "Vehicle check");
        assert!(!h.editor.has_pending_changes());
        assert!(!h.editor.is_saving());
        assert_eq!(h.editor.persisted_fields(), h.editor.fields());
        assert!(h
            .editor
            .provenance()
            .iter()
            .all(|(_, p)| *p == Provenance::Existing));
    }

    #[tokio::test]
    async fn failed_save_leaves_local_state_unchanged() {
        let mut h = harness();
        h.editor.add_field(FieldType::Text, None);
        h.editor.save(Some(&h.who)).await.unwrap();

        h.editor.add_field(FieldType::Number, None);
        let before = h.editor.fields().to_vec();
        h.backend.fail_field_creates(Some(BackendError::ConstraintViolation(
            "duplicate key value violates unique constraint".into(),
        )));

        let result = h.editor.save(Some(&h.who)).await;

        assert_matches!(result, Err(CoreError::Conflict(_)));
        assert_eq!(h.editor.fields(), before.as_slice());
        assert!(h.editor.has_pending_changes());
        let (kind, message) = h.log.last().unwrap();
        assert_eq!(kind, NotificationKind::Error);
        assert!(message.contains("duplicate key"));
    }

    #[tokio::test]
    async fn cancelled_save_clears_saving_flag() {
        let mut editor = FormEditor::new(
            Arc::new(HangingBackend(MemoryBackend::new())),
            Arc::new(MemoryDraftStore::new()),
            Arc::new(NotificationLog::new()),
        );
        let who = Identity {
            user_id: new_id(),
            company_id: new_id(),
        };
        editor.add_field(FieldType::Text, None);

        let timed_out = tokio::time::timeout(Duration::from_millis(20), editor.save(Some(&who))).await;

        assert!(timed_out.is_err());
        assert!(!editor.is_saving());
        assert!(editor.has_pending_changes());
        assert!(editor.form_id().is_none());
    }

    #[tokio::test]
    async fn cancelled_publish_clears_saving_flag() {
        let memory = MemoryBackend::new();
        let who = Identity {
            user_id: new_id(),
            company_id: new_id(),
        };
        let form = memory
            .create_form(&NewForm {
                id: new_id(),
                title: "Hot works permit".into(),
                description: None,
                company_id: who.company_id,
                created_by: who.user_id,
            })
            .await
            .unwrap();
        let mut editor = FormEditor::new(
            Arc::new(HangingBackend(memory)),
            Arc::new(MemoryDraftStore::new()),
            Arc::new(NotificationLog::new()),
        );
        editor.load(form.id, &who).await.unwrap();

        let timed_out = tokio::time::timeout(Duration::from_millis(20), editor.publish(Some(&who))).await;

        assert!(timed_out.is_err());
        assert!(!editor.is_saving());
    }

    #[tokio::test]
    async fn internal_backend_failure_stays_online() {
        let mut h = harness();
        h.editor.add_field(FieldType::Text, None);
        h.editor.save(Some(&h.who)).await.unwrap();

        h.editor.add_field(FieldType::Number, None);
        h.backend.fail_field_creates(Some(BackendError::Internal(
            "relation \"form_fields\" does not exist".into(),
        )));

        let result = h.editor.save(Some(&h.who)).await;

        assert_matches!(result, Err(CoreError::Internal(_)));
        assert!(h.editor.is_online());
        assert!(h.editor.has_pending_changes());
        assert!(load_snapshot(h.slot.as_ref()).unwrap().is_none());
        assert_eq!(h.log.last().map(|(k, _)| k), Some(NotificationKind::Error));
    }

    #[tokio::test]
    async fn load_restores_persisted_order() {
        let mut h = harness();
        h.editor.add_field(FieldType::Text, None);
        h.editor.add_field(FieldType::Date, None);
        h.editor.save(Some(&h.who)).await.unwrap();
        let form_id = h.editor.form_id().unwrap();
        let expected = h.editor.fields().to_vec();

        let mut other = FormEditor::new(h.backend.clone(), h.slot.clone(), h.log.clone());
        other.load(form_id, &h.who).await.unwrap();

        assert_eq!(other.fields(), expected.as_slice());
        assert_eq!(other.form_id(), Some(form_id));
        assert!(!other.has_pending_changes());
    }

    // -----------------------------------------------------------------------
    // Offline deferral
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn offline_save_and_restore_on_reconnect() {
        let mut h = harness();
        h.backend.set_reachable(false);
        h.editor.set_title("T1");
        h.editor.add_field(FieldType::Text, None);
        h.editor.add_field(FieldType::Radio, None);
        let fields = h.editor.fields().to_vec();

        let outcome = h.editor.save(Some(&h.who)).await.unwrap();
        assert_eq!(outcome, SaveOutcome::SavedOffline);
        assert!(!h.editor.has_pending_changes());
        assert!(!h.editor.is_online());
        assert_eq!(h.log.last().map(|(k, _)| k), Some(NotificationKind::Info));

        // A fresh session picks the snapshot up when connectivity returns.
        let mut restored = FormEditor::new(h.backend.clone(), h.slot.clone(), h.log.clone());
        restored
            .set_connectivity(Connectivity::Offline, Some(&h.who))
            .await
            .unwrap();
        h.backend.set_reachable(true);
        let autosave = restored
            .set_connectivity(Connectivity::Online, Some(&h.who))
            .await
            .unwrap();

        // Never persisted, so no automatic save.
        assert!(autosave.is_none());
        assert_eq!(restored.draft().title, "T1");
        assert_eq!(restored.fields(), fields.as_slice());
        assert!(restored.has_pending_changes());
        assert!(h.backend.calls().is_empty());
    }

    #[tokio::test]
    async fn second_offline_save_overwrites_first() {
        let mut h = harness();
        h.editor.set_connectivity(Connectivity::Offline, None).await.unwrap();
        h.editor.set_title("first");
        h.editor.save(Some(&h.who)).await.unwrap();
        h.editor.set_title("second");
        h.editor.save(Some(&h.who)).await.unwrap();

        let snapshot = load_snapshot(h.slot.as_ref()).unwrap().unwrap();
        assert_eq!(snapshot.title, "second");
    }

    #[tokio::test]
    async fn reconnect_autosaves_persisted_form_and_clears_slot() {
        let mut h = harness();
        h.editor.add_field(FieldType::Text, None);
        h.editor.save(Some(&h.who)).await.unwrap();
        let form_id = h.editor.form_id().unwrap();

        h.backend.set_reachable(false);
        h.editor.add_field(FieldType::Email, None);
        assert_eq!(
            h.editor.save(Some(&h.who)).await.unwrap(),
            SaveOutcome::SavedOffline
        );
        h.backend.set_reachable(true);
        h.backend.clear_calls();

        let outcome = h
            .editor
            .set_connectivity(Connectivity::Online, Some(&h.who))
            .await
            .unwrap();

        assert_matches!(outcome, Some(SaveOutcome::Saved(ref r)) if r.created == 1);
        assert_eq!(h.backend.stored_fields(form_id).len(), 2);
        assert!(!h.editor.has_pending_changes());
        assert!(load_snapshot(h.slot.as_ref()).unwrap().is_none());
        assert_eq!(h.backend.field_writes().len(), 1);
    }

    #[tokio::test]
    async fn restore_without_snapshot_is_noop() {
        let mut h = harness();
        assert!(!h.editor.restore_offline_draft().unwrap());
        assert!(!h.editor.has_pending_changes());
    }

    // -----------------------------------------------------------------------
    // Publishing
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn publish_rejected_with_pending_changes() {
        let mut h = harness();
        h.editor.add_field(FieldType::Text, None);
        h.editor.save(Some(&h.who)).await.unwrap();
        h.editor.set_title("Changed");
        h.backend.clear_calls();

        let result = h.editor.publish(Some(&h.who)).await;

        assert_matches!(result, Err(CoreError::Conflict(_)));
        assert!(h.backend.calls().is_empty());
        let form = h.backend.stored_form(h.editor.form_id().unwrap()).unwrap();
        assert!(!form.published);
    }

    #[tokio::test]
    async fn publish_rejected_when_offline() {
        let mut h = harness();
        h.editor.save(Some(&h.who)).await.unwrap();
        h.editor
            .set_connectivity(Connectivity::Offline, Some(&h.who))
            .await
            .unwrap();
        h.backend.clear_calls();

        assert_matches!(
            h.editor.publish(Some(&h.who)).await,
            Err(CoreError::Unreachable(_))
        );
        assert!(h.backend.calls().is_empty());
    }

    #[tokio::test]
    async fn publish_after_save_sets_status() {
        let mut h = harness();
        h.editor.add_field(FieldType::Text, None);
        h.editor.save(Some(&h.who)).await.unwrap();

        let form = h.editor.publish(Some(&h.who)).await.unwrap();

        assert!(form.published);
        assert_eq!(form.status, FormStatus::Published);
        assert!(form.is_consistent());
        assert!(h.backend.calls().contains(&BackendCall::UpdateForm(form.id)));
    }

    #[tokio::test]
    async fn publish_before_first_save_is_rejected() {
        let mut h = harness();
        assert_matches!(
            h.editor.publish(Some(&h.who)).await,
            Err(CoreError::Conflict(_))
        );
    }
}
