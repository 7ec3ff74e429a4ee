//! Handlers for form CRUD, reconcile-on-save, publish and archive.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use hsseq_core::codec::decode_fields;
use hsseq_core::error::CoreError;
use hsseq_core::form::{FormDraft, FormRecord};
use hsseq_core::form_field::FormField;
use hsseq_core::reconcile::{reconcile_and_save, PersistResult};
use hsseq_core::save_guard::SaveTicket;
use hsseq_core::types::Id;
use hsseq_events::{FormEvent, FormEventKind};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::AppResult;
use crate::handlers::load_owned_form;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Body of a save: the whole local state of the form.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SaveFormRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    #[validate(length(max = 500))]
    pub fields: Vec<FormField>,
}

/// A form with its decoded, ordered fields.
#[derive(Debug, Serialize)]
pub struct FormDetail {
    pub form: FormRecord,
    pub fields: Vec<FormField>,
}

fn claim_form(state: &AppState, form_id: Id) -> AppResult<SaveTicket> {
    state.save_guard.try_acquire(form_id).ok_or_else(|| {
        CoreError::Conflict(format!(
            "Form {form_id} is already being saved or published"
        ))
        .into()
    })
}

fn saved_event(user: &AuthUser, result: &PersistResult) -> FormEvent {
    FormEvent::new(FormEventKind::Saved, result.form.id, user.identity())
        .with_detail(serde_json::json!({
            "version": result.form.version,
            "created": result.created,
            "updated": result.updated,
            "deleted": result.deleted,
        }))
}

/// GET /api/v1/forms
///
/// List the forms of the caller's company, most recently updated first.
pub async fn list_forms(
    user: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let forms = state.backend.list_forms(user.company_id).await?;
    Ok(Json(DataResponse { data: forms }))
}

/// POST /api/v1/forms
///
/// First save of a form: creates the form and all of its fields.
pub async fn create_form(
    user: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<SaveFormRequest>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    let draft = FormDraft {
        form_id: None,
        title: input.title,
        description: input.description,
    };

    let result =
        reconcile_and_save(state.backend.as_ref(), &draft, &input.fields, &user.identity()).await?;

    tracing::info!(
        form_id = %result.form.id,
        user_id = %user.user_id,
        fields = result.fields.len(),
        "Form created",
    );
    state.event_bus.publish(saved_event(&user, &result));

    Ok((StatusCode::CREATED, Json(DataResponse { data: result })))
}

/// GET /api/v1/forms/{id}
pub async fn get_form(
    user: AuthUser,
    State(state): State<AppState>,
    Path(form_id): Path<Id>,
) -> AppResult<impl IntoResponse> {
    let form = load_owned_form(&state, &user, form_id).await?;
    let records = state.backend.list_fields(form_id).await?;
    let fields = decode_fields(&records)?;

    Ok(Json(DataResponse {
        data: FormDetail { form, fields },
    }))
}

/// PUT /api/v1/forms/{id}
///
/// Reconcile the submitted local state against the stored fields.
pub async fn save_form(
    user: AuthUser,
    State(state): State<AppState>,
    Path(form_id): Path<Id>,
    Json(input): Json<SaveFormRequest>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    let _ticket = claim_form(&state, form_id)?;
    let draft = FormDraft {
        form_id: Some(form_id),
        title: input.title,
        description: input.description,
    };

    let result =
        reconcile_and_save(state.backend.as_ref(), &draft, &input.fields, &user.identity()).await?;

    tracing::info!(
        form_id = %form_id,
        user_id = %user.user_id,
        changed = result.changed_fields(),
        version = result.form.version,
        "Form saved",
    );
    state.event_bus.publish(saved_event(&user, &result));

    Ok(Json(DataResponse { data: result }))
}

/// DELETE /api/v1/forms/{id}
///
/// Delete a form. Its fields and submissions are removed with it.
pub async fn delete_form(
    user: AuthUser,
    State(state): State<AppState>,
    Path(form_id): Path<Id>,
) -> AppResult<impl IntoResponse> {
    load_owned_form(&state, &user, form_id).await?;
    let _ticket = claim_form(&state, form_id)?;
    state.backend.delete_form(form_id).await?;

    tracing::info!(form_id = %form_id, user_id = %user.user_id, "Form deleted");
    state
        .event_bus
        .publish(FormEvent::new(FormEventKind::Deleted, form_id, user.identity()));

    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/forms/{id}/publish
pub async fn publish_form(
    user: AuthUser,
    State(state): State<AppState>,
    Path(form_id): Path<Id>,
) -> AppResult<impl IntoResponse> {
    let _ticket = claim_form(&state, form_id)?;
    let form = load_owned_form(&state, &user, form_id).await?;
    let update = form.publish_update()?;
    let form = state.backend.update_form(form_id, &update).await?;

    tracing::info!(form_id = %form_id, user_id = %user.user_id, version = form.version, "Form published");
    state.event_bus.publish(
        FormEvent::new(FormEventKind::Published, form_id, user.identity())
            .with_detail(serde_json::json!({ "version": form.version })),
    );

    Ok(Json(DataResponse { data: form }))
}

/// POST /api/v1/forms/{id}/archive
pub async fn archive_form(
    user: AuthUser,
    State(state): State<AppState>,
    Path(form_id): Path<Id>,
) -> AppResult<impl IntoResponse> {
    let _ticket = claim_form(&state, form_id)?;
    let form = load_owned_form(&state, &user, form_id).await?;
    let form = state
        .backend
        .update_form(form_id, &form.archive_update())
        .await?;

    tracing::info!(form_id = %form_id, user_id = %user.user_id, "Form archived");
    state
        .event_bus
        .publish(FormEvent::new(FormEventKind::Archived, form_id, user.identity()));

    Ok(Json(DataResponse { data: form }))
}
