//! Handlers for submissions of published forms.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use hsseq_core::codec::decode_fields;
use hsseq_core::submission::{validate_submission, DeviceInfo, GeoLocation, NewSubmission};
use hsseq_core::types::Id;
use hsseq_events::{FormEvent, FormEventKind};
use serde::Deserialize;

use crate::error::AppResult;
use crate::handlers::load_owned_form;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Body of a submission. `data` is keyed by field id.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitFormRequest {
    pub data: serde_json::Value,
    pub location: Option<GeoLocation>,
    pub device_info: Option<DeviceInfo>,
}

/// GET /api/v1/forms/{id}/submissions
///
/// Newest first.
pub async fn list_submissions(
    user: AuthUser,
    State(state): State<AppState>,
    Path(form_id): Path<Id>,
) -> AppResult<impl IntoResponse> {
    load_owned_form(&state, &user, form_id).await?;
    let submissions = state.backend.list_submissions(form_id).await?;
    Ok(Json(DataResponse { data: submissions }))
}

/// POST /api/v1/forms/{id}/submissions
///
/// Accepted only for published forms with every required field filled in.
pub async fn create_submission(
    user: AuthUser,
    State(state): State<AppState>,
    Path(form_id): Path<Id>,
    Json(input): Json<SubmitFormRequest>,
) -> AppResult<impl IntoResponse> {
    let form = load_owned_form(&state, &user, form_id).await?;
    let fields = decode_fields(&state.backend.list_fields(form_id).await?)?;
    validate_submission(&form, &fields, &input.data)?;

    let submission = state
        .backend
        .create_submission(&NewSubmission {
            form_id,
            submitted_by: user.user_id,
            data: input.data,
            location: input.location,
            device_info: input.device_info,
        })
        .await?;

    tracing::info!(
        form_id = %form_id,
        submission_id = %submission.id,
        user_id = %user.user_id,
        "Form submitted",
    );
    state.event_bus.publish(
        FormEvent::new(FormEventKind::Submitted, form_id, user.identity())
            .with_submission(submission.id),
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: submission })))
}
