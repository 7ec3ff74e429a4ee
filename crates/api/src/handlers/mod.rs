pub mod forms;
pub mod submissions;

use hsseq_core::error::CoreError;
use hsseq_core::form::FormRecord;
use hsseq_core::types::Id;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// Fetch a form and check it belongs to the caller's company.
pub(crate) async fn load_owned_form(
    state: &AppState,
    user: &AuthUser,
    form_id: Id,
) -> AppResult<FormRecord> {
    let form = state
        .backend
        .get_form(form_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Form",
            id: form_id,
        })?;
    if form.company_id != user.company_id {
        return Err(CoreError::Forbidden(format!(
            "Form {form_id} belongs to another company"
        ))
        .into());
    }
    Ok(form)
}
