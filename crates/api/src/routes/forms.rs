//! Route definitions for forms and their submissions.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{forms, submissions};
use crate::state::AppState;

/// Form routes mounted at `/forms`.
///
/// ```text
/// GET    /                    -> list_forms
/// POST   /                    -> create_form
/// GET    /{id}                -> get_form
/// PUT    /{id}                -> save_form
/// DELETE /{id}                -> delete_form
/// POST   /{id}/publish        -> publish_form
/// POST   /{id}/archive        -> archive_form
/// GET    /{id}/submissions    -> list_submissions
/// POST   /{id}/submissions    -> create_submission
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(forms::list_forms).post(forms::create_form))
        .route(
            "/{id}",
            get(forms::get_form)
                .put(forms::save_form)
                .delete(forms::delete_form),
        )
        .route("/{id}/publish", post(forms::publish_form))
        .route("/{id}/archive", post(forms::archive_form))
        .route(
            "/{id}/submissions",
            get(submissions::list_submissions).post(submissions::create_submission),
        )
}
