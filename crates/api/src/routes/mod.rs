pub mod forms;
pub mod health;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /forms                         list, create
/// /forms/{id}                    get, save, delete
/// /forms/{id}/publish            publish (POST)
/// /forms/{id}/archive            archive (POST)
/// /forms/{id}/submissions        list, submit
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().nest("/forms", forms::router())
}
