use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    /// `ok`, or `degraded` while the form store cannot be reached.
    pub status: &'static str,
    pub version: &'static str,
    pub backend_healthy: bool,
}

/// GET /health
///
/// Always 200. The body reports whether the form store answers.
async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let ping = state.backend.ping().await;
    if let Err(e) = &ping {
        tracing::warn!(error = %e, "Form store failed health ping");
    }

    Json(HealthResponse {
        status: if ping.is_ok() { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        backend_healthy: ping.is_ok(),
    })
}

/// Mounted at the root, outside `/api/v1`.
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}
