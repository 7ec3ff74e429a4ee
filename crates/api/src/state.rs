use std::sync::Arc;

use hsseq_core::backend::FormBackend;
use hsseq_core::save_guard::SaveGuard;
use hsseq_events::EventBus;

use crate::config::ServerConfig;

/// Shared application state available to all handlers via `State<AppState>`.
///
/// Cheap to clone: every field is an `Arc` or wraps one.
#[derive(Clone)]
pub struct AppState {
    /// Persistence backend (PostgreSQL in production).
    pub backend: Arc<dyn FormBackend>,
    pub config: Arc<ServerConfig>,
    /// Event bus for form lifecycle events.
    pub event_bus: Arc<EventBus>,
    /// Serialises saves and publishes per form.
    pub save_guard: SaveGuard,
}
