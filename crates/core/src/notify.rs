//! User-facing notifications emitted by the editor.

use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Success,
    Info,
    Warning,
    Error,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

/// Receives short human-readable outcome messages.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, kind: NotificationKind, message: &str);
}

/// Forwards notifications to `tracing`.
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn notify(&self, kind: NotificationKind, message: &str) {
        match kind {
            NotificationKind::Error => tracing::error!(kind = kind.as_str(), "{message}"),
            NotificationKind::Warning => tracing::warn!(kind = kind.as_str(), "{message}"),
            _ => tracing::info!(kind = kind.as_str(), "{message}"),
        }
    }
}

/// Buffers notifications until a UI drains them.
#[derive(Default)]
pub struct NotificationLog {
    entries: Mutex<Vec<(NotificationKind, String)>>,
}

impl NotificationLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take every buffered notification, oldest first.
    pub fn drain(&self) -> Vec<(NotificationKind, String)> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        std::mem::take(&mut *entries)
    }

    /// The most recent notification, without draining.
    pub fn last(&self) -> Option<(NotificationKind, String)> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.last().cloned()
    }
}

impl NotificationSink for NotificationLog {
    fn notify(&self, kind: NotificationKind, message: &str) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.push((kind, message.to_string()));
    }
}
