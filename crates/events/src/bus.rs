//! Fan-out of form lifecycle events over a `tokio::sync::broadcast` channel.

use std::fmt;

use hsseq_core::types::{Id, Identity, Timestamp};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// FormEvent
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FormEventKind {
    #[serde(rename = "form.saved")]
    Saved,
    #[serde(rename = "form.published")]
    Published,
    #[serde(rename = "form.archived")]
    Archived,
    #[serde(rename = "form.deleted")]
    Deleted,
    #[serde(rename = "form.submitted")]
    Submitted,
}

impl FormEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Saved => "form.saved",
            Self::Published => "form.published",
            Self::Archived => "form.archived",
            Self::Deleted => "form.deleted",
            Self::Submitted => "form.submitted",
        }
    }
}

impl fmt::Display for FormEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A change to one form, attributed to the user who made it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormEvent {
    pub kind: FormEventKind,
    pub form_id: Id,
    pub user_id: Id,
    pub company_id: Id,
    /// Set for [`FormEventKind::Submitted`].
    pub submission_id: Option<Id>,
    /// Kind-specific details such as the new version or change counts.
    pub detail: serde_json::Value,
    pub occurred_at: Timestamp,
}

impl FormEvent {
    pub fn new(kind: FormEventKind, form_id: Id, actor: Identity) -> Self {
        Self {
            kind,
            form_id,
            user_id: actor.user_id,
            company_id: actor.company_id,
            submission_id: None,
            detail: serde_json::Value::Null,
            occurred_at: chrono::Utc::now(),
        }
    }

    pub fn with_submission(mut self, submission_id: Id) -> Self {
        self.submission_id = Some(submission_id);
        self
    }

    pub fn with_detail(mut self, detail: serde_json::Value) -> Self {
        self.detail = detail;
        self
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

const DEFAULT_CAPACITY: usize = 1024;

/// Shared as `Arc<EventBus>`. Each subscriber sees every event published
/// after it subscribed; a subscriber more than `capacity` events behind
/// loses the oldest ones.
pub struct EventBus {
    sender: broadcast::Sender<FormEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        Self {
            sender: broadcast::channel(capacity).0,
        }
    }

    /// Returns the number of subscribers the event reached.
    pub fn publish(&self, event: FormEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<FormEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use hsseq_core::types::new_id;

    use super::*;

    fn actor() -> Identity {
        Identity {
            user_id: new_id(),
            company_id: new_id(),
        }
    }

    #[tokio::test]
    async fn subscriber_receives_event_with_detail() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();
        let form_id = new_id();
        let who = actor();

        let reached = bus.publish(
            FormEvent::new(FormEventKind::Published, form_id, who)
                .with_detail(serde_json::json!({ "version": 2 })),
        );
        assert_eq!(reached, 1);

        let event = rx.recv().await.unwrap();
        assert_eq!(event.kind, FormEventKind::Published);
        assert_eq!(event.form_id, form_id);
        assert_eq!(event.user_id, who.user_id);
        assert_eq!(event.company_id, who.company_id);
        assert_eq!(event.detail["version"], 2);
    }

    #[tokio::test]
    async fn every_subscriber_sees_events_in_order() {
        let bus = EventBus::default();
        let mut a = bus.subscribe();
        let mut b = bus.subscribe();
        let form_id = new_id();

        bus.publish(FormEvent::new(FormEventKind::Saved, form_id, actor()));
        bus.publish(FormEvent::new(FormEventKind::Deleted, form_id, actor()));

        for rx in [&mut a, &mut b] {
            assert_eq!(rx.recv().await.unwrap().kind, FormEventKind::Saved);
            assert_eq!(rx.recv().await.unwrap().kind, FormEventKind::Deleted);
        }
    }

    #[test]
    fn publishing_with_no_subscribers_reaches_nobody() {
        let bus = EventBus::new(4);
        assert_eq!(bus.subscriber_count(), 0);
        assert_eq!(
            bus.publish(FormEvent::new(FormEventKind::Archived, new_id(), actor())),
            0
        );
    }

    #[test]
    fn kind_serializes_as_dotted_name() {
        let event = FormEvent::new(FormEventKind::Submitted, new_id(), actor())
            .with_submission(new_id());
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["kind"], "form.submitted");
        assert!(json["submission_id"].is_string());
        assert_eq!(FormEventKind::Saved.to_string(), "form.saved");
    }
}
