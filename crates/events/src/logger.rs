//! Writes every bus event to the structured log.

use tokio::sync::broadcast::error::RecvError;
use tokio::sync::broadcast::Receiver;

use crate::bus::FormEvent;

pub struct EventLogger;

impl EventLogger {
    /// Log events until the bus is dropped. Returns how many were logged.
    pub async fn run(mut receiver: Receiver<FormEvent>) -> u64 {
        let mut logged = 0;
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    tracing::info!(
                        kind = %event.kind,
                        form_id = %event.form_id,
                        user_id = %event.user_id,
                        company_id = %event.company_id,
                        submission_id = ?event.submission_id,
                        detail = %event.detail,
                        "Form event",
                    );
                    logged += 1;
                }
                Err(RecvError::Lagged(missed)) => {
                    tracing::warn!(missed, "Event logger fell behind");
                }
                Err(RecvError::Closed) => break,
            }
        }
        tracing::debug!(logged, "Event logger stopped");
        logged
    }
}

#[cfg(test)]
mod tests {
    use hsseq_core::types::{new_id, Identity};

    use super::*;
    use crate::bus::{EventBus, FormEventKind};

    #[tokio::test]
    async fn logger_counts_events_and_stops_when_bus_dropped() {
        let bus = EventBus::default();
        let handle = tokio::spawn(EventLogger::run(bus.subscribe()));
        let actor = Identity {
            user_id: new_id(),
            company_id: new_id(),
        };

        let form_id = new_id();
        bus.publish(FormEvent::new(FormEventKind::Saved, form_id, actor));
        bus.publish(FormEvent::new(FormEventKind::Submitted, form_id, actor).with_submission(new_id()));
        drop(bus);

        assert_eq!(handle.await.unwrap(), 2);
    }
}
