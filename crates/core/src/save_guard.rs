//! Per-form mutual exclusion for saves and publishes.
//!
//! A [`SaveTicket`] is held for the duration of one save. Dropping it
//! releases the form, including when the save future is dropped early.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use crate::types::Id;

#[derive(Debug, Clone, Default)]
pub struct SaveGuard {
    in_flight: Arc<Mutex<HashSet<Id>>>,
}

impl SaveGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `form_id`. Returns `None` if a save of that form is in flight.
    pub fn try_acquire(&self, form_id: Id) -> Option<SaveTicket> {
        let mut set = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        if !set.insert(form_id) {
            return None;
        }
        Some(SaveTicket {
            form_id,
            in_flight: Arc::clone(&self.in_flight),
        })
    }

    pub fn is_saving(&self, form_id: Id) -> bool {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&form_id)
    }
}

/// Exclusive claim on one form, released on drop.
#[derive(Debug)]
pub struct SaveTicket {
    form_id: Id,
    in_flight: Arc<Mutex<HashSet<Id>>>,
}

impl SaveTicket {
    pub fn form_id(&self) -> Id {
        self.form_id
    }
}

impl Drop for SaveTicket {
    fn drop(&mut self) {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.form_id);
    }
}
