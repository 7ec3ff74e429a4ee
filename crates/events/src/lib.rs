//! Form lifecycle events: an in-process [`EventBus`] of [`FormEvent`]s and
//! an [`EventLogger`] subscriber.

pub mod bus;
pub mod logger;

pub use bus::{EventBus, FormEvent, FormEventKind};
pub use logger::EventLogger;
