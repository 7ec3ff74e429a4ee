//! HSSEQ form builder domain logic.
//!
//! This crate has no database or HTTP dependencies. It owns the form and
//! field model, the local editing state of a form (`field_list`, `editor`),
//! and the reconciliation of local edits against a persistence backend
//! (`reconcile`, `backend`), including the offline draft fallback
//! (`draft_store`).

pub mod backend;
pub mod codec;
pub mod draft_store;
pub mod editor;
pub mod error;
pub mod field_list;
pub mod form;
pub mod form_field;
pub mod notify;
pub mod provenance;
pub mod reconcile;
pub mod save_guard;
pub mod submission;
pub mod types;
