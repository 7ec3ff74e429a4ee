//! Data access for the form builder tables.
//!
//! Each repository is a unit struct of async functions. Functions that take
//! a generic `PgExecutor` can run against the pool or inside a transaction.

pub mod form_field_repo;
pub mod form_repo;
pub mod submission_repo;

pub use form_field_repo::FormFieldRepo;
pub use form_repo::FormRepo;
pub use submission_repo::SubmissionRepo;
