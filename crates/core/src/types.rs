/// All entity identifiers are UUIDs generated at creation time.
pub type Id = uuid::Uuid;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Generate a fresh identifier for a new entity.
pub fn new_id() -> Id {
    uuid::Uuid::new_v4()
}

/// Check whether a string is a canonical hyphenated UUID.
///
/// Only the 36-character `8-4-4-4-12` form is accepted; braced, URN and
/// simple (no hyphens) encodings are rejected.
pub fn is_valid_id(value: &str) -> bool {
    value.len() == 36 && uuid::Uuid::try_parse(value).is_ok()
}

/// The acting user, passed explicitly to operations that need one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub user_id: Id,
    pub company_id: Id,
}
