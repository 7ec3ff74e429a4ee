//! Derived provenance of fields relative to the last persisted snapshot.
//!
//! Provenance is never stored on a field. It is recomputed from the local
//! id list and the persisted id list whenever it is needed.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::types::Id;

/// Where a field stands relative to persisted storage.
///
/// - `New`      -- present locally, no persisted row.
/// - `Existing` -- present locally and persisted under the same id.
/// - `Removed`  -- persisted, but no longer present locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    New,
    Existing,
    Removed,
}

impl Provenance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Existing => "existing",
            Self::Removed => "removed",
        }
    }
}

/// Classify every id that appears on either side.
///
/// Local ids come first in local order, followed by removed ids in persisted
/// order.
pub fn classify(local: &[Id], persisted: &[Id]) -> Vec<(Id, Provenance)> {
    let persisted_set: HashSet<Id> = persisted.iter().copied().collect();
    let local_set: HashSet<Id> = local.iter().copied().collect();

    let mut out: Vec<(Id, Provenance)> = local
        .iter()
        .map(|id| {
            let p = if persisted_set.contains(id) {
                Provenance::Existing
            } else {
                Provenance::New
            };
            (*id, p)
        })
        .collect();

    out.extend(
        persisted
            .iter()
            .filter(|id| !local_set.contains(id))
            .map(|id| (*id, Provenance::Removed)),
    );
    out
}

/// Provenance of a single id, or `None` if it appears on neither side.
pub fn provenance_of(id: Id, local: &[Id], persisted: &[Id]) -> Option<Provenance> {
    match (local.contains(&id), persisted.contains(&id)) {
        (true, true) => Some(Provenance::Existing),
        (true, false) => Some(Provenance::New),
        (false, true) => Some(Provenance::Removed),
        (false, false) => None,
    }
}

/// Ids persisted but no longer present locally.
pub fn removed_ids(local: &[Id], persisted: &[Id]) -> Vec<Id> {
    classify(local, persisted)
        .into_iter()
        .filter(|(_, p)| *p == Provenance::Removed)
        .map(|(id, _)| id)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::new_id;

    #[test]
    fn classifies_all_three_states() {
        let (a, b, c) = (new_id(), new_id(), new_id());
        let result = classify(&[a, c], &[a, b]);
        assert_eq!(
            result,
            vec![
                (a, Provenance::Existing),
                (c, Provenance::New),
                (b, Provenance::Removed),
            ]
        );
    }

    #[test]
    fn nothing_persisted_means_all_new() {
        let ids = [new_id(), new_id()];
        assert!(classify(&ids, &[])
            .iter()
            .all(|(_, p)| *p == Provenance::New));
    }

    #[test]
    fn single_lookup_matches_classification() {
        let (a, b) = (new_id(), new_id());
        assert_eq!(provenance_of(a, &[a], &[a]), Some(Provenance::Existing));
        assert_eq!(provenance_of(b, &[a], &[a, b]), Some(Provenance::Removed));
        assert_eq!(provenance_of(new_id(), &[a], &[b]), None);
    }

    #[test]
    fn removed_ids_keeps_persisted_order() {
        let (a, b, c) = (new_id(), new_id(), new_id());
        assert_eq!(removed_ids(&[b], &[a, b, c]), vec![a, c]);
    }
}
