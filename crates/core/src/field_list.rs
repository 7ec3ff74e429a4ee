//! The ordered field list of the form being edited.
//!
//! Invariant: after every operation, `fields[i].order_index == i` for all
//! `i`. Operations that shift positions renumber every affected field; an
//! adjacent swap only touches the two swapped fields.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::form_field::{FieldPatch, FieldType, FormField};
use crate::types::Id;

/// Direction of an adjacent-swap move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveDirection {
    Up,
    Down,
}

/// Local, ordered list of fields plus the currently selected field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldList {
    fields: Vec<FormField>,
    selected: Option<Id>,
}

impl FieldList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a list from fields already in display order.
    pub fn from_fields(fields: Vec<FormField>) -> Self {
        let mut list = Self {
            fields,
            selected: None,
        };
        list.renumber_from(0);
        list
    }

    pub fn fields(&self) -> &[FormField] {
        &self.fields
    }

    pub fn into_fields(self) -> Vec<FormField> {
        self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn ids(&self) -> Vec<Id> {
        self.fields.iter().map(|f| f.id).collect()
    }

    pub fn get(&self, id: Id) -> Option<&FormField> {
        self.fields.iter().find(|f| f.id == id)
    }

    pub fn position(&self, id: Id) -> Option<usize> {
        self.fields.iter().position(|f| f.id == id)
    }

    // -----------------------------------------------------------------------
    // Selection
    // -----------------------------------------------------------------------

    pub fn selected(&self) -> Option<&FormField> {
        self.selected.and_then(|id| self.get(id))
    }

    pub fn selected_id(&self) -> Option<Id> {
        self.selected
    }

    /// Select a field. Returns `false` (and keeps the selection) if the id
    /// is unknown.
    pub fn select(&mut self, id: Id) -> bool {
        if self.get(id).is_some() {
            self.selected = Some(id);
            true
        } else {
            false
        }
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    /// Add a field of `field_type` with palette defaults.
    ///
    /// With `at == None` the field is appended; otherwise it is inserted at
    /// `at` (clamped to the list length). The new field becomes selected.
    pub fn add_field(&mut self, field_type: FieldType, at: Option<usize>) -> &FormField {
        self.insert_field(FormField::new(field_type), at)
    }

    /// Insert an already-built field. Same placement rules as [`add_field`].
    ///
    /// [`add_field`]: FieldList::add_field
    pub fn insert_field(&mut self, field: FormField, at: Option<usize>) -> &FormField {
        let index = at.map_or(self.fields.len(), |i| i.min(self.fields.len()));
        self.selected = Some(field.id);
        self.fields.insert(index, field);
        self.renumber_from(index);
        &self.fields[index]
    }

    /// Remove a field by id. Unknown ids are a no-op and return `false`.
    pub fn delete_field(&mut self, id: Id) -> bool {
        let Some(index) = self.position(id) else {
            return false;
        };
        self.fields.remove(index);
        self.renumber_from(index);
        if self.selected == Some(id) {
            self.selected = None;
        }
        true
    }

    /// Swap a field with its neighbour in `direction`.
    ///
    /// Returns `false` for unknown ids and at the list boundaries.
    pub fn move_field(&mut self, id: Id, direction: MoveDirection) -> bool {
        let Some(index) = self.position(id) else {
            return false;
        };
        let other = match direction {
            MoveDirection::Up if index > 0 => index - 1,
            MoveDirection::Down if index + 1 < self.fields.len() => index + 1,
            _ => return false,
        };
        self.fields.swap(index, other);
        self.fields[index].order_index = index as i32;
        self.fields[other].order_index = other as i32;
        true
    }

    /// Merge `patch` into the field with the given id.
    ///
    /// Unknown ids are a no-op (`Ok(false)`). A patch that would leave the
    /// field invalid is rejected and the field is left untouched.
    pub fn update_field(&mut self, id: Id, patch: &FieldPatch) -> Result<bool, CoreError> {
        let Some(index) = self.position(id) else {
            return Ok(false);
        };
        let mut candidate = self.fields[index].clone();
        if !patch.apply(&mut candidate) {
            return Ok(false);
        }
        candidate.validate()?;
        self.fields[index] = candidate;
        Ok(true)
    }

    /// Replace the whole list (e.g. after loading or restoring a draft).
    pub fn replace_all(&mut self, fields: Vec<FormField>) {
        self.fields = fields;
        self.renumber_from(0);
        if let Some(id) = self.selected {
            if self.get(id).is_none() {
                self.selected = None;
            }
        }
    }

    fn renumber_from(&mut self, start: usize) {
        for (i, field) in self.fields.iter_mut().enumerate().skip(start) {
            field.order_index = i as i32;
        }
    }
}
