//! `form_fields` rows.

use hsseq_core::codec::FieldRecord;
use hsseq_core::types::Id;
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `form_fields` table, without its timestamps.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct FormFieldRow {
    pub id: Id,
    pub form_id: Id,
    pub field_type: String,
    pub label: String,
    pub placeholder: Option<String>,
    pub description: Option<String>,
    pub required: bool,
    pub options: Option<serde_json::Value>,
    pub validation: Option<serde_json::Value>,
    pub order_index: i32,
    pub layout: String,
    pub hidden: bool,
    pub readonly: bool,
    pub default_value: Option<String>,
    pub parent_id: Option<Id>,
}

impl From<FormFieldRow> for FieldRecord {
    fn from(row: FormFieldRow) -> Self {
        FieldRecord {
            id: row.id,
            form_id: row.form_id,
            field_type: row.field_type,
            label: row.label,
            placeholder: row.placeholder,
            description: row.description,
            required: row.required,
            options: row.options,
            validation: row.validation,
            order_index: row.order_index,
            layout: row.layout,
            hidden: row.hidden,
            readonly: row.readonly,
            default_value: row.default_value,
            parent_id: row.parent_id,
        }
    }
}
