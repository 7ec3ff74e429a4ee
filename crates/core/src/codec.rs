//! Mapping between [`FormField`] and its persisted row shape.
//!
//! Nested structures (options, validation rules) are stored as JSON values,
//! enums as their text tags. `decode_field(&encode_field(f, ..))` returns `f`
//! unchanged for every field whose `order_index` matches its position.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use crate::error::CoreError;
use crate::form_field::{FieldOption, FormField, ValidationRules};
use crate::types::Id;

/// A persisted `form_fields` row (without timestamps).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldRecord {
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

/// Flatten a field into its row for `form_id` at display position `index`.
pub fn encode_field(field: &FormField, form_id: Id, index: usize) -> FieldRecord {
    FieldRecord {
        id: field.id,
        form_id,
        field_type: field.field_type.as_str().to_string(),
        label: field.label.clone(),
        placeholder: field.placeholder.clone(),
        description: field.description.clone(),
        required: field.required,
        options: field.options.as_deref().map(options_json),
        validation: field.validation.as_ref().map(validation_json),
        order_index: index as i32,
        layout: field.layout.as_str().to_string(),
        hidden: field.hidden,
        readonly: field.readonly,
        default_value: field.default_value.clone(),
        parent_id: field.parent_id,
    }
}

fn options_json(options: &[FieldOption]) -> Value {
    options
        .iter()
        .map(|o| {
            let mut entry = Map::new();
            entry.insert("label".into(), Value::String(o.label.clone()));
            entry.insert("value".into(), Value::String(o.value.clone()));
            Value::Object(entry)
        })
        .collect()
}

/// Same shape as the serde form of [`ValidationRules`]. Non-finite bounds
/// have no JSON form and are left out; [`ValidationRules::check`] rejects
/// them before anything is saved.
fn validation_json(rules: &ValidationRules) -> Value {
    let mut map = Map::new();
    if let Some(required) = rules.required {
        map.insert("required".into(), Value::Bool(required));
    }
    if let Some(n) = rules.min_length {
        map.insert("minLength".into(), Value::from(n));
    }
    if let Some(n) = rules.max_length {
        map.insert("maxLength".into(), Value::from(n));
    }
    if let Some(pattern) = &rules.pattern {
        map.insert("pattern".into(), Value::String(pattern.clone()));
    }
    if let Some(n) = rules.min.and_then(Number::from_f64) {
        map.insert("min".into(), Value::Number(n));
    }
    if let Some(n) = rules.max.and_then(Number::from_f64) {
        map.insert("max".into(), Value::Number(n));
    }
    Value::Object(map)
}

/// Encode a whole ordered field list.
pub fn encode_fields(fields: &[FormField], form_id: Id) -> Vec<FieldRecord> {
    fields
        .iter()
        .enumerate()
        .map(|(i, f)| encode_field(f, form_id, i))
        .collect()
}

/// Rebuild a field from its row.
pub fn decode_field(record: &FieldRecord) -> Result<FormField, CoreError> {
    let options = decode_json::<Vec<FieldOption>>(record.options.as_ref(), "options", record.id)?;
    let validation =
        decode_json::<ValidationRules>(record.validation.as_ref(), "validation", record.id)?;

    Ok(FormField {
        id: record.id,
        field_type: record.field_type.parse()?,
        label: record.label.clone(),
        placeholder: record.placeholder.clone(),
        required: record.required,
        options,
        description: record.description.clone(),
        validation,
        hidden: record.hidden,
        readonly: record.readonly,
        default_value: record.default_value.clone(),
        layout: record.layout.parse()?,
        order_index: record.order_index,
        parent_id: record.parent_id,
    })
}

/// Decode rows into fields sorted by `order_index`.
pub fn decode_fields(records: &[FieldRecord]) -> Result<Vec<FormField>, CoreError> {
    let mut fields = records
        .iter()
        .map(decode_field)
        .collect::<Result<Vec<_>, _>>()?;
    fields.sort_by_key(|f| f.order_index);
    Ok(fields)
}

fn decode_json<T: serde::de::DeserializeOwned>(
    value: Option<&serde_json::Value>,
    column: &str,
    id: Id,
) -> Result<Option<T>, CoreError> {
    match value {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(v) => serde_json::from_value(v.clone()).map(Some).map_err(|e| {
            CoreError::MalformedInput(format!("Field {id} has unreadable {column}: {e}"))
        }),
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::form_field::{FieldLayout, FieldType};
    use crate::types::new_id;

    fn fully_populated() -> FormField {
        FormField {
            id: new_id(),
            field_type: FieldType::Radio,
            label: "Severity".into(),
            placeholder: Some("Pick one".into()),
            required: true,
            options: Some(vec![
                FieldOption {
                    label: "Low".into(),
                    value: "low".into(),
                },
                FieldOption {
                    label: "High".into(),
                    value: "high".into(),
                },
            ]),
            description: Some("Assessed by the site lead".into()),
            validation: Some(ValidationRules {
                required: Some(true),
                min_length: Some(1),
                max_length: Some(20),
                pattern: Some("^[a-z]+$".into()),
                min: Some(0.0),
                max: Some(5.5),
            }),
            hidden: true,
            readonly: true,
            default_value: Some("low".into()),
            layout: FieldLayout::Third,
            order_index: 0,
            parent_id: Some(new_id()),
        }
    }

    #[test]
    fn round_trip_is_lossless() {
        let field = fully_populated();
        let record = encode_field(&field, new_id(), 0);
        assert_eq!(decode_field(&record).unwrap(), field);
    }

    #[test]
    fn round_trip_keeps_empty_collections_distinct_from_absent() {
        let mut field = FormField::new(FieldType::Select);
        field.options = Some(Vec::new());
        field.validation = Some(ValidationRules::default());
        let record = encode_field(&field, new_id(), 0);
        assert_eq!(decode_field(&record).unwrap(), field);

        let plain = FormField::new(FieldType::Text);
        let record = encode_field(&plain, new_id(), 0);
        assert!(record.options.is_none());
        assert_eq!(decode_field(&record).unwrap(), plain);
    }

    #[test]
    fn encode_uses_position_as_order_index() {
        let mut field = FormField::new(FieldType::Text);
        field.order_index = 42;
        let record = encode_field(&field, new_id(), 3);
        assert_eq!(record.order_index, 3);
        assert_eq!(record.field_type, "text");
        assert_eq!(record.layout, "full");
    }

    #[test]
    fn validation_json_uses_camel_case_keys() {
        let record = encode_field(&fully_populated(), new_id(), 0);
        let validation = record.validation.unwrap();
        assert_eq!(validation["minLength"], 1);
        assert_eq!(validation["maxLength"], 20);
    }

    #[test]
    fn encoded_json_matches_serde_shape() {
        let field = fully_populated();
        let record = encode_field(&field, new_id(), 0);
        assert_eq!(
            record.validation,
            Some(serde_json::to_value(field.validation.as_ref().unwrap()).unwrap())
        );
        assert_eq!(
            record.options,
            Some(serde_json::to_value(field.options.as_ref().unwrap()).unwrap())
        );
    }

    #[test]
    fn fractional_and_negative_bounds_survive_round_trip() {
        let mut field = FormField::new(FieldType::Number);
        field.validation = Some(ValidationRules {
            min: Some(-40.25),
            max: Some(1.0e12),
            ..Default::default()
        });
        let record = encode_field(&field, new_id(), 0);
        assert_eq!(decode_field(&record).unwrap(), field);
    }

    #[test]
    fn decode_fields_sorts_by_order_index() {
        let form_id = new_id();
        let a = FormField::new(FieldType::Text);
        let b = FormField::new(FieldType::Number);
        let mut records = encode_fields(&[a.clone(), b.clone()], form_id);
        records.reverse();
        let decoded = decode_fields(&records).unwrap();
        assert_eq!(decoded[0].id, a.id);
        assert_eq!(decoded[1].id, b.id);
    }

    #[test]
    fn unreadable_options_are_malformed() {
        let mut record = encode_field(&FormField::new(FieldType::Select), new_id(), 0);
        record.options = Some(serde_json::json!("not a list"));
        assert_matches!(decode_field(&record), Err(CoreError::MalformedInput(_)));
    }

    #[test]
    fn unknown_stored_type_is_malformed() {
        let mut record = encode_field(&FormField::new(FieldType::Text), new_id(), 0);
        record.field_type = "widget".into();
        assert_matches!(decode_field(&record), Err(CoreError::MalformedInput(_)));
    }
}
