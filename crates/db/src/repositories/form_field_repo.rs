//! Repository for the `form_fields` table.

use hsseq_core::codec::FieldRecord;
use hsseq_core::types::Id;
use sqlx::{PgExecutor, Postgres, QueryBuilder};

use crate::models::form_field::FormFieldRow;

/// Column list for `form_fields` queries.
const COLUMNS: &str = "\
    id, form_id, field_type, label, placeholder, description, required, \
    options, validation, order_index, layout, hidden, readonly, \
    default_value, parent_id";

/// Provides data access for form fields.
pub struct FormFieldRepo;

impl FormFieldRepo {
    /// List the fields of a form in display order.
    pub async fn list_by_form<'e, E: PgExecutor<'e>>(
        executor: E,
        form_id: Id,
    ) -> Result<Vec<FormFieldRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM form_fields \
             WHERE form_id = $1 ORDER BY order_index"
        );
        sqlx::query_as::<_, FormFieldRow>(&query)
            .bind(form_id)
            .fetch_all(executor)
            .await
    }

    /// Insert several fields in one multi-row `INSERT`.
    pub async fn create_many<'e, E: PgExecutor<'e>>(
        executor: E,
        fields: &[FieldRecord],
    ) -> Result<Vec<FormFieldRow>, sqlx::Error> {
        if fields.is_empty() {
            return Ok(Vec::new());
        }
        let mut builder = QueryBuilder::<Postgres>::new(format!("INSERT INTO form_fields ({COLUMNS}) "));
        builder.push_values(fields, |mut row, f| {
            row.push_bind(f.id)
                .push_bind(f.form_id)
                .push_bind(f.field_type.clone())
                .push_bind(f.label.clone())
                .push_bind(f.placeholder.clone())
                .push_bind(f.description.clone())
                .push_bind(f.required)
                .push_bind(f.options.clone())
                .push_bind(f.validation.clone())
                .push_bind(f.order_index)
                .push_bind(f.layout.clone())
                .push_bind(f.hidden)
                .push_bind(f.readonly)
                .push_bind(f.default_value.clone())
                .push_bind(f.parent_id);
        });
        builder.push(format!(" RETURNING {COLUMNS}"));
        builder
            .build_query_as::<FormFieldRow>()
            .fetch_all(executor)
            .await
    }

    /// Overwrite every column of a field except its form.
    pub async fn update<'e, E: PgExecutor<'e>>(
        executor: E,
        field: &FieldRecord,
    ) -> Result<Option<FormFieldRow>, sqlx::Error> {
        let query = format!(
            "UPDATE form_fields SET \
                 field_type = $2, label = $3, placeholder = $4, description = $5, \
                 required = $6, options = $7, validation = $8, order_index = $9, \
                 layout = $10, hidden = $11, readonly = $12, default_value = $13, \
                 parent_id = $14 \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, FormFieldRow>(&query)
            .bind(field.id)
            .bind(&field.field_type)
            .bind(&field.label)
            .bind(&field.placeholder)
            .bind(&field.description)
            .bind(field.required)
            .bind(&field.options)
            .bind(&field.validation)
            .bind(field.order_index)
            .bind(&field.layout)
            .bind(field.hidden)
            .bind(field.readonly)
            .bind(&field.default_value)
            .bind(field.parent_id)
            .fetch_optional(executor)
            .await
    }

    /// Returns `true` if a row was deleted.
    pub async fn delete<'e, E: PgExecutor<'e>>(executor: E, id: Id) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM form_fields WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete several fields. Returns the number of rows deleted.
    pub async fn delete_many<'e, E: PgExecutor<'e>>(
        executor: E,
        ids: &[Id],
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM form_fields WHERE id = ANY($1)")
            .bind(ids)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }
}
