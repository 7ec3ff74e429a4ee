//! Repository for the `forms` table.

use hsseq_core::form::{FormUpdate, NewForm};
use hsseq_core::types::Id;
use sqlx::{PgExecutor, PgPool};

use crate::models::form::FormRow;

/// Column list for `forms` queries.
const COLUMNS: &str = "\
    id, title, description, company_id, created_by, published, \
    status, version, created_at, updated_at";

/// Provides data access for forms.
pub struct FormRepo;

impl FormRepo {
    /// Insert a new draft form with the caller-generated id.
    pub async fn create<'e, E: PgExecutor<'e>>(
        executor: E,
        form: &NewForm,
    ) -> Result<FormRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO forms (id, title, description, company_id, created_by) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, FormRow>(&query)
            .bind(form.id)
            .bind(&form.title)
            .bind(&form.description)
            .bind(form.company_id)
            .bind(form.created_by)
            .fetch_one(executor)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Id) -> Result<Option<FormRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM forms WHERE id = $1");
        sqlx::query_as::<_, FormRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List a company's forms, most recently updated first.
    pub async fn list_by_company(
        pool: &PgPool,
        company_id: Id,
    ) -> Result<Vec<FormRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM forms \
             WHERE company_id = $1 ORDER BY updated_at DESC"
        );
        sqlx::query_as::<_, FormRow>(&query)
            .bind(company_id)
            .fetch_all(pool)
            .await
    }

    /// Partially update a form.
    ///
    /// Uses `COALESCE` so only provided fields are changed. The description
    /// is nullable, so it is guarded by an explicit "set" flag instead.
    pub async fn update(
        pool: &PgPool,
        id: Id,
        update: &FormUpdate,
    ) -> Result<Option<FormRow>, sqlx::Error> {
        let query = format!(
            "UPDATE forms SET \
                 title       = COALESCE($2, title), \
                 description = CASE WHEN $3 THEN $4 ELSE description END, \
                 published   = COALESCE($5, published), \
                 status      = COALESCE($6, status), \
                 version     = COALESCE($7, version) \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, FormRow>(&query)
            .bind(id)
            .bind(&update.title)
            .bind(update.description.is_some())
            .bind(update.description.clone().flatten())
            .bind(update.published)
            .bind(update.status.map(|s| s.as_str()))
            .bind(update.version)
            .fetch_optional(pool)
            .await
    }

    /// Delete a form. Fields and submissions cascade.
    ///
    /// Returns `true` if a row was deleted.
    pub async fn delete(pool: &PgPool, id: Id) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM forms WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
