use sqlx::{PgPool, Row};
use uuid::Uuid;

use tenant_bench_core::domain::diff::Diff;
use tenant_bench_core::error::{Error, Result};

/// Meta-store repository for durable `Diff` records. Rows are written by
/// [`crate::differ::Differ::store_diff`]; this repository covers lookup.
/// `payload` doesn't implement `sqlx::Decode` directly (it's a tagged-value
/// tree, not a column scalar), so rows are mapped by hand rather than via
/// `FromRow`.
#[derive(Clone)]
pub struct DiffRepository {
    pool: PgPool,
}

impl DiffRepository {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// # Errors
    /// Returns [`Error::NotFound`] if no diff has `id`.
    pub async fn get(&self, id: Uuid) -> Result<Diff> {
        let row = sqlx::query("SELECT * FROM diffs WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?
            .ok_or_else(|| Error::NotFound(format!("diff {id} not found")))?;

        Self::from_row(&row)
    }

    /// # Errors
    /// Returns a database error if the query fails.
    pub async fn list_for_environment(&self, environment_id: Uuid) -> Result<Vec<Diff>> {
        let rows = sqlx::query("SELECT * FROM diffs WHERE environment_id = $1 ORDER BY created_at DESC")
            .bind(environment_id)
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;

        rows.iter().map(Self::from_row).collect()
    }

    fn from_row(row: &sqlx::postgres::PgRow) -> Result<Diff> {
        let payload_json: serde_json::Value = row.try_get("payload").map_err(Error::Database)?;
        let payload = serde_json::from_value(payload_json).map_err(Error::Serialization)?;

        Ok(Diff {
            id: row.try_get("id").map_err(Error::Database)?,
            environment_id: row.try_get("environment_id").map_err(Error::Database)?,
            before_suffix: row.try_get("before_suffix").map_err(Error::Database)?,
            after_suffix: row.try_get("after_suffix").map_err(Error::Database)?,
            payload,
            created_at: row.try_get("created_at").map_err(Error::Database)?,
        })
    }
}
