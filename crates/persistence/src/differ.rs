use std::collections::{HashMap, HashSet};

use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use tenant_bench_core::domain::diff::{Diff, DiffPayload, InsertedOrDeletedRow, Row, UpdatedRow};
use tenant_bench_core::error::{Error, Result};

use crate::row_mapper::extract_field_data;

/// Snapshot tables are named `<table>_snapshot_<suffix>`; this marker lets
/// table discovery exclude them from the base-table set they're derived
/// from.
const SNAPSHOT_MARKER: &str = "_snapshot_";

/// Produces structured diffs between two snapshots of one tenant schema.
/// Constructed once per `(schema)` pair; table discovery happens fresh on
/// every call so a schema whose table set changed between runs (it never
/// should, per the immutable-template invariant) is still handled safely.
#[derive(Clone)]
pub struct Differ {
    pool: PgPool,
    schema: String,
}

impl Differ {
    #[must_use]
    pub const fn new(pool: PgPool, schema: String) -> Self {
        Self { pool, schema }
    }

    /// Whether the tenant schema still exists. A dropped schema leaves no
    /// trace in `pg_tables`, so every table-discovery query would otherwise
    /// see zero tables and silently no-op instead of failing.
    ///
    /// # Errors
    /// Returns a database error if the catalog query fails.
    async fn schema_exists(&self) -> Result<bool> {
        sqlx::query_scalar(
            "SELECT EXISTS (SELECT FROM information_schema.schemata WHERE schema_name = $1)",
        )
        .bind(&self.schema)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)
    }

    /// Enumerate the base tables of the target schema, excluding any
    /// snapshot tables from earlier calls by name pattern.
    ///
    /// # Errors
    /// Returns [`Error::NotFound`] if the tenant schema no longer exists, or
    /// a database error if the catalog query fails.
    pub async fn base_tables(&self) -> Result<Vec<String>> {
        if !self.schema_exists().await? {
            return Err(Error::NotFound(format!(
                "tenant schema '{}' does not exist", self.schema
            )));
        }

        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT tablename FROM pg_catalog.pg_tables WHERE schemaname = $1 ORDER BY tablename",
        )
        .bind(&self.schema)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows
            .into_iter()
            .map(|(name,)| name)
            .filter(|name| !name.contains(SNAPSHOT_MARKER))
            .collect())
    }

    fn snapshot_table(table: &str, suffix: &str) -> String {
        format!("{table}_snapshot_{suffix}")
    }

    /// For every base table `T`, create `T_snapshot_<suffix>` as a full
    /// structure+data copy of `T`'s current rows, in one transaction.
    /// Idempotent: a snapshot table that already exists is left unchanged.
    ///
    /// # Errors
    /// Returns a database error if any copy fails.
    pub async fn create_snapshot(&self, suffix: &str) -> Result<()> {
        let tables = self.base_tables().await?;
        let mut tx: Transaction<'_, Postgres> = self.pool.begin().await.map_err(Error::Database)?;

        for table in &tables {
            let snapshot = Self::snapshot_table(table, suffix);
            let exists: bool = sqlx::query_scalar(
                "SELECT EXISTS (SELECT FROM pg_catalog.pg_tables WHERE schemaname = $1 AND tablename = $2)",
            )
            .bind(&self.schema)
            .bind(&snapshot)
            .fetch_one(&mut *tx)
            .await
            .map_err(Error::Database)?;

            if exists {
                continue;
            }

            sqlx::query(&format!(
                "CREATE TABLE \"{0}\".\"{snapshot}\" AS TABLE \"{0}\".\"{table}\"",
                self.schema
            ))
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;
        }

        tx.commit().await.map_err(Error::Database)?;
        Ok(())
    }

    /// Drop every `T_snapshot_<suffix>` table in the tenant schema.
    ///
    /// # Errors
    /// Returns a database error if a drop fails.
    pub async fn archive_snapshots(&self, suffix: &str) -> Result<()> {
        let tables = self.base_tables().await?;
        for table in &tables {
            let snapshot = Self::snapshot_table(table, suffix);
            sqlx::query(&format!(
                "DROP TABLE IF EXISTS \"{}\".\"{snapshot}\"",
                self.schema
            ))
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        }
        Ok(())
    }

    async fn fetch_snapshot_rows(&self, table: &str, suffix: &str) -> Result<Vec<Row>> {
        let snapshot = Self::snapshot_table(table, suffix);
        let query = format!("SELECT * FROM \"{}\".\"{snapshot}\"", self.schema);
        let rows = sqlx::query(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(rows.iter().map(extract_field_data).collect())
    }

    fn row_id(row: &Row) -> Option<serde_json::Value> {
        row.get("id").cloned()
    }

    /// Rows present in `after` but absent in `before`, keyed by primary key
    /// `id`.
    ///
    /// # Errors
    /// Returns a database error if either snapshot cannot be read.
    pub async fn get_inserts(&self, before_suffix: &str, after_suffix: &str) -> Result<Vec<InsertedOrDeletedRow>> {
        let mut out = Vec::new();
        for table in self.base_tables().await? {
            let before = self.fetch_snapshot_rows(&table, before_suffix).await?;
            let after = self.fetch_snapshot_rows(&table, after_suffix).await?;

            let before_ids: HashSet<_> = before.iter().filter_map(Self::row_id).collect();
            for row in after {
                if Self::row_id(&row).is_some_and(|id| !before_ids.contains(&id)) {
                    out.push(InsertedOrDeletedRow { table: table.clone(), row });
                }
            }
        }
        Ok(out)
    }

    /// Symmetric to [`Self::get_inserts`]: rows present in `before` but
    /// absent in `after`.
    ///
    /// # Errors
    /// Returns a database error if either snapshot cannot be read.
    pub async fn get_deletes(&self, before_suffix: &str, after_suffix: &str) -> Result<Vec<InsertedOrDeletedRow>> {
        let mut out = Vec::new();
        for table in self.base_tables().await? {
            let before = self.fetch_snapshot_rows(&table, before_suffix).await?;
            let after = self.fetch_snapshot_rows(&table, after_suffix).await?;

            let after_ids: HashSet<_> = after.iter().filter_map(Self::row_id).collect();
            for row in before {
                if Self::row_id(&row).is_some_and(|id| !after_ids.contains(&id)) {
                    out.push(InsertedOrDeletedRow { table: table.clone(), row });
                }
            }
        }
        Ok(out)
    }

    /// Rows present in both snapshots with at least one non-excluded column
    /// differing under SQL NULL-distinct comparison (`NULL` never equals a
    /// value; `NULL = NULL` holds).
    ///
    /// # Errors
    /// Returns a database error if either snapshot cannot be read.
    pub async fn get_updates(
        &self,
        before_suffix: &str,
        after_suffix: &str,
        exclude_cols: Option<&[String]>,
    ) -> Result<Vec<UpdatedRow>> {
        let excluded: HashSet<&str> = exclude_cols
            .map(|cols| cols.iter().map(String::as_str).collect())
            .unwrap_or_default();

        let mut out = Vec::new();
        for table in self.base_tables().await? {
            let before = self.fetch_snapshot_rows(&table, before_suffix).await?;
            let after = self.fetch_snapshot_rows(&table, after_suffix).await?;

            let before_by_id: HashMap<_, _> = before
                .into_iter()
                .filter_map(|row| Self::row_id(&row).map(|id| (id, row)))
                .collect();

            for after_row in after {
                let Some(id) = Self::row_id(&after_row) else { continue };
                let Some(before_row) = before_by_id.get(&id) else { continue };

                let differs = before_row.keys().chain(after_row.keys()).any(|col| {
                    if excluded.contains(col.as_str()) {
                        return false;
                    }
                    Self::null_distinct_differs(before_row.get(col), after_row.get(col))
                });

                if differs {
                    out.push(UpdatedRow {
                        table: table.clone(),
                        before: before_row.clone(),
                        after: after_row,
                    });
                }
            }
        }
        Ok(out)
    }

    fn null_distinct_differs(before: Option<&serde_json::Value>, after: Option<&serde_json::Value>) -> bool {
        let before = before.cloned().unwrap_or(serde_json::Value::Null);
        let after = after.cloned().unwrap_or(serde_json::Value::Null);
        if before.is_null() && after.is_null() {
            return false;
        }
        before != after
    }

    /// # Errors
    /// Returns a database error if any of the three underlying queries fail.
    pub async fn get_diff(&self, before_suffix: &str, after_suffix: &str) -> Result<DiffPayload> {
        Ok(DiffPayload {
            inserts: self.get_inserts(before_suffix, after_suffix).await?,
            updates: self.get_updates(before_suffix, after_suffix, None).await?,
            deletes: self.get_deletes(before_suffix, after_suffix).await?,
        })
    }

    /// Persist a computed diff payload under `environment_id`.
    ///
    /// # Errors
    /// Returns a database error if the insert fails, or [`Error::Serialization`]
    /// if the payload cannot be encoded as JSON.
    pub async fn store_diff(
        &self,
        environment_id: Uuid,
        payload: &DiffPayload,
        before_suffix: &str,
        after_suffix: &str,
    ) -> Result<Diff> {
        let id = Uuid::now_v7();
        let payload_json = serde_json::to_value(payload).map_err(Error::Serialization)?;

        let created_at: time::OffsetDateTime = sqlx::query_scalar(
            r"INSERT INTO diffs (id, environment_id, before_suffix, after_suffix, payload, created_at)
              VALUES ($1, $2, $3, $4, $5, now())
              RETURNING created_at",
        )
        .bind(id)
        .bind(environment_id)
        .bind(before_suffix)
        .bind(after_suffix)
        .bind(&payload_json)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(Diff {
            id,
            environment_id,
            before_suffix: before_suffix.to_string(),
            after_suffix: after_suffix.to_string(),
            payload: payload.clone(),
            created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn null_distinct_comparison_treats_two_nulls_as_equal() {
        assert!(!Differ::null_distinct_differs(None, None));
        assert!(!Differ::null_distinct_differs(Some(&serde_json::Value::Null), None));
    }

    #[test]
    fn null_distinct_comparison_treats_null_vs_value_as_differing() {
        assert!(Differ::null_distinct_differs(None, Some(&json!("x"))));
        assert!(Differ::null_distinct_differs(Some(&json!("x")), None));
    }

    #[test]
    fn snapshot_table_name_follows_naming_convention() {
        assert_eq!(Differ::snapshot_table("messages", "before_abcd1234"), "messages_snapshot_before_abcd1234");
    }
}
