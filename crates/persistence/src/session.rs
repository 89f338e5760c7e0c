use std::future::Future;

use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;
use time::OffsetDateTime;

use tenant_bench_core::domain::environment::EnvironmentStatus;
use tenant_bench_core::error::{Error, Result};

/// Binds a logical request to a physical connection whose default search
/// path resolves inside one schema: either the meta-store's `public` schema
/// or a tenant's `state_<id>` schema. Every scope is a single transaction:
/// commits on normal return, rolls back on any failure, always releases the
/// connection back to the pool.
#[derive(Clone)]
pub struct SessionRouter {
    pool: PgPool,
}

impl SessionRouter {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Run `f` in a transaction scoped to the meta-store (catalog) tables.
    ///
    /// # Errors
    /// Propagates any error from `f`, or a database error starting/ending
    /// the transaction.
    pub async fn with_meta_session<F, Fut, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(Transaction<'_, Postgres>) -> Fut,
        Fut: Future<Output = Result<(Transaction<'_, Postgres>, T)>>,
    {
        let tx = self.pool.begin().await.map_err(Error::Database)?;
        match f(tx).await {
            Ok((tx, value)) => {
                tx.commit().await.map_err(Error::Database)?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }

    /// Resolve `env_id` to its tenant schema and run `f` in a transaction
    /// whose search path resolves unqualified table references inside it.
    ///
    /// Fails with [`Error::StateError`] (`environment_not_available`) unless
    /// the environment's status is `ready`. On a successful resolution,
    /// `last_used_at` is updated atomically as part of the same transaction.
    ///
    /// # Errors
    /// Returns [`Error::NotFound`] if `env_id` does not name a known
    /// environment, [`Error::StateError`] if it is not `ready`, or propagates
    /// any error from `f`.
    pub async fn with_tenant_session<F, Fut, T>(&self, env_id: Uuid, f: F) -> Result<T>
    where
        F: FnOnce(Transaction<'_, Postgres>) -> Fut,
        Fut: Future<Output = Result<(Transaction<'_, Postgres>, T)>>,
    {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        let row: Option<(String, EnvironmentStatus)> =
            sqlx::query_as("SELECT schema, status FROM runtime_environments WHERE id = $1")
                .bind(env_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(Error::Database)?;

        let Some((schema, status)) = row else {
            return Err(Error::NotFound(format!("environment {env_id} not found")));
        };

        if status != EnvironmentStatus::Ready {
            return Err(Error::StateError(format!(
                "environment_not_available: environment {env_id} is {status:?}, not ready"
            )));
        }

        sqlx::query(&format!("SET search_path TO \"{schema}\", public"))
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;

        sqlx::query("UPDATE runtime_environments SET last_used_at = $2 WHERE id = $1")
            .bind(env_id)
            .bind(OffsetDateTime::now_utc())
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;

        match f(tx).await {
            Ok((tx, value)) => {
                tx.commit().await.map_err(Error::Database)?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }
}
