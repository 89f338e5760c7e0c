use sqlx::PgPool;
use uuid::Uuid;

use tenant_bench_core::domain::environment::{EnvironmentStatus, RuntimeEnvironment};
use tenant_bench_core::error::{Error, Result};

/// Meta-store repository for `RuntimeEnvironment` (RTE) rows. Creation goes
/// through [`crate::environment_handler::EnvironmentHandler::bind_runtime_environment`]
/// as part of the provisioning transaction; this repository covers the
/// read/lookup side.
#[derive(Clone)]
pub struct RuntimeEnvironmentRepository {
    pool: PgPool,
}

impl RuntimeEnvironmentRepository {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// # Errors
    /// Returns [`Error::NotFound`] if no environment has `id`.
    pub async fn get(&self, id: Uuid) -> Result<RuntimeEnvironment> {
        sqlx::query_as::<_, RuntimeEnvironment>("SELECT * FROM runtime_environments WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?
            .ok_or_else(|| Error::NotFound(format!("environment {id} not found")))
    }

    /// Catalog-only lookup of the schema bound to `id`, without a status
    /// check — callers needing the `ready`-only guarantee should go through
    /// [`crate::session::SessionRouter::with_tenant_session`] instead.
    ///
    /// # Errors
    /// Returns [`Error::NotFound`] if no environment has `id`.
    pub async fn schema_for(&self, id: Uuid) -> Result<String> {
        sqlx::query_scalar("SELECT schema FROM runtime_environments WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?
            .ok_or_else(|| Error::NotFound(format!("environment {id} not found")))
    }

    /// # Errors
    /// Returns a database error if the update fails.
    pub async fn mark_status(&self, id: Uuid, status: EnvironmentStatus) -> Result<()> {
        sqlx::query("UPDATE runtime_environments SET status = $2 WHERE id = $1")
            .bind(id)
            .bind(status)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(())
    }
}
