use sqlx::PgPool;
use uuid::Uuid;

use tenant_bench_core::domain::template::{OwnerScope, Template, TemplateKind};
use tenant_bench_core::error::{Error, Result};

/// Meta-store repository for immutable `Template` rows.
#[derive(Clone)]
pub struct TemplateRepository {
    pool: PgPool,
}

impl TemplateRepository {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// # Errors
    /// Returns a database error if the insert fails.
    #[allow(clippy::too_many_arguments)]
    pub async fn create(
        &self,
        service: &str,
        name: &str,
        version: i32,
        description: Option<&str>,
        kind: TemplateKind,
        location: &str,
        owner_scope: OwnerScope,
        owner_org_id: Option<Uuid>,
        owner_user_id: Option<Uuid>,
    ) -> Result<Template> {
        let id = Uuid::now_v7();
        sqlx::query_as::<_, Template>(
            r"INSERT INTO templates
                (id, service, name, version, description, kind, location,
                 owner_scope, owner_org_id, owner_user_id, created_at)
              VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, now())
              RETURNING *",
        )
        .bind(id)
        .bind(service)
        .bind(name)
        .bind(version)
        .bind(description)
        .bind(kind)
        .bind(location)
        .bind(owner_scope)
        .bind(owner_org_id)
        .bind(owner_user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)
    }

    /// # Errors
    /// Returns [`Error::NotFound`] if no template has `id`.
    pub async fn get(&self, id: Uuid) -> Result<Template> {
        sqlx::query_as::<_, Template>("SELECT * FROM templates WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?
            .ok_or_else(|| Error::NotFound(format!("template {id} not found")))
    }

    /// Resolve a bare schema-name template location: the Environment
    /// Handler convention for `(a) a bare schema name -> clone by DDL
    /// reflection + data copy`.
    ///
    /// # Errors
    /// Returns [`Error::NotFound`] if no template matches, or
    /// [`Error::Conflict`] if more than one does (ambiguous lookup).
    pub async fn find_by_location(&self, location: &str) -> Result<Template> {
        let mut matches = sqlx::query_as::<_, Template>("SELECT * FROM templates WHERE location = $1")
            .bind(location)
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;

        match matches.len() {
            0 => Err(Error::NotFound(format!(
                "template_schema_not_registered: no template registered at '{location}'"
            ))),
            1 => Ok(matches.remove(0)),
            _ => Err(Error::Conflict(format!(
                "multiple templates match location '{location}'"
            ))),
        }
    }

    /// # Errors
    /// Returns a database error if the query fails.
    pub async fn list_readable(&self, owner_user_id: Option<Uuid>, owner_org_id: Option<Uuid>) -> Result<Vec<Template>> {
        sqlx::query_as::<_, Template>(
            r"SELECT * FROM templates
              WHERE owner_scope = 'public'
                 OR (owner_scope = 'user' AND owner_user_id = $1)
                 OR (owner_scope = 'org' AND owner_org_id = $2)
              ORDER BY created_at DESC",
        )
        .bind(owner_user_id)
        .bind(owner_org_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)
    }
}
