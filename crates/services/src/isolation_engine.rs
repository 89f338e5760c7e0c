#![deny(clippy::all, clippy::pedantic, clippy::nursery, warnings)]

use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use tenant_bench_core::domain::environment::EnvironmentHandle;
use tenant_bench_core::domain::template::{OwnerScope, Template, TemplateKind};
use tenant_bench_core::error::{Error, Result};
use tenant_bench_persistence::repositories::{RuntimeEnvironmentRepository, TemplateRepository};
use tenant_bench_persistence::EnvironmentHandler;

/// Tenant schemas are named `state_<environment id, hex>`.
fn tenant_schema_name(environment_id: Uuid) -> String {
    format!("state_{}", environment_id.as_simple())
}

/// Provisions and tears down per-run tenant schemas by cloning a registered
/// template, and promotes a tenant's current state back into the template
/// catalog.
#[derive(Clone)]
pub struct IsolationEngine {
    handler: EnvironmentHandler,
    templates: TemplateRepository,
    environments: RuntimeEnvironmentRepository,
}

impl IsolationEngine {
    #[must_use]
    pub const fn new(
        handler: EnvironmentHandler,
        templates: TemplateRepository,
        environments: RuntimeEnvironmentRepository,
    ) -> Self {
        Self {
            handler,
            templates,
            environments,
        }
    }

    /// # Errors
    /// `template_schema_not_registered` if `template_location` doesn't name a
    /// registered template; any database error encountered while cloning.
    #[allow(clippy::too_many_arguments)]
    pub async fn create_environment(
        &self,
        template_location: &str,
        ttl_seconds: i64,
        created_by: Uuid,
        impersonate_user_id: Option<Uuid>,
        impersonate_email: Option<&str>,
    ) -> Result<EnvironmentHandle> {
        let template = self.templates.find_by_location(template_location).await?;

        let environment_id = Uuid::now_v7();
        let schema = tenant_schema_name(environment_id);
        let expires_at = OffsetDateTime::now_utc() + Duration::seconds(ttl_seconds);

        let mut tx = self.handler.pool().begin().await.map_err(Error::Database)?;

        self.handler.create_schema(&mut tx, &schema).await?;
        self.handler
            .clone_structure(&mut tx, &template.location, &schema)
            .await?;
        self.handler.clone_data(&mut tx, &template.location, &schema).await?;
        self.handler
            .bind_runtime_environment(
                &mut tx,
                environment_id,
                &schema,
                expires_at,
                created_by,
                impersonate_user_id,
                impersonate_email,
                Some(template.id),
            )
            .await?;

        tx.commit().await.map_err(Error::Database)?;

        Ok(EnvironmentHandle {
            environment_id,
            schema_name: schema,
            expires_at,
            impersonate_user_id,
            impersonate_email: impersonate_email.map(ToString::to_string),
        })
    }

    /// # Errors
    /// [`Error::NotFound`] if `env_id` doesn't name a runtime environment.
    pub async fn get_schema_for_environment(&self, env_id: Uuid) -> Result<String> {
        self.environments.schema_for(env_id).await
    }

    /// Registers the tenant's current schema as a new immutable template,
    /// adopting it as the template's `location` and retiring the source RTE.
    ///
    /// # Errors
    /// [`Error::BadRequest`] (`owner_scope_ambiguous`) if `owner_scope = org`
    /// and `owner_org_id` is absent; [`Error::NotFound`] if `env_id` is
    /// unknown.
    #[allow(clippy::too_many_arguments)]
    pub async fn create_template_from_environment(
        &self,
        env_id: Uuid,
        service: &str,
        name: &str,
        description: Option<&str>,
        owner_scope: OwnerScope,
        owner_user_id: Option<Uuid>,
        owner_org_id: Option<Uuid>,
        version: i32,
    ) -> Result<Template> {
        if owner_scope == OwnerScope::Org && owner_org_id.is_none() {
            return Err(Error::BadRequest(
                "owner_scope_ambiguous: org-scoped template requires owner_org_id".to_string(),
            ));
        }

        let environment = self.environments.get(env_id).await?;

        let template = self
            .templates
            .create(
                service,
                name,
                version,
                description,
                TemplateKind::SchemaDump,
                &environment.schema,
                owner_scope,
                owner_org_id,
                owner_user_id,
            )
            .await?;

        self.environments
            .mark_status(env_id, tenant_bench_core::domain::environment::EnvironmentStatus::Deleted)
            .await?;

        Ok(template)
    }
}
