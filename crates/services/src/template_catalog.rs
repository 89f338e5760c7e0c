#![deny(clippy::all, clippy::pedantic, clippy::nursery, warnings)]

use uuid::Uuid;

use tenant_bench_core::domain::access::{can_read_template, Principal};
use tenant_bench_core::domain::template::{OwnerScope, Template};
use tenant_bench_core::error::{Error, Result};
use tenant_bench_persistence::repositories::TemplateRepository;

/// Template registry: `(service, ownerScope, ownerOrgId?, ownerUserId?, name,
/// version)`-identified immutable blueprints. Registration happens through
/// [`crate::isolation_engine::IsolationEngine::create_template_from_environment`]
/// or directly against a pre-existing schema via [`Self::register`]; this
/// type covers ownership-checked reads.
#[derive(Clone)]
pub struct TemplateCatalog {
    templates: TemplateRepository,
}

impl TemplateCatalog {
    #[must_use]
    pub const fn new(templates: TemplateRepository) -> Self {
        Self { templates }
    }

    /// List every template `principal` is allowed to read: public templates,
    /// plus `org`/`user`-scoped templates the principal owns.
    ///
    /// # Errors
    /// Returns a database error if the query fails.
    pub async fn list_readable(&self, principal: Principal) -> Result<Vec<Template>> {
        self.templates
            .list_readable(principal.user_id(), principal.org_id())
            .await
    }

    /// # Errors
    /// [`Error::NotFound`] if `id` doesn't exist or isn't readable by `principal`
    /// (reads outside scope are reported as not-found rather than
    /// unauthorized, so callers cannot enumerate private templates by id).
    pub async fn get_readable(&self, id: Uuid, principal: Principal) -> Result<Template> {
        let template = self.templates.get(id).await?;
        if can_read_template(principal, template.owner_scope, template.owner_user_id, template.owner_org_id) {
            Ok(template)
        } else {
            Err(Error::NotFound(format!("template {id} not found")))
        }
    }

    /// Register a pre-existing schema directly as a template, bypassing the
    /// environment-promotion path.
    ///
    /// # Errors
    /// Returns a database error if the insert fails.
    #[allow(clippy::too_many_arguments)]
    pub async fn register(
        &self,
        service: &str,
        name: &str,
        version: i32,
        description: Option<&str>,
        kind: tenant_bench_core::domain::template::TemplateKind,
        location: &str,
        owner_scope: OwnerScope,
        owner_org_id: Option<Uuid>,
        owner_user_id: Option<Uuid>,
    ) -> Result<Template> {
        self.templates
            .create(
                service,
                name,
                version,
                description,
                kind,
                location,
                owner_scope,
                owner_org_id,
                owner_user_id,
            )
            .await
    }
}
