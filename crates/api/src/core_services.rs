use sqlx::PgPool;
use uuid::Uuid;

use tenant_bench_core::config::AppConfig;
use tenant_bench_core::domain::access::Principal;
use tenant_bench_persistence::repositories::{
    RuntimeEnvironmentRepository, TemplateRepository, TestRepository, TestRunRepository,
    TestSuiteRepository,
};
use tenant_bench_persistence::EnvironmentHandler;
use tenant_bench_services::{IsolationEngine, RunOrchestrator, TemplateCatalog};

/// Fixed caller identity handed out in `development` mode, where no real
/// credential is validated (spec.md §6).
const DEVELOPMENT_PRINCIPAL_ID: Uuid = Uuid::nil();

/// Every core component, constructed once at startup from a single pool and
/// handed to the HTTP boundary as an explicit dependency. Replaces the
/// process-wide `dyn Any` service-locator the teacher's `ApiStateTrait` used
/// for its workflow/cache/entity services.
#[derive(Clone)]
pub struct CoreServices {
    pub config: AppConfig,
    pub pool: PgPool,
    pub isolation_engine: IsolationEngine,
    pub run_orchestrator: RunOrchestrator,
    pub template_catalog: TemplateCatalog,
}

impl CoreServices {
    #[must_use]
    pub fn new(config: AppConfig, pool: PgPool) -> Self {
        let handler = EnvironmentHandler::new(pool.clone());
        let templates = TemplateRepository::new(pool.clone());
        let environments = RuntimeEnvironmentRepository::new(pool.clone());
        let tests = TestRepository::new(pool.clone());
        let suites = TestSuiteRepository::new(pool.clone());
        let runs = TestRunRepository::new(pool.clone());

        let isolation_engine = IsolationEngine::new(handler, templates.clone(), environments.clone());
        let run_orchestrator = RunOrchestrator::new(runs, tests, suites, environments, pool.clone());
        let template_catalog = TemplateCatalog::new(templates);

        Self {
            config,
            pool,
            isolation_engine,
            run_orchestrator,
            template_catalog,
        }
    }

    /// `development` mode hands out a fixed principal instead of validating a
    /// credential; every other environment has no caller resolution wired up
    /// yet (authentication is explicitly out of scope for this boundary).
    #[must_use]
    pub fn development_principal(&self) -> Option<Principal> {
        if self.config.environment == "development" {
            Some(Principal::User(DEVELOPMENT_PRINCIPAL_ID))
        } else {
            None
        }
    }
}
