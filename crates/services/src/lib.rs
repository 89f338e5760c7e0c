#![deny(clippy::all, clippy::pedantic, clippy::nursery, warnings)]

pub mod bootstrap;
pub mod isolation_engine;
pub mod run_orchestrator;
pub mod template_catalog;

pub use bootstrap::{init_logger_with_default, init_pg_pool};
pub use isolation_engine::IsolationEngine;
pub use run_orchestrator::RunOrchestrator;
pub use template_catalog::TemplateCatalog;
