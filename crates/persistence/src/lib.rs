#![deny(clippy::all, clippy::pedantic, clippy::nursery, warnings)]

pub mod differ;
pub mod environment_handler;
pub mod migration_service;
pub mod repositories;
pub mod row_mapper;
pub mod session;

pub use differ::Differ;
pub use environment_handler::EnvironmentHandler;
pub use migration_service::{AppliedMigration, MigrationService, MigrationStatus};
pub use repositories::{
    DiffRepository, RuntimeEnvironmentRepository, TemplateRepository, TestRepository,
    TestRunRepository, TestSuiteRepository,
};
pub use session::SessionRouter;
