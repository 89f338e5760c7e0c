#![deny(clippy::all, clippy::pedantic, clippy::nursery, warnings)]

/// The version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The name of the library
pub const NAME: &str = env!("CARGO_PKG_NAME");

pub use tenant_bench_api::{configure_app, configure_app_with_options, ApiConfiguration, ApiResponse, CoreServices};
pub use tenant_bench_core::error::{Error, Result};
pub use tenant_bench_services::{init_logger_with_default, init_pg_pool, IsolationEngine, RunOrchestrator, TemplateCatalog};
