pub mod diff;
pub mod runtime_environment;
pub mod template;
pub mod test;
pub mod test_run;

pub use diff::DiffRepository;
pub use runtime_environment::RuntimeEnvironmentRepository;
pub use template::TemplateRepository;
pub use test::{TestRepository, TestSuiteRepository};
pub use test_run::TestRunRepository;
