#![deny(clippy::all, clippy::pedantic, clippy::nursery, warnings)]

pub mod access;
pub mod diff;
pub mod environment;
pub mod run;
pub mod template;
pub mod test;

pub use access::Principal;
pub use diff::{Diff, DiffPayload};
pub use environment::{EnvironmentStatus, RuntimeEnvironment};
pub use run::{RunStatus, TestRun};
pub use template::{OwnerScope, Template, TemplateKind};
pub use test::{Test, TestMembership, TestSuite, TestType, Visibility};
