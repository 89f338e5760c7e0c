#![deny(clippy::all, clippy::pedantic, clippy::nursery, warnings)]

pub mod config;
pub mod domain;
pub mod error;

pub use domain::{
    Diff, DiffPayload, EnvironmentStatus, OwnerScope, Principal, RunStatus, RuntimeEnvironment,
    Template, TemplateKind, Test, TestMembership, TestRun, TestSuite, TestType, Visibility,
};
pub use error::{Error, ErrorKind, Result};
