#![deny(clippy::all, clippy::pedantic, clippy::nursery, warnings)]

pub mod ast;
pub mod compiler;
pub mod evaluator;

pub use ast::{Assertion, CompiledSpec, ExpectedCount, FieldChange, IgnoreFields, Predicate, WhereClause};
pub use compiler::compile;
pub use evaluator::{evaluate, EvaluationResult, Score};
