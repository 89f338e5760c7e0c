use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "test_type", rename_all = "snake_case")]
#[serde(rename_all = "camelCase")]
pub enum TestType {
    ActionEval,
    RetrievalEval,
    CompositeEval,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "visibility", rename_all = "snake_case")]
#[serde(rename_all = "camelCase")]
pub enum Visibility {
    Public,
    Private,
}

/// One benchmark case: a prompt, a template to start from, and a compiled
/// DSL spec (`expected_output`) the orchestrator evaluates the run's diff
/// against.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Test {
    pub id: Uuid,
    pub name: String,
    pub prompt: String,
    #[serde(rename = "type")]
    pub test_type: TestType,
    /// Compiled DSL spec for `actionEval`/`compositeEval`; opaque JSON for
    /// `retrievalEval` tests, which this core does not interpret.
    pub expected_output: Value,
    pub template_ref: Uuid,
    pub impersonate_user_id: Option<Uuid>,
    pub owner: Uuid,
    pub created_at: OffsetDateTime,
}

/// Named, ownable collection of tests.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TestSuite {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub owner: Uuid,
    pub visibility: Visibility,
    pub created_at: OffsetDateTime,
}

/// Many-to-many join between `TestSuite` and `Test`.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TestMembership {
    pub test_suite_id: Uuid,
    pub test_id: Uuid,
}
