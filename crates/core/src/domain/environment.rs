use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// Lifecycle of a `RuntimeEnvironment`.
///
/// `initializing -> ready` once DDL + data seeding commit; `ready -> expired`
/// is advisory only (TTL hit, no automatic destruction); `{ready,expired} ->
/// deleted` once the schema is actually dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "environment_status", rename_all = "snake_case")]
#[serde(rename_all = "camelCase")]
pub enum EnvironmentStatus {
    Initializing,
    Ready,
    Expired,
    Deleted,
}

/// A live tenant: a schema cloned from a template, owned by exactly one run
/// or interactive session.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct RuntimeEnvironment {
    pub id: Uuid,
    pub template_id: Option<Uuid>,
    /// `state_<32-hex-digits>`; unique, never reused.
    pub schema: String,
    pub status: EnvironmentStatus,
    pub expires_at: Option<OffsetDateTime>,
    pub last_used_at: Option<OffsetDateTime>,
    pub created_by: Uuid,
    pub impersonate_user_id: Option<Uuid>,
    pub impersonate_email: Option<String>,
    pub created_at: OffsetDateTime,
}

/// What `Isolation Engine::create_environment` hands back to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvironmentHandle {
    pub environment_id: Uuid,
    pub schema_name: String,
    pub expires_at: OffsetDateTime,
    pub impersonate_user_id: Option<Uuid>,
    pub impersonate_email: Option<String>,
}
