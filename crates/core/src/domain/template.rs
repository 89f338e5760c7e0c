use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// Where a template's DDL/data actually live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "template_kind", rename_all = "snake_case")]
#[serde(rename_all = "camelCase")]
pub enum TemplateKind {
    SchemaDump,
    Artifact,
    JsonDoc,
}

/// Who can read a template: `public` templates are globally readable, `org`
/// and `user` templates require an ownership match (see [`crate::domain::access`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "owner_scope", rename_all = "snake_case")]
#[serde(rename_all = "camelCase")]
pub enum OwnerScope {
    Public,
    Org,
    User,
}

/// Immutable, named blueprint for a tenant. Identity is the tuple
/// `(service, owner_scope, owner_org_id, owner_user_id, name, version)`; a
/// new version is always a new row, never a mutation of an existing one.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Template {
    pub id: Uuid,
    pub service: String,
    pub name: String,
    pub version: i32,
    pub description: Option<String>,
    pub kind: TemplateKind,
    /// Opaque pointer the Environment Handler knows how to materialize: a
    /// bare schema name, or a URI with a recognized scheme.
    pub location: String,
    pub owner_scope: OwnerScope,
    pub owner_org_id: Option<Uuid>,
    pub owner_user_id: Option<Uuid>,
    pub created_at: OffsetDateTime,
}
