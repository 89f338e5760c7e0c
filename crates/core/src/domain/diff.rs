use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

/// A base-table row flattened to a tagged-value map, the way
/// `dynamic_entity_mapper::extract_field_data` maps a `PgRow` regardless of
/// its table's shape. `__table__` is injected by the Differ and is always
/// present on inserted/deleted rows.
pub type Row = HashMap<String, Value>;

/// One row present in `after` but absent in `before`, or vice versa.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsertedOrDeletedRow {
    #[serde(rename = "__table__")]
    pub table: String,
    #[serde(flatten)]
    pub row: Row,
}

/// One row present in both snapshots with at least one non-excluded column
/// differing under NULL-distinct comparison.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdatedRow {
    #[serde(rename = "__table__")]
    pub table: String,
    pub before: Row,
    pub after: Row,
}

/// `{inserts, updates, deletes}` produced by `Differ::get_diff`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DiffPayload {
    pub inserts: Vec<InsertedOrDeletedRow>,
    pub updates: Vec<UpdatedRow>,
    pub deletes: Vec<InsertedOrDeletedRow>,
}

/// Durable record of one computed comparison, stored under its environment's id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diff {
    pub id: Uuid,
    pub environment_id: Uuid,
    pub before_suffix: String,
    pub after_suffix: String,
    pub payload: DiffPayload,
    pub created_at: OffsetDateTime,
}
