use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::{Error, Result};

/// `pending -> running -> {passed, failed, error}`. Terminal states never
/// transition; `endRun` on a terminal run is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "run_status", rename_all = "snake_case")]
#[serde(rename_all = "camelCase")]
pub enum RunStatus {
    Pending,
    Running,
    Passed,
    Failed,
    Error,
}

impl RunStatus {
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Passed | Self::Failed | Self::Error)
    }

    /// Checked transition used by the orchestrator before every status
    /// update; mirrors the conditional `WHERE status = '...'` guard the
    /// repository layer uses to make the same check atomic at the database.
    ///
    /// # Errors
    /// Returns [`Error::StateError`] if `self` is already terminal.
    pub fn checked_transition(self, next: Self) -> Result<Self> {
        if self.is_terminal() {
            return Err(Error::StateError(
                "run_already_ended: cannot transition out of a terminal state".to_string(),
            ));
        }
        Ok(next)
    }
}

/// A single agent attempt against one environment, bracketed by two
/// snapshots and scored by a compiled DSL spec.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TestRun {
    pub id: Uuid,
    pub test_id: Uuid,
    pub test_suite_id: Option<Uuid>,
    pub environment_id: Uuid,
    pub status: RunStatus,
    pub before_snapshot_suffix: Option<String>,
    pub after_snapshot_suffix: Option<String>,
    pub result: Option<Value>,
    pub created_by: Uuid,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}
