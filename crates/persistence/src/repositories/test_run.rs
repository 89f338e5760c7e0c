use sqlx::PgPool;
use uuid::Uuid;

use tenant_bench_core::domain::run::{RunStatus, TestRun};
use tenant_bench_core::error::{Error, Result};

/// Meta-store repository for `TestRun` rows. State transitions are guarded by
/// a conditional `WHERE status = '...'` clause so the
/// `pending -> running -> {passed, failed, error}` guarantee in
/// [`RunStatus::checked_transition`] holds atomically at the database, not
/// just in the orchestrator's in-memory check.
#[derive(Clone)]
pub struct TestRunRepository {
    pool: PgPool,
}

impl TestRunRepository {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new run in `pending`.
    ///
    /// # Errors
    /// Returns a database error if the insert fails.
    pub async fn insert_pending(
        &self,
        test_id: Uuid,
        test_suite_id: Option<Uuid>,
        environment_id: Uuid,
        created_by: Uuid,
    ) -> Result<TestRun> {
        let id = Uuid::now_v7();
        sqlx::query_as::<_, TestRun>(
            r"INSERT INTO test_runs
                (id, test_id, test_suite_id, environment_id, status, created_by, created_at, updated_at)
              VALUES ($1, $2, $3, $4, 'pending', $5, now(), now())
              RETURNING *",
        )
        .bind(id)
        .bind(test_id)
        .bind(test_suite_id)
        .bind(environment_id)
        .bind(created_by)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)
    }

    /// # Errors
    /// Returns [`Error::NotFound`] if no run has `id`.
    pub async fn get(&self, id: Uuid) -> Result<TestRun> {
        sqlx::query_as::<_, TestRun>("SELECT * FROM test_runs WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?
            .ok_or_else(|| Error::NotFound(format!("test run {id} not found")))
    }

    /// `pending -> running`, recording the suffix of the before-snapshot.
    ///
    /// # Errors
    /// Returns [`Error::StateError`] if the run isn't currently `pending`
    /// (either it doesn't exist, or a concurrent caller already moved it).
    pub async fn mark_running(&self, id: Uuid, before_snapshot_suffix: &str) -> Result<TestRun> {
        sqlx::query_as::<_, TestRun>(
            r"UPDATE test_runs
              SET status = 'running', before_snapshot_suffix = $2, updated_at = now()
              WHERE id = $1 AND status = 'pending'
              RETURNING *",
        )
        .bind(id)
        .bind(before_snapshot_suffix)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?
        .ok_or_else(|| {
            Error::StateError(format!(
                "run_already_ended: run {id} is not pending, cannot start"
            ))
        })
    }

    /// `running -> {passed, failed, error}`, recording the after-snapshot
    /// suffix and the evaluation result. The `WHERE status = 'running'` guard
    /// makes this the single point where a terminal status is assigned;
    /// a run already in a terminal state is rejected rather than overwritten.
    ///
    /// # Errors
    /// Returns [`Error::StateError`] if the run isn't currently `running`.
    pub async fn mark_ended(
        &self,
        id: Uuid,
        status: RunStatus,
        after_snapshot_suffix: &str,
        result: serde_json::Value,
    ) -> Result<TestRun> {
        if !matches!(status, RunStatus::Passed | RunStatus::Failed | RunStatus::Error) {
            return Err(Error::BadRequest(format!(
                "mark_ended called with non-terminal status {status:?}"
            )));
        }

        sqlx::query_as::<_, TestRun>(
            r"UPDATE test_runs
              SET status = $2, after_snapshot_suffix = $3, result = $4, updated_at = now()
              WHERE id = $1 AND status = 'running'
              RETURNING *",
        )
        .bind(id)
        .bind(status)
        .bind(after_snapshot_suffix)
        .bind(result)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?
        .ok_or_else(|| {
            Error::StateError(format!(
                "run_already_ended: run {id} is not running, cannot end"
            ))
        })
    }

    /// # Errors
    /// Returns a database error if the query fails.
    pub async fn list_for_test(&self, test_id: Uuid) -> Result<Vec<TestRun>> {
        sqlx::query_as::<_, TestRun>("SELECT * FROM test_runs WHERE test_id = $1 ORDER BY created_at DESC")
            .bind(test_id)
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)
    }
}
