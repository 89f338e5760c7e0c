#![deny(clippy::all, clippy::pedantic, clippy::nursery, warnings)]

use serde_json::json;
use uuid::Uuid;

use tenant_bench_core::domain::access::{can_access_run, can_read_suite, Principal};
use tenant_bench_core::domain::run::{RunStatus, TestRun};
use tenant_bench_core::error::{Error, Result};
use tenant_bench_dsl::{compile, evaluate};
use tenant_bench_persistence::repositories::{
    RuntimeEnvironmentRepository, TestRepository, TestRunRepository, TestSuiteRepository,
};
use tenant_bench_persistence::Differ;

/// Bracket an agent's mutations with two point-in-time snapshots, compute
/// the diff between them, and score it against a test's compiled assertion
/// spec. Owns the `pending -> running -> {passed, failed, error}` state
/// machine; every transition is guarded at the database by
/// [`TestRunRepository`]'s conditional `WHERE status = ...` updates.
#[derive(Clone)]
pub struct RunOrchestrator {
    runs: TestRunRepository,
    tests: TestRepository,
    suites: TestSuiteRepository,
    environments: RuntimeEnvironmentRepository,
    pool: sqlx::PgPool,
}

impl RunOrchestrator {
    #[must_use]
    pub const fn new(
        runs: TestRunRepository,
        tests: TestRepository,
        suites: TestSuiteRepository,
        environments: RuntimeEnvironmentRepository,
        pool: sqlx::PgPool,
    ) -> Self {
        Self {
            runs,
            tests,
            suites,
            environments,
            pool,
        }
    }

    /// # Errors
    /// [`Error::Unauthorized`] if the test's suite is private and not owned
    /// by `principal`; any error surfaced while resolving the tenant schema
    /// or creating the before-snapshot.
    pub async fn start_run(
        &self,
        env_id: Uuid,
        test_id: Uuid,
        test_suite_id: Option<Uuid>,
        principal: Principal,
    ) -> Result<TestRun> {
        let test = self.tests.get(test_id).await?;

        if let Some(suite_id) = test_suite_id {
            let suite = self.suites.get(suite_id).await?;
            if !can_read_suite(principal, suite.visibility, suite.owner) {
                return Err(Error::Unauthorized(format!(
                    "principal cannot access private suite {suite_id}"
                )));
            }
        }

        let environment = self.environments.get(env_id).await?;
        let differ = Differ::new(self.pool.clone(), environment.schema.clone());

        let suffix = format!("before_{}", short_suffix());
        differ.create_snapshot(&suffix).await?;

        let created_by = principal.user_id().or_else(|| principal.org_id()).unwrap_or(test.owner);
        let run = self.runs.insert_pending(test_id, test_suite_id, env_id, created_by).await?;
        self.runs.mark_running(run.id, &suffix).await
    }

    /// # Errors
    /// [`Error::Unauthorized`] if `principal` didn't create the run;
    /// [`Error::StateError`] (`run_already_ended`) if the run is already
    /// terminal. Evaluation failures are caught and folded into an `error`
    /// status rather than propagated.
    pub async fn end_run(&self, run_id: Uuid, principal: Principal) -> Result<TestRun> {
        let run = self.runs.get(run_id).await?;
        if !can_access_run(principal, run.created_by) {
            return Err(Error::Unauthorized(format!(
                "principal cannot access run {run_id}"
            )));
        }

        let environment = self.environments.get(run.environment_id).await?;
        let differ = Differ::new(self.pool.clone(), environment.schema.clone());
        let after_suffix = format!("after_{}", short_suffix());

        let Some(before_suffix) = run.before_snapshot_suffix.clone() else {
            return Err(Error::StateError(
                "run has no before-snapshot; cannot end a run that never started".to_string(),
            ));
        };

        let (status, result) = match self
            .evaluate(&differ, &before_suffix, &after_suffix, run.test_id, run.environment_id)
            .await
        {
            Ok((evaluation, diff)) => {
                let status = if evaluation.passed { RunStatus::Passed } else { RunStatus::Failed };
                let result = json!({
                    "passed": evaluation.passed,
                    "failures": evaluation.failures,
                    "score": evaluation.score,
                    "diff": diff,
                });
                (status, result)
            }
            Err(err) => {
                let result = json!({
                    "passed": false,
                    "failures": [format!("{:?}: {err}", err.kind())],
                    "score": { "passed": 0, "total": 0, "percent": 0.0 },
                });
                (RunStatus::Error, result)
            }
        };

        self.runs.mark_ended(run_id, status, &after_suffix, result).await
    }

    /// The whole post-snapshot pipeline composed as one fallible unit: a
    /// failure anywhere in here (including the snapshot itself) is caught by
    /// `end_run` and folded into a `status=error` run record, rather than
    /// bubbling out of the orchestrator.
    async fn evaluate(
        &self,
        differ: &Differ,
        before_suffix: &str,
        after_suffix: &str,
        test_id: Uuid,
        environment_id: Uuid,
    ) -> Result<(tenant_bench_dsl::EvaluationResult, tenant_bench_core::domain::diff::DiffPayload)> {
        differ.create_snapshot(after_suffix).await?;

        let test = self.tests.get(test_id).await?;
        let diff = differ.get_diff(before_suffix, after_suffix).await?;
        differ
            .store_diff(environment_id, &diff, before_suffix, after_suffix)
            .await?;

        let compiled = compile(&test.expected_output)?;
        let evaluation = evaluate(&compiled, &diff);
        Ok((evaluation, diff))
    }
}

/// Eight hex digits, matching the core's `{before,after}_<8-hex-digits>`
/// snapshot-suffix convention.
fn short_suffix() -> String {
    let full = Uuid::now_v7().as_simple().to_string();
    full[..8].to_string()
}
