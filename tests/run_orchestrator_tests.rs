#![deny(clippy::all, clippy::pedantic, clippy::nursery)]

//! End-to-end `startRun -> agent mutation -> endRun` scenarios, seeded from
//! the minimal Slack-like template. Each test brackets a direct SQL mutation
//! (standing in for the agent's action) between `start_run`/`end_run` and
//! checks the persisted `TestRun`. Skipped implicitly if `.env.test`'s
//! `DATABASE_URL` is unreachable (setup panics in that case, matching the
//! rest of this workspace's integration-test convention).

use serde_json::json;
use uuid::Uuid;

use tenant_bench_core::domain::access::Principal;
use tenant_bench_core::domain::run::RunStatus;
use tenant_bench_core::domain::template::{OwnerScope, Template, TemplateKind};
use tenant_bench_core::domain::test::TestType;
use tenant_bench_persistence::repositories::{
    RuntimeEnvironmentRepository, TemplateRepository, TestRepository, TestRunRepository, TestSuiteRepository,
};
use tenant_bench_persistence::EnvironmentHandler;
use tenant_bench_services::{IsolationEngine, RunOrchestrator};
use tenant_bench_test_support::{seed_slack_like_template, setup_test_db, SEED_CHANNEL_ID, SEED_USER_ID};

struct Harness {
    pool: sqlx::PgPool,
    engine: IsolationEngine,
    orchestrator: RunOrchestrator,
    tests: TestRepository,
    owner: Uuid,
}

impl Harness {
    async fn new(pool: sqlx::PgPool) -> Self {
        let handler = EnvironmentHandler::new(pool.clone());
        let templates = TemplateRepository::new(pool.clone());
        let environments = RuntimeEnvironmentRepository::new(pool.clone());
        let tests = TestRepository::new(pool.clone());
        let suites = TestSuiteRepository::new(pool.clone());
        let runs = TestRunRepository::new(pool.clone());

        let engine = IsolationEngine::new(handler, templates.clone(), environments.clone());
        let orchestrator = RunOrchestrator::new(runs, tests.clone(), suites, environments, pool.clone());

        Self {
            pool,
            engine,
            orchestrator,
            tests,
            owner: Uuid::now_v7(),
        }
    }

    async fn register_seed_template(&self) -> Template {
        let location = seed_slack_like_template(&self.pool).await.expect("seed fixture");
        let templates = TemplateRepository::new(self.pool.clone());
        templates
            .create(
                "slack",
                "slack-like",
                1,
                None,
                TemplateKind::SchemaDump,
                &location,
                OwnerScope::Public,
                None,
                None,
            )
            .await
            .expect("register template")
    }

    async fn make_test(&self, expected_output: serde_json::Value, template_ref: Uuid) -> Uuid {
        self.tests
            .create("seed scenario", "do the thing", TestType::ActionEval, expected_output, template_ref, None, self.owner)
            .await
            .expect("create test")
            .id
    }
}

#[tokio::test]
async fn insert_detection_passes_end_to_end() {
    let db = setup_test_db().await;
    let harness = Harness::new(db.pool.clone()).await;
    let template = harness.register_seed_template().await;
    let env = harness
        .engine
        .create_environment(&template.location, 3600, harness.owner, None, None)
        .await
        .expect("create environment");

    let spec = json!({
        "version": "0.1",
        "assertions": [{
            "diff_type": "added",
            "entity": "messages",
            "where": { "channel_id": SEED_CHANNEL_ID, "message_text": { "contains": "hello" } },
            "expected_count": 1
        }]
    });
    let test_id = harness.make_test(spec, template.id).await;
    let principal = Principal::User(harness.owner);

    let run = harness
        .orchestrator
        .start_run(env.environment_id, test_id, None, principal)
        .await
        .expect("start run");
    assert_eq!(run.status, RunStatus::Running);

    sqlx::query(&format!(
        "INSERT INTO \"{}\".messages (message_id, channel_id, user_id, message_text) VALUES ($1, $2, $3, 'hello there')",
        env.schema_name
    ))
    .bind("M_NEW0001")
    .bind(SEED_CHANNEL_ID)
    .bind(SEED_USER_ID)
    .execute(&db.pool)
    .await
    .expect("agent insert");

    let ended = harness.orchestrator.end_run(run.id, principal).await.expect("end run");
    assert_eq!(ended.status, RunStatus::Passed);

    let result = ended.result.expect("result present");
    assert_eq!(result["passed"], json!(true));
    assert_eq!(result["score"]["passed"], json!(1));
    assert_eq!(result["score"]["total"], json!(1));
}

#[tokio::test]
async fn update_with_predicate_passes_end_to_end() {
    let db = setup_test_db().await;
    let harness = Harness::new(db.pool.clone()).await;
    let template = harness.register_seed_template().await;
    let env = harness
        .engine
        .create_environment(&template.location, 3600, harness.owner, None, None)
        .await
        .expect("create environment");

    let spec = json!({
        "version": "0.1",
        "assertions": [{
            "diff_type": "changed",
            "entity": "channels",
            "where": { "channel_id": SEED_CHANNEL_ID },
            "expected_changes": { "topic_text": { "to": { "contains": "standup" } } }
        }]
    });
    let test_id = harness.make_test(spec, template.id).await;
    let principal = Principal::User(harness.owner);

    let run = harness
        .orchestrator
        .start_run(env.environment_id, test_id, None, principal)
        .await
        .expect("start run");

    sqlx::query(&format!(
        "UPDATE \"{}\".channels SET topic_text = 'Weekly standup' WHERE channel_id = $1",
        env.schema_name
    ))
    .bind(SEED_CHANNEL_ID)
    .execute(&db.pool)
    .await
    .expect("agent update");

    let ended = harness.orchestrator.end_run(run.id, principal).await.expect("end run");
    assert_eq!(ended.status, RunStatus::Passed);
}

#[tokio::test]
async fn strict_mode_fails_when_an_unexpected_field_also_changed() {
    let db = setup_test_db().await;
    let harness = Harness::new(db.pool.clone()).await;
    let template = harness.register_seed_template().await;
    let env = harness
        .engine
        .create_environment(&template.location, 3600, harness.owner, None, None)
        .await
        .expect("create environment");

    let spec = json!({
        "version": "0.1",
        "strict": true,
        "assertions": [{
            "diff_type": "changed",
            "entity": "channels",
            "where": { "channel_id": SEED_CHANNEL_ID },
            "expected_changes": { "topic_text": { "to": { "contains": "standup" } } }
        }]
    });
    let test_id = harness.make_test(spec, template.id).await;
    let principal = Principal::User(harness.owner);

    let run = harness
        .orchestrator
        .start_run(env.environment_id, test_id, None, principal)
        .await
        .expect("start run");

    sqlx::query(&format!(
        "UPDATE \"{}\".channels SET topic_text = 'Weekly standup', purpose_text = 'side effect' WHERE channel_id = $1",
        env.schema_name
    ))
    .bind(SEED_CHANNEL_ID)
    .execute(&db.pool)
    .await
    .expect("agent update with side effect");

    let ended = harness.orchestrator.end_run(run.id, principal).await.expect("end run");
    assert_eq!(ended.status, RunStatus::Failed);

    let result = ended.result.expect("result present");
    let failures = result["failures"].as_array().expect("failures array");
    assert_eq!(failures.len(), 1);
    assert!(failures[0].as_str().unwrap().contains("purpose_text"));
}

#[tokio::test]
async fn delete_with_count_range_passes_end_to_end() {
    let db = setup_test_db().await;
    let harness = Harness::new(db.pool.clone()).await;
    let template = harness.register_seed_template().await;
    let env = harness
        .engine
        .create_environment(&template.location, 3600, harness.owner, None, None)
        .await
        .expect("create environment");

    let spec = json!({
        "version": "0.1",
        "assertions": [{
            "diff_type": "removed",
            "entity": "messages",
            "where": { "channel_id": SEED_CHANNEL_ID },
            "expected_count": { "min": 1 }
        }]
    });
    let test_id = harness.make_test(spec, template.id).await;
    let principal = Principal::User(harness.owner);

    let run = harness
        .orchestrator
        .start_run(env.environment_id, test_id, None, principal)
        .await
        .expect("start run");

    sqlx::query(&format!("DELETE FROM \"{}\".messages WHERE channel_id = $1", env.schema_name))
        .bind(SEED_CHANNEL_ID)
        .execute(&db.pool)
        .await
        .expect("agent delete");

    let ended = harness.orchestrator.end_run(run.id, principal).await.expect("end run");
    assert_eq!(ended.status, RunStatus::Passed);
}

#[tokio::test]
async fn unchanged_guard_fails_once_a_matching_insert_appears() {
    let db = setup_test_db().await;
    let harness = Harness::new(db.pool.clone()).await;
    let template = harness.register_seed_template().await;
    let env = harness
        .engine
        .create_environment(&template.location, 3600, harness.owner, None, None)
        .await
        .expect("create environment");

    let spec = json!({
        "version": "0.1",
        "assertions": [{
            "diff_type": "unchanged",
            "entity": "messages",
            "where": { "channel_id": SEED_CHANNEL_ID }
        }]
    });
    let test_id = harness.make_test(spec.clone(), template.id).await;
    let principal = Principal::User(harness.owner);

    // No writes between snapshots: unchanged guard passes.
    let run = harness
        .orchestrator
        .start_run(env.environment_id, test_id, None, principal)
        .await
        .expect("start run");
    let ended = harness.orchestrator.end_run(run.id, principal).await.expect("end run");
    assert_eq!(ended.status, RunStatus::Passed);

    // Same guard against a fresh run that does see a matching insert: fails.
    let test_id_2 = harness.make_test(spec, template.id).await;
    let run_2 = harness
        .orchestrator
        .start_run(env.environment_id, test_id_2, None, principal)
        .await
        .expect("start run 2");

    sqlx::query(&format!(
        "INSERT INTO \"{}\".messages (message_id, channel_id, user_id, message_text) VALUES ($1, $2, $3, 'disturbs the guard')",
        env.schema_name
    ))
    .bind("M_DISTURB1")
    .bind(SEED_CHANNEL_ID)
    .bind(SEED_USER_ID)
    .execute(&db.pool)
    .await
    .expect("agent insert");

    let ended_2 = harness.orchestrator.end_run(run_2.id, principal).await.expect("end run 2");
    assert_eq!(ended_2.status, RunStatus::Failed);
}

#[tokio::test]
async fn dropping_the_tenant_schema_before_end_run_yields_an_error_status() {
    let db = setup_test_db().await;
    let harness = Harness::new(db.pool.clone()).await;
    let template = harness.register_seed_template().await;
    let env = harness
        .engine
        .create_environment(&template.location, 3600, harness.owner, None, None)
        .await
        .expect("create environment");

    let spec = json!({
        "version": "0.1",
        "assertions": [{ "diff_type": "unchanged", "entity": "messages" }]
    });
    let test_id = harness.make_test(spec, template.id).await;
    let principal = Principal::User(harness.owner);

    let run = harness
        .orchestrator
        .start_run(env.environment_id, test_id, None, principal)
        .await
        .expect("start run");

    sqlx::query(&format!("DROP SCHEMA \"{}\" CASCADE", env.schema_name))
        .execute(&db.pool)
        .await
        .expect("drop tenant schema out from under the run");

    let ended = harness.orchestrator.end_run(run.id, principal).await.expect("end run still returns a record");

    assert_eq!(ended.status, RunStatus::Error);
    let result = ended.result.expect("result present");
    assert_eq!(result["passed"], json!(false));
    assert_eq!(result["score"], json!({ "passed": 0, "total": 0, "percent": 0.0 }));
    let failures = result["failures"].as_array().expect("failures array");
    assert_eq!(failures.len(), 1, "exactly one line describing the exception");
}

#[tokio::test]
async fn end_run_on_a_terminal_run_is_rejected() {
    let db = setup_test_db().await;
    let harness = Harness::new(db.pool.clone()).await;
    let template = harness.register_seed_template().await;
    let env = harness
        .engine
        .create_environment(&template.location, 3600, harness.owner, None, None)
        .await
        .expect("create environment");

    let spec = json!({
        "version": "0.1",
        "assertions": [{ "diff_type": "unchanged", "entity": "messages" }]
    });
    let test_id = harness.make_test(spec, template.id).await;
    let principal = Principal::User(harness.owner);

    let run = harness
        .orchestrator
        .start_run(env.environment_id, test_id, None, principal)
        .await
        .expect("start run");
    harness.orchestrator.end_run(run.id, principal).await.expect("first end run");

    let second = harness.orchestrator.end_run(run.id, principal).await;
    assert!(second.is_err(), "run_already_ended must be rejected");
}

#[tokio::test]
async fn a_stranger_cannot_end_someone_elses_run() {
    let db = setup_test_db().await;
    let harness = Harness::new(db.pool.clone()).await;
    let template = harness.register_seed_template().await;
    let env = harness
        .engine
        .create_environment(&template.location, 3600, harness.owner, None, None)
        .await
        .expect("create environment");

    let spec = json!({
        "version": "0.1",
        "assertions": [{ "diff_type": "unchanged", "entity": "messages" }]
    });
    let test_id = harness.make_test(spec, template.id).await;
    let owner_principal = Principal::User(harness.owner);
    let stranger = Principal::User(Uuid::now_v7());

    let run = harness
        .orchestrator
        .start_run(env.environment_id, test_id, None, owner_principal)
        .await
        .expect("start run");

    let result = harness.orchestrator.end_run(run.id, stranger).await;
    assert!(result.is_err());
}
