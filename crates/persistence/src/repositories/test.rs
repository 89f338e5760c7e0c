use sqlx::PgPool;
use uuid::Uuid;

use tenant_bench_core::domain::test::{Test, TestMembership, TestSuite, TestType, Visibility};
use tenant_bench_core::error::{Error, Result};

/// Meta-store repository for `Test` rows.
#[derive(Clone)]
pub struct TestRepository {
    pool: PgPool,
}

impl TestRepository {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// # Errors
    /// Returns a database error if the insert fails.
    #[allow(clippy::too_many_arguments)]
    pub async fn create(
        &self,
        name: &str,
        prompt: &str,
        test_type: TestType,
        expected_output: serde_json::Value,
        template_ref: Uuid,
        impersonate_user_id: Option<Uuid>,
        owner: Uuid,
    ) -> Result<Test> {
        let id = Uuid::now_v7();
        sqlx::query_as::<_, Test>(
            r"INSERT INTO tests
                (id, name, prompt, test_type, expected_output, template_ref, impersonate_user_id, owner, created_at)
              VALUES ($1, $2, $3, $4, $5, $6, $7, $8, now())
              RETURNING *",
        )
        .bind(id)
        .bind(name)
        .bind(prompt)
        .bind(test_type)
        .bind(expected_output)
        .bind(template_ref)
        .bind(impersonate_user_id)
        .bind(owner)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)
    }

    /// # Errors
    /// Returns [`Error::NotFound`] if no test has `id`.
    pub async fn get(&self, id: Uuid) -> Result<Test> {
        sqlx::query_as::<_, Test>("SELECT * FROM tests WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?
            .ok_or_else(|| Error::NotFound(format!("test {id} not found")))
    }
}

/// Meta-store repository for `TestSuite` rows and their `TestMembership`
/// join table.
#[derive(Clone)]
pub struct TestSuiteRepository {
    pool: PgPool,
}

impl TestSuiteRepository {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// # Errors
    /// Returns a database error if the insert fails.
    pub async fn create(
        &self,
        name: &str,
        description: Option<&str>,
        owner: Uuid,
        visibility: Visibility,
    ) -> Result<TestSuite> {
        let id = Uuid::now_v7();
        sqlx::query_as::<_, TestSuite>(
            r"INSERT INTO test_suites (id, name, description, owner, visibility, created_at)
              VALUES ($1, $2, $3, $4, $5, now())
              RETURNING *",
        )
        .bind(id)
        .bind(name)
        .bind(description)
        .bind(owner)
        .bind(visibility)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)
    }

    /// # Errors
    /// Returns [`Error::NotFound`] if no suite has `id`.
    pub async fn get(&self, id: Uuid) -> Result<TestSuite> {
        sqlx::query_as::<_, TestSuite>("SELECT * FROM test_suites WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?
            .ok_or_else(|| Error::NotFound(format!("test suite {id} not found")))
    }

    /// # Errors
    /// Returns a database error if the insert fails.
    pub async fn add_member(&self, test_suite_id: Uuid, test_id: Uuid) -> Result<TestMembership> {
        sqlx::query_as::<_, TestMembership>(
            r"INSERT INTO test_memberships (test_suite_id, test_id)
              VALUES ($1, $2)
              ON CONFLICT DO NOTHING
              RETURNING *",
        )
        .bind(test_suite_id)
        .bind(test_id)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)
    }

    /// # Errors
    /// Returns a database error if the query fails.
    pub async fn list_members(&self, test_suite_id: Uuid) -> Result<Vec<Test>> {
        sqlx::query_as::<_, Test>(
            r"SELECT t.* FROM tests t
              JOIN test_memberships m ON m.test_id = t.id
              WHERE m.test_suite_id = $1
              ORDER BY t.created_at",
        )
        .bind(test_suite_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)
    }
}
