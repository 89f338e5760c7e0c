#![deny(clippy::all, clippy::pedantic, clippy::nursery, warnings)]

use log::{debug, info, warn};
use sqlx::{postgres::PgPoolOptions, postgres::PgRow, PgPool, Row};
use std::ops::Deref;
use std::time::Duration;
use tenant_bench_core::error::Result;
use uuid::Uuid;

/// Generate a random string for testing
#[must_use]
pub fn random_string(prefix: &str) -> String {
    format!("{}_{}", prefix, Uuid::now_v7())
}

/// Generate a unique schema name for a test.
/// Uses a UUID to ensure uniqueness across parallel tests.
#[must_use]
fn generate_test_schema_name() -> String {
    format!("test_{}", Uuid::now_v7().simple())
}

/// Wrapper around `PgPool` that automatically cleans up the test schema on drop.
///
/// This ensures test schemas are dropped when a test completes, preventing
/// accumulation of schemas that consume `PostgreSQL` shared memory. Deref's to
/// `PgPool`, so it can be used transparently wherever a `PgPool` is expected.
pub struct TestDatabase {
    pub pool: PgPool,
    schema_name: String,
    database_url: String,
}

impl Deref for TestDatabase {
    type Target = PgPool;

    fn deref(&self) -> &Self::Target {
        &self.pool
    }
}

impl AsRef<PgPool> for TestDatabase {
    fn as_ref(&self) -> &PgPool {
        &self.pool
    }
}

impl Clone for TestDatabase {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            schema_name: self.schema_name.clone(),
            database_url: self.database_url.clone(),
        }
    }
}

impl Drop for TestDatabase {
    fn drop(&mut self) {
        let schema_name = self.schema_name.clone();
        let database_url = self.database_url.clone();

        // Spawn a background thread to clean up so we never block an active runtime.
        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(500));

            if let Ok(rt) = tokio::runtime::Runtime::new() {
                let result = rt.block_on(async {
                    tokio::time::timeout(
                        Duration::from_secs(10),
                        teardown_test_schema_internal(&database_url, &schema_name),
                    )
                    .await
                });

                match result {
                    Ok(Ok(())) => debug!("Successfully dropped test schema: {schema_name}"),
                    Ok(Err(e)) => warn!(
                        "Failed to drop test schema {schema_name}: {e}. This may cause shared memory issues."
                    ),
                    Err(_) => warn!(
                        "Timeout dropping test schema {schema_name}. Schema may remain in database."
                    ),
                }
            } else {
                warn!(
                    "Could not create runtime to drop test schema {schema_name}. Schema may remain in database."
                );
            }
        });
    }
}

/// # Errors
/// Returns an error if the database connection or drop operation fails.
async fn teardown_test_schema_internal(database_url: &str, schema_name: &str) -> Result<()> {
    let temp_pool = PgPoolOptions::new()
        .max_connections(1)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await
        .map_err(|e| {
            tenant_bench_core::error::Error::Database(sqlx::Error::Configuration(
                format!("Failed to connect to database for schema cleanup: {e}").into(),
            ))
        })?;

    sqlx::query(&format!("DROP SCHEMA IF EXISTS \"{schema_name}\" CASCADE"))
        .execute(&temp_pool)
        .await
        .map_err(|e| {
            tenant_bench_core::error::Error::Database(sqlx::Error::Configuration(
                format!("Failed to drop test schema {schema_name}: {e}").into(),
            ))
        })?;

    Ok(())
}

/// Manually drop a test schema. Normally schemas are dropped automatically
/// when `TestDatabase` goes out of scope.
///
/// # Panics
/// Panics if `DATABASE_URL` is not set in `.env.test`.
///
/// # Errors
/// Returns an error if the database connection or drop operation fails.
pub async fn teardown_test_schema(schema_name: &str) -> Result<()> {
    dotenvy::from_filename(".env.test").ok();
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL not set in .env.test");

    teardown_test_schema_internal(&database_url, schema_name).await
}

/// Drop every schema matching the `test_*` naming convention. Used to clean
/// up schemas orphaned by a crashed test run.
///
/// # Panics
/// Panics if `DATABASE_URL` is not set in `.env.test`.
///
/// # Errors
/// Returns an error if the database connection or cleanup operation fails.
pub async fn cleanup_orphaned_test_schemas() -> Result<usize> {
    dotenvy::from_filename(".env.test").ok();
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL not set in .env.test");

    let pool = PgPoolOptions::new()
        .max_connections(1)
        .acquire_timeout(Duration::from_secs(10))
        .connect(&database_url)
        .await
        .map_err(|e| {
            tenant_bench_core::error::Error::Database(sqlx::Error::Configuration(
                format!("Failed to connect to database for cleanup: {e}").into(),
            ))
        })?;

    let schemas: Vec<String> = sqlx::query(
        "SELECT schema_name FROM information_schema.schemata
         WHERE schema_name LIKE 'test_%'
         AND schema_name != 'test'",
    )
    .map(|row: PgRow| row.get::<String, _>(0))
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tenant_bench_core::error::Error::Database(sqlx::Error::Configuration(
            format!("Failed to query test schemas: {e}").into(),
        ))
    })?;

    let mut dropped_count = 0;
    for schema_name in &schemas {
        if let Err(e) = teardown_test_schema_internal(&database_url, schema_name).await {
            warn!("Failed to drop orphaned test schema {schema_name}: {e}");
        } else {
            debug!("Dropped orphaned test schema: {schema_name}");
            dropped_count += 1;
        }
    }

    info!("Cleaned up {dropped_count} orphaned test schemas");
    Ok(dropped_count)
}

/// Run meta-store migrations inside the test schema.
///
/// # Errors
/// Returns an error if migration fails.
async fn setup_test_schema(pool: &PgPool, schema_name: &str) -> Result<()> {
    let mut conn = pool.acquire().await?;
    sqlx::query(&format!("SET search_path TO \"{schema_name}\", public"))
        .execute(&mut *conn)
        .await?;
    drop(conn);

    debug!("Running migrations in schema: {schema_name}");

    match sqlx::migrate!("../../migrations").run(pool).await {
        Ok(()) => {
            debug!("Migrations completed successfully in schema: {schema_name}");
            Ok(())
        }
        Err(e) if e.to_string().contains("already exists") => {
            debug!("Some migration objects already exist in schema {schema_name}, continuing");
            Ok(())
        }
        Err(e) => Err(tenant_bench_core::error::Error::Database(sqlx::Error::Configuration(
            format!("Failed to run migrations in schema {schema_name}: {e}").into(),
        ))),
    }
}

/// Set up a test database connection with per-test schema isolation.
///
/// Each test gets its own `PostgreSQL` schema, allowing parallel execution
/// without conflicts. The schema is created and migrated before this
/// returns; the returned `TestDatabase` wrapper drops the schema
/// automatically when it goes out of scope.
///
/// # Panics
/// Panics if `DATABASE_URL` is not set in `.env.test` or if setup fails.
#[must_use]
pub async fn setup_test_db() -> TestDatabase {
    dotenvy::from_filename(".env.test").ok();
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL not set in .env.test");

    let schema_name = generate_test_schema_name();
    debug!("Setting up test database with schema: {schema_name}");

    let temp_pool = PgPoolOptions::new()
        .max_connections(1)
        .acquire_timeout(Duration::from_secs(10))
        .connect(&database_url)
        .await
        .expect("Failed to connect to test database");

    sqlx::query(&format!("CREATE SCHEMA IF NOT EXISTS \"{schema_name}\""))
        .execute(&temp_pool)
        .await
        .expect("Failed to create test schema");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(10))
        .after_connect({
            let schema_name = schema_name.clone();
            move |conn, _meta| {
                let schema_name = schema_name.clone();
                Box::pin(async move {
                    sqlx::query(&format!("SET search_path TO \"{schema_name}\", public"))
                        .execute(conn)
                        .await?;
                    Ok(())
                })
            }
        })
        .connect(&database_url)
        .await
        .expect("Failed to connect to test database");

    if let Err(e) = setup_test_schema(&pool, &schema_name).await {
        panic!("Failed to set up test schema {schema_name}: {e}");
    }

    debug!("Test database setup complete with schema: {schema_name}");

    TestDatabase {
        pool,
        schema_name,
        database_url,
    }
}

/// Truncate every meta-store table in the current search-path schema, except
/// the migrations bookkeeping table.
///
/// # Errors
/// Returns an error if database operations fail.
pub async fn clear_test_db(pool: &PgPool) -> Result<()> {
    info!("Clearing test database data");

    let mut tx = pool.begin().await?;

    sqlx::query("SET session_replication_role = 'replica'")
        .execute(&mut *tx)
        .await?;

    let tables: Vec<String> = sqlx::query(
        "SELECT tablename FROM pg_catalog.pg_tables
         WHERE schemaname = current_schema()
         AND tablename != '_sqlx_migrations'",
    )
    .map(|row: PgRow| row.get::<String, _>(0))
    .fetch_all(&mut *tx)
    .await?;

    if !tables.is_empty() {
        let tables_sql = tables
            .iter()
            .map(|t| format!("\"{t}\""))
            .collect::<Vec<_>>()
            .join(", ");

        let truncate_sql = format!("TRUNCATE TABLE {tables_sql} CASCADE");
        info!("Truncating tables: {truncate_sql}");
        sqlx::query(&truncate_sql).execute(&mut *tx).await?;
    }

    sqlx::query("SET session_replication_role = 'origin'")
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    info!("Test database cleared successfully");
    Ok(())
}
