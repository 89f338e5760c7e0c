#![deny(clippy::all, clippy::pedantic, clippy::nursery, warnings)]

use sqlx::postgres::PgPoolOptions;

/// Initialize logger with default level
pub fn init_logger_with_default(default_level: &str) {
    let env = env_logger::Env::new().default_filter_or(default_level);
    env_logger::Builder::from_env(env)
        .format_timestamp(Some(env_logger::fmt::TimestampPrecision::Millis))
        .format_module_path(true)
        .format_target(true)
        .init();
}

/// Initialize `PostgreSQL` connection pool
///
/// # Errors
/// Returns an error if the connection pool cannot be created
pub async fn init_pg_pool(
    connection_string: &str,
    max_connections: u32,
) -> anyhow::Result<sqlx::Pool<sqlx::Postgres>> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(connection_string)
        .await?;
    Ok(pool)
}
