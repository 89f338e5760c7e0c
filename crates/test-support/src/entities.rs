#![deny(clippy::all, clippy::pedantic, clippy::nursery, warnings)]

use sqlx::PgPool;
use tenant_bench_core::error::Result;
use uuid::Uuid;

/// Channel id used by every seed fixture and by spec.md §8's seed scenarios.
pub const SEED_CHANNEL_ID: &str = "C01ABCD1234";
/// User id used by every seed fixture and by spec.md §8's seed scenarios.
pub const SEED_USER_ID: &str = "U01AGENBOT9";

/// Creates a fresh schema holding a minimal Slack-like template (`channels`,
/// `users`, `messages`) seeded with one channel, one user, and one message,
/// matching the fixture spec.md §8's seed end-to-end scenarios assume.
/// Returns the schema name, suitable as a `Template.location`.
///
/// # Errors
/// Returns a database error if schema/table creation or the seed insert fails.
pub async fn seed_slack_like_template(pool: &PgPool) -> Result<String> {
    let schema = format!("seed_slack_{}", Uuid::now_v7().simple());

    let mut tx = pool.begin().await?;

    sqlx::query(&format!("CREATE SCHEMA \"{schema}\""))
        .execute(&mut *tx)
        .await?;

    // Every table carries a surrogate `id` primary key: the Differ keys
    // inserts/updates/deletes by that column name regardless of a table's
    // natural key, so the Slack-like identifiers below live in plain unique
    // columns instead.
    sqlx::query(&format!(
        r#"CREATE TABLE "{schema}".channels (
            id uuid PRIMARY KEY DEFAULT gen_random_uuid(),
            channel_id text NOT NULL UNIQUE,
            topic_text text NOT NULL DEFAULT '',
            purpose_text text NOT NULL DEFAULT '',
            created_at timestamptz NOT NULL DEFAULT now()
        )"#
    ))
    .execute(&mut *tx)
    .await?;

    sqlx::query(&format!(
        r#"CREATE TABLE "{schema}".users (
            id uuid PRIMARY KEY DEFAULT gen_random_uuid(),
            user_id text NOT NULL UNIQUE,
            username text NOT NULL,
            created_at timestamptz NOT NULL DEFAULT now()
        )"#
    ))
    .execute(&mut *tx)
    .await?;

    sqlx::query(&format!(
        r#"CREATE TABLE "{schema}".messages (
            id uuid PRIMARY KEY DEFAULT gen_random_uuid(),
            message_id text NOT NULL UNIQUE,
            channel_id text NOT NULL REFERENCES "{schema}".channels (channel_id),
            user_id text NOT NULL REFERENCES "{schema}".users (user_id),
            message_text text NOT NULL,
            created_at timestamptz NOT NULL DEFAULT now()
        )"#
    ))
    .execute(&mut *tx)
    .await?;

    sqlx::query(&format!(
        "INSERT INTO \"{schema}\".channels (channel_id, topic_text, purpose_text) VALUES ($1, '', '')"
    ))
    .bind(SEED_CHANNEL_ID)
    .execute(&mut *tx)
    .await?;

    sqlx::query(&format!("INSERT INTO \"{schema}\".users (user_id, username) VALUES ($1, 'agent-bot')"))
        .bind(SEED_USER_ID)
        .execute(&mut *tx)
        .await?;

    sqlx::query(&format!(
        "INSERT INTO \"{schema}\".messages (message_id, channel_id, user_id, message_text) VALUES ($1, $2, $3, 'seed message')"
    ))
    .bind("M_SEED0001")
    .bind(SEED_CHANNEL_ID)
    .bind(SEED_USER_ID)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(schema)
}
