#![deny(clippy::all, clippy::pedantic, clippy::nursery, warnings)]

pub mod database;
pub mod entities;

pub use database::{
    cleanup_orphaned_test_schemas, clear_test_db, random_string, setup_test_db,
    teardown_test_schema, TestDatabase,
};
pub use entities::{seed_slack_like_template, SEED_CHANNEL_ID, SEED_USER_ID};
