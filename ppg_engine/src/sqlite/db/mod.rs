//! # SQLite Database methods
//!
//! This module contains "low-level" SQLite database interactions.
//!
//! All these interaction are maintained by simple functions (rather than stateful structs) that accept a
//! `&mut SqliteConnection` argument. Callers can obtain a connection from a pool, or open a transaction and pass
//! `&mut tx` through to the functions to make a sequence of calls atomic.
use std::{env, str::FromStr, time::Duration};

use log::*;
use sqlx::{
    migrate::{MigrateError, Migrator},
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
    Error as SqlxError,
    SqlitePool,
};

pub mod audit;
pub mod intents;
pub mod notifications;
pub mod plans;
pub mod side_effects;
pub mod subscribers;

const SQLITE_DB_URL: &str = "sqlite://data/ppg_store.db";
/// How long a writer waits for the database write lock before giving up. Reconcile transactions on the same reference
/// queue up behind each other on this lock.
const BUSY_TIMEOUT: Duration = Duration::from_secs(10);

pub static MIGRATOR: Migrator = sqlx::migrate!("./src/sqlite/migrations");

pub fn db_url() -> String {
    let result = env::var("PPG_DATABASE_URL").unwrap_or_else(|_| {
        info!("🗃️ PPG_DATABASE_URL is not set. Using the default.");
        SQLITE_DB_URL.to_string()
    });
    info!("🗃️ Using database URL: {result}");
    result
}

pub async fn new_pool(url: &str, max_connections: u32) -> Result<SqlitePool, SqlxError> {
    let options = SqliteConnectOptions::from_str(url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(BUSY_TIMEOUT);
    let pool = SqlitePoolOptions::new().max_connections(max_connections).connect_with(options).await?;
    Ok(pool)
}

pub async fn run_migrations(pool: &SqlitePool) -> Result<(), MigrateError> {
    MIGRATOR.run(pool).await?;
    debug!("🗃️ Database migrations are up to date");
    Ok(())
}
