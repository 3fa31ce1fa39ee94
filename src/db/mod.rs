// Database module - provides data access layer

use std::str::FromStr;
use std::time::Duration;

use color_eyre::Result;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};
use sqlx::{Sqlite, Transaction};

pub mod models;
pub use models::*;

mod answer;
mod attempt;
mod catalog;
mod draft;
mod explanation;
mod migrations;
mod pending;
mod question;
mod quiz;
mod stats;
mod user;

pub use answer::compute_correctness;
pub(crate) use question::is_importable;
pub use quiz::QuizRuleError;
pub use stats::HistoryFilter;

const BUSY_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone)]
pub struct Db {
    pool: SqlitePool,
}

impl Db {
    /// Connect to a SQLite database (`sqlite://path.db` or `file:path.db`),
    /// creating the file when missing, and apply pending migrations.
    pub async fn new(url: String) -> Result<Self> {
        let url = match url.strip_prefix("file:") {
            Some(path) => format!("sqlite://{path}"),
            None => url,
        };

        let options = SqliteConnectOptions::from_str(&url)?
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(BUSY_TIMEOUT);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let one: i64 = sqlx::query_scalar("SELECT 1").fetch_one(&pool).await?;
        assert_eq!(one, 1);

        migrations::run(&pool).await?;

        tracing::info!("database connection has been verified");

        Ok(Self { pool })
    }

    /// A transaction holding the write lock from its first statement, so a
    /// read followed by a write never fails on lock upgrade.
    async fn begin_write(&self) -> Result<Transaction<'static, Sqlite>> {
        Ok(self.pool.begin_with("BEGIN IMMEDIATE").await?)
    }

    pub async fn migration_applied(&self, version: &str) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM schema_migrations WHERE version = ?)",
        )
        .bind(version)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }
}

/// True when the report wraps a database unique-constraint violation.
pub fn is_unique_violation(err: &color_eyre::Report) -> bool {
    err.downcast_ref::<sqlx::Error>()
        .and_then(|e| e.as_database_error())
        .is_some_and(|e| e.is_unique_violation())
}
