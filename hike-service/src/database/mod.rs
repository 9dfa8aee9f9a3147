pub mod constants;
pub mod migrator;
pub mod models;
pub mod operations;
pub mod path;
pub mod sql;

use std::{str::FromStr, time::Duration};

use anyhow::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use tracing::info;

use constants::MAX_CONNECTIONS;
pub use migrator::run_migrations;
use path::{validate_db_path, MEMORY_DB};

/// SQLite-backed hike store
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
    db_path: String,
}

impl Database {
    /// Open (or create) the database at `db_path` and run migrations
    pub async fn connect(db_path: &str) -> Result<Self> {
        info!("Initializing database at {:?}", db_path);
        validate_db_path(db_path)?;

        let pool = if db_path == MEMORY_DB {
            // Every connection to :memory: is a separate database, so pin one
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(SqliteConnectOptions::from_str("sqlite::memory:")?)
                .await?
        } else {
            let options = SqliteConnectOptions::new()
                .filename(db_path)
                .create_if_missing(true)
                .journal_mode(SqliteJournalMode::Wal)
                .busy_timeout(Duration::from_secs(5));
            SqlitePoolOptions::new()
                .max_connections(MAX_CONNECTIONS)
                .connect_with(options)
                .await?
        };

        run_migrations(&pool).await?;
        info!("Database initialized successfully");

        Ok(Self {
            pool,
            db_path: db_path.to_string(),
        })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn db_path(&self) -> &str {
        &self.db_path
    }
}
