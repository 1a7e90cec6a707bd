//! Database setup

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

use crate::Result;

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        email TEXT NOT NULL UNIQUE,
        role TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS contractors (
        id TEXT PRIMARY KEY,
        user_id TEXT REFERENCES users(id),
        company_name TEXT NOT NULL UNIQUE,
        city TEXT NOT NULL,
        rating REAL NOT NULL DEFAULT 0,
        review_count INTEGER NOT NULL DEFAULT 0,
        specialties TEXT NOT NULL DEFAULT '[]',
        verified INTEGER NOT NULL DEFAULT 0
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS requests (
        id TEXT PRIMARY KEY,
        consumer_id TEXT NOT NULL REFERENCES users(id),
        template_ids TEXT NOT NULL,
        scope TEXT NOT NULL DEFAULT '[]',
        created_at INTEGER NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS matches (
        id TEXT PRIMARY KEY,
        consumer_id TEXT NOT NULL REFERENCES users(id),
        contractor_id TEXT NOT NULL REFERENCES contractors(id),
        request_id TEXT NOT NULL REFERENCES requests(id),
        template_id TEXT,
        status TEXT NOT NULL,
        name_revealed INTEGER NOT NULL DEFAULT 0,
        revealed_at INTEGER,
        created_at INTEGER NOT NULL,
        UNIQUE (request_id, contractor_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS messages (
        id TEXT PRIMARY KEY,
        match_id TEXT NOT NULL REFERENCES matches(id),
        content TEXT NOT NULL,
        is_filtered INTEGER NOT NULL DEFAULT 0,
        consumer_id TEXT,
        contractor_id TEXT,
        created_at INTEGER NOT NULL,
        CHECK ((consumer_id IS NULL) <> (contractor_id IS NULL))
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS visits (
        id TEXT PRIMARY KEY,
        match_id TEXT NOT NULL UNIQUE REFERENCES matches(id),
        proposed_slots TEXT NOT NULL,
        scheduled_at INTEGER,
        status TEXT NOT NULL,
        created_at INTEGER NOT NULL,
        updated_at INTEGER NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_matches_request ON matches(request_id, created_at)",
    "CREATE INDEX IF NOT EXISTS idx_matches_consumer ON matches(consumer_id)",
    "CREATE INDEX IF NOT EXISTS idx_messages_match ON messages(match_id, created_at)",
];

/// Main storage interface
#[derive(Clone)]
pub struct Storage {
    pool: SqlitePool,
}

impl Storage {
    /// Open (or create) the database file. `None` uses the platform data
    /// directory.
    pub async fn new(db_path: Option<PathBuf>) -> Result<Self> {
        let path = match db_path {
            Some(path) => path,
            None => Self::default_path()?,
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let options = SqliteConnectOptions::new()
            .filename(&path)
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        info!(path = %path.display(), "database opened");

        let storage = Self { pool };
        storage.init().await?;
        Ok(storage)
    }

    /// Private database that lives as long as this value. One connection,
    /// since every SQLite memory connection is its own database.
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let storage = Self { pool };
        storage.init().await?;
        Ok(storage)
    }

    pub fn default_path() -> Result<PathBuf> {
        let dirs = directories::ProjectDirs::from("nl", "reno", "reno").ok_or_else(|| {
            anyhow::anyhow!("could not determine a data directory for the database")
        })?;
        Ok(dirs.data_dir().join("reno.db"))
    }

    async fn init(&self) -> Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        info!("database schema ready");
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
