//! Database connection and schema creation

use super::{SqliteCatalog, SqliteHistory};
use crate::config::SchedulerConfig;
use crate::error::{Error, Result};
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use tracing::info;

/// Open the catalog and history stores at `config.database_url`
///
/// Both share one pool. A config without a database URL is a
/// configuration error.
pub async fn open_stores(config: &SchedulerConfig) -> Result<(SqliteCatalog, SqliteHistory)> {
    let url = config
        .database_url
        .as_deref()
        .filter(|url| !url.trim().is_empty())
        .ok_or_else(|| Error::Config("database_url is not set".to_string()))?;

    let pool = connect(url).await?;
    Ok((SqliteCatalog::new(pool.clone()), SqliteHistory::new(pool)))
}

/// Open a pool for `database_url` and create missing tables
///
/// `sqlite::memory:` URLs get a single, never-recycled connection so every
/// query sees the same in-memory database.
pub async fn connect(database_url: &str) -> Result<SqlitePool> {
    let in_memory = database_url.contains(":memory:");
    let mut options = SqlitePoolOptions::new().max_connections(if in_memory { 1 } else { 5 });
    if in_memory {
        // Dropping the only connection would drop the database with it
        options = options.idle_timeout(None).max_lifetime(None);
    }
    let pool = options.connect(database_url).await?;

    if !in_memory {
        sqlx::query("PRAGMA journal_mode = WAL").execute(&pool).await?;
    }
    sqlx::query("PRAGMA foreign_keys = ON").execute(&pool).await?;
    sqlx::query("PRAGMA busy_timeout = 5000").execute(&pool).await?;

    init_schema(&pool).await?;
    info!("Opened database: {}", database_url);

    Ok(pool)
}

/// Create the catalog and history tables if needed (idempotent)
pub async fn init_schema(pool: &SqlitePool) -> Result<()> {
    create_songs_table(pool).await?;
    create_play_history_table(pool).await?;
    Ok(())
}

async fn create_songs_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS songs (
            id INTEGER PRIMARY KEY,
            title TEXT NOT NULL,
            artist TEXT,
            album TEXT,
            length REAL,
            path TEXT NOT NULL,
            CHECK (length IS NULL OR length >= 0)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// One row per finished item, natural end or skip
async fn create_play_history_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS play_history (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            item_id TEXT NOT NULL UNIQUE,
            song_id INTEGER REFERENCES songs(id) ON DELETE CASCADE,
            stream_url TEXT,
            title TEXT NOT NULL,
            user TEXT NOT NULL,
            voters TEXT NOT NULL,
            arrival_time TIMESTAMP NOT NULL,
            started_at TIMESTAMP NOT NULL,
            played_at TIMESTAMP NOT NULL,
            skipped INTEGER NOT NULL DEFAULT 0,
            player_name TEXT NOT NULL,
            CHECK (song_id IS NOT NULL OR stream_url IS NOT NULL)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_play_history_song ON play_history(song_id)")
        .execute(pool)
        .await?;

    Ok(())
}
