//! Play history persistence

use crate::collaborators::{HistoryRecord, HistorySink, Target};
use crate::error::{Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use tracing::debug;
use uuid::Uuid;

/// `HistorySink` writing one `play_history` row per finished item
#[derive(Clone)]
pub struct SqliteHistory {
    db: SqlitePool,
}

impl SqliteHistory {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Most recent plays, newest first
    pub async fn recent(&self, limit: u32) -> Result<Vec<HistoryRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT item_id, song_id, stream_url, title, user, voters,
                   arrival_time, started_at, played_at, skipped, player_name
            FROM play_history
            ORDER BY id DESC
            LIMIT ?
            "#,
        )
        .bind(limit as i64)
        .fetch_all(&self.db)
        .await?;

        rows.iter().map(row_to_record).collect()
    }

    /// Number of recorded plays of a catalog song (skips included)
    pub async fn play_count(&self, song_id: i64) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM play_history WHERE song_id = ?")
            .bind(song_id)
            .fetch_one(&self.db)
            .await?;
        Ok(count)
    }

    /// Finish time of the latest play of a catalog song
    pub async fn last_played(&self, song_id: i64) -> Result<Option<DateTime<Utc>>> {
        let played_at: Option<DateTime<Utc>> = sqlx::query_scalar(
            "SELECT played_at FROM play_history WHERE song_id = ? ORDER BY id DESC LIMIT 1",
        )
        .bind(song_id)
        .fetch_optional(&self.db)
        .await?;
        Ok(played_at)
    }
}

fn row_to_record(row: &SqliteRow) -> Result<HistoryRecord> {
    let item_id: String = row.get("item_id");
    let item_id = Uuid::parse_str(&item_id)
        .map_err(|e| Error::HistorySink(format!("bad item id {}: {}", item_id, e)))?;

    let song_id: Option<i64> = row.get("song_id");
    let stream_url: Option<String> = row.get("stream_url");
    let identity = match (song_id, stream_url) {
        (Some(id), _) => Target::Song(id),
        (None, Some(url)) => Target::Stream(url),
        (None, None) => {
            return Err(Error::HistorySink(format!("history row {} has no identity", item_id)))
        }
    };

    let voters: String = row.get("voters");
    let voters: Vec<String> = serde_json::from_str(&voters)
        .map_err(|e| Error::HistorySink(format!("bad voter list for {}: {}", item_id, e)))?;

    Ok(HistoryRecord {
        item_id,
        identity,
        title: row.get("title"),
        submitter: row.get("user"),
        voters,
        arrival_time: row.get("arrival_time"),
        start_time: row.get("started_at"),
        finish_time: row.get("played_at"),
        skipped: row.get("skipped"),
        player_name: row.get("player_name"),
    })
}

#[async_trait]
impl HistorySink for SqliteHistory {
    async fn record(&self, record: HistoryRecord) -> Result<()> {
        let (song_id, stream_url) = match &record.identity {
            Target::Song(id) => (Some(*id), None),
            Target::Stream(url) => (None, Some(url.as_str())),
        };
        let voters = serde_json::to_string(&record.voters)
            .map_err(|e| Error::HistorySink(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO play_history
                (item_id, song_id, stream_url, title, user, voters,
                 arrival_time, started_at, played_at, skipped, player_name)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(record.item_id.to_string())
        .bind(song_id)
        .bind(stream_url)
        .bind(&record.title)
        .bind(&record.submitter)
        .bind(voters)
        .bind(record.arrival_time)
        .bind(record.start_time)
        .bind(record.finish_time)
        .bind(record.skipped)
        .bind(&record.player_name)
        .execute(&self.db)
        .await
        .map_err(|e| Error::HistorySink(format!("insert {}: {}", record.item_id, e)))?;

        debug!("Recorded play of {} ({})", record.identity, record.item_id);
        Ok(())
    }
}
