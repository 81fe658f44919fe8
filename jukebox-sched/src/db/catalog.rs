//! Song catalog lookups
//!
//! Resolves catalog song ids against the `songs` table and validates
//! external stream URLs.

use crate::collaborators::{CatalogResolver, PlayableDescriptor, Target};
use crate::error::{Error, Result};
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use std::time::Duration;
use tracing::debug;
use url::Url;

/// `CatalogResolver` backed by the `songs` table
#[derive(Clone)]
pub struct SqliteCatalog {
    db: SqlitePool,
}

impl SqliteCatalog {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Add a song to the catalog, returning its id
    pub async fn insert_song(
        &self,
        title: &str,
        artist: Option<&str>,
        album: Option<&str>,
        length_secs: Option<f64>,
        path: &str,
    ) -> Result<i64> {
        let id = sqlx::query(
            "INSERT INTO songs (title, artist, album, length, path) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(title)
        .bind(artist)
        .bind(album)
        .bind(length_secs)
        .bind(path)
        .execute(&self.db)
        .await?
        .last_insert_rowid();

        Ok(id)
    }

    async fn resolve_song(&self, song_id: i64) -> Result<PlayableDescriptor> {
        let row = sqlx::query("SELECT title, artist, album, length, path FROM songs WHERE id = ?")
            .bind(song_id)
            .fetch_optional(&self.db)
            .await
            .map_err(|e| Error::ResolutionFailed(format!("song {}: {}", song_id, e)))?
            .ok_or_else(|| Error::ResolutionFailed(format!("song {} not in catalog", song_id)))?;

        let path: String = row.get("path");
        let duration = row
            .get::<Option<f64>, _>("length")
            .filter(|secs| secs.is_finite() && *secs >= 0.0)
            .map(Duration::from_secs_f64);

        Ok(PlayableDescriptor {
            identity: Target::Song(song_id),
            mrl: format!("file://{}", path),
            title: row.get("title"),
            artist: row.get("artist"),
            album: row.get("album"),
            duration,
        })
    }
}

/// Validate and normalize an external stream URL
///
/// Only `http` and `https` URLs with a host are accepted. The identity is
/// the normalized form, so spellings that differ only in host case or an
/// implicit root path share one queue item. The title is the URL itself
/// and the length is unknown.
pub fn resolve_stream(raw: &str) -> Result<PlayableDescriptor> {
    let url = Url::parse(raw.trim())
        .map_err(|e| Error::ResolutionFailed(format!("malformed stream url {}: {}", raw, e)))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(Error::ResolutionFailed(format!("unsupported stream url: {}", raw)));
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(Error::ResolutionFailed(format!("stream url has no host: {}", raw)));
    }

    let normalized = url.as_str().to_string();
    Ok(PlayableDescriptor {
        identity: Target::Stream(normalized.clone()),
        mrl: normalized.clone(),
        title: normalized,
        artist: None,
        album: None,
        duration: None,
    })
}

#[async_trait]
impl CatalogResolver for SqliteCatalog {
    async fn resolve(&self, target: &Target) -> Result<PlayableDescriptor> {
        debug!("Resolving {}", target);
        match target {
            Target::Song(id) => self.resolve_song(*id).await,
            Target::Stream(url) => resolve_stream(url),
        }
    }
}
