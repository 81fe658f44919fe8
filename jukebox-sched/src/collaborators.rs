//! Collaborator contracts consumed by the scheduler
//!
//! The scheduler never talks to a catalog, an audio stack or a database
//! directly. It is constructed with implementations of the traits below so
//! that deployments plug in real services and tests plug in fakes.
//!
//! Every method returns `crate::Result`; the scheduler wraps each call in a
//! timeout and maps failures onto `ResolutionFailed` / `EngineFault`.

use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use jukebox_common::events::TransportState;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// What a user asked to hear
///
/// After resolution the descriptor carries the canonical `Target`, which is
/// the identity used to detect "same media already pending".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Target {
    /// Song from the local catalog
    Song(i64),
    /// External stream URL
    Stream(String),
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Target::Song(id) => write!(f, "song {}", id),
            Target::Stream(url) => write!(f, "stream {}", url),
        }
    }
}

/// Playable reference produced by a `CatalogResolver`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayableDescriptor {
    /// Canonical identity of the media
    pub identity: Target,
    /// Locator handed to the engine (`file://...`, `https://...`)
    pub mrl: String,
    /// Display title
    pub title: String,
    pub artist: Option<String>,
    pub album: Option<String>,
    /// Media length; `None` for streams of unknown length
    pub duration: Option<Duration>,
}

/// Point-in-time engine status
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineStatus {
    pub state: TransportState,
    /// Locator of the loaded media, if any
    pub media: Option<String>,
    pub position_ms: Option<u64>,
    pub duration_ms: Option<u64>,
    /// Output volume (0-100)
    pub volume: u8,
}

/// Durable record of a finalized item, handed to the `HistorySink` by value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub item_id: Uuid,
    pub identity: Target,
    pub title: String,
    /// User who first submitted the item
    pub submitter: String,
    /// All endorsing users in vote order (submitter first)
    pub voters: Vec<String>,
    pub arrival_time: DateTime<Utc>,
    pub start_time: DateTime<Utc>,
    pub finish_time: DateTime<Utc>,
    /// True when finalized by an explicit skip
    pub skipped: bool,
    /// Name of the player instance that played the item
    pub player_name: String,
}

/// Turns a song id or stream URL into something the engine can play
#[async_trait]
pub trait CatalogResolver: Send + Sync {
    async fn resolve(&self, target: &Target) -> Result<PlayableDescriptor>;
}

/// Point-in-time completion query
///
/// The engine offers no completion callback, so end-of-media is detected by
/// polling this. Kept separate from `PlaybackEngine` so the monitor depends
/// only on the capability it needs.
#[async_trait]
pub trait CompletionProbe: Send + Sync {
    /// True when no media is progressing (ended, stopped, idle or failed)
    async fn has_ended(&self) -> Result<bool>;
}

/// Transport control consumed by the scheduler
#[async_trait]
pub trait PlaybackEngine: CompletionProbe {
    /// Load and start playing `descriptor`, replacing whatever was loaded
    async fn play(&self, descriptor: &PlayableDescriptor) -> Result<()>;

    /// Toggle pause/resume of the loaded media
    async fn pause(&self) -> Result<()>;

    async fn stop(&self) -> Result<()>;

    async fn set_volume(&self, volume: u8) -> Result<()>;

    async fn get_status(&self) -> Result<EngineStatus>;
}

/// Durable sink for completed plays
#[async_trait]
pub trait HistorySink: Send + Sync {
    async fn record(&self, record: HistoryRecord) -> Result<()>;
}
