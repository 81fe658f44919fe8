//! # Jukebox Scheduler Library (jukebox-sched)
//!
//! Shared, vote-ordered playback queue with automatic advancement.
//!
//! **Purpose:** Accept submissions and votes from many users, keep the
//! pending items in weight/arrival order, own the single "now playing"
//! slot, and advance automatically when the playback engine reports end of
//! media.
//!
//! **Architecture:** One `QueueScheduler` instance guards all queue state
//! behind a single async mutex; a `PlaybackMonitor` task polls the engine
//! and drives advancement. Catalog resolution, playback and play history are
//! injected collaborators (see [`collaborators`]).

pub mod collaborators;
pub mod config;
pub mod db;
pub mod error;
pub mod playback;
pub mod queue;
pub mod scheduler;

pub use collaborators::{
    CatalogResolver, CompletionProbe, EngineStatus, HistoryRecord, HistorySink, PlayableDescriptor,
    PlaybackEngine, Target,
};
pub use config::SchedulerConfig;
pub use db::{open_stores, SqliteCatalog, SqliteHistory};
pub use error::{Error, Result};
pub use playback::{ClockEngine, MonitorHandle, PlaybackMonitor, PollOutcome};
pub use queue::{ItemId, ItemSummary, QueueItem, QueueView};
pub use scheduler::{Advance, AdvanceOutcome, NowPlaying, QueueScheduler};
