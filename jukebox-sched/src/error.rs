//! Error types for jukebox-sched
//!
//! Defines module-specific error types using thiserror for clear error propagation.

use thiserror::Error;
use uuid::Uuid;

/// Main error type for jukebox-sched
#[derive(Error, Debug)]
pub enum Error {
    /// User already endorsed this pending item; state unchanged
    #[error("User '{user}' already voted for item {item_id}")]
    AlreadyVoted { item_id: Uuid, user: String },

    /// Catalog or stream lookup failed; no item created
    #[error("Resolution failed: {0}")]
    ResolutionFailed(String),

    /// Pending item absent (informational)
    #[error("Item not found: {0}")]
    ItemNotFound(Uuid),

    /// Playback engine call failed or timed out
    #[error("Playback engine error: {0}")]
    EngineFault(String),

    /// Play history write failed
    #[error("History sink error: {0}")]
    HistorySink(String),

    /// Configuration loading or validation errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Database connection or query errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Invalid request
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Errors bubbled up from jukebox-common
    #[error(transparent)]
    Common(#[from] jukebox_common::Error),
}

impl Error {
    /// Informational outcomes are reported to the caller for visibility
    /// but do not indicate a failed operation.
    pub fn is_informational(&self) -> bool {
        matches!(self, Error::ItemNotFound(_))
    }
}

/// Convenience Result type using jukebox-sched Error
pub type Result<T> = std::result::Result<T, Error>;
