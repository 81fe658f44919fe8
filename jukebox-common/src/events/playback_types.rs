//! Playback-related type definitions
//!
//! Transport state as reported by a playback engine.

use serde::{Deserialize, Serialize};

/// Transport state of a playback engine
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TransportState {
    /// Nothing loaded
    Idle,
    /// Media loaded, playback starting
    Opening,
    /// Audio is being played
    Playing,
    /// Playback suspended, position retained
    Paused,
    /// Explicitly stopped
    Stopped,
    /// Reached end of media
    Ended,
    /// Engine reported a failure for the loaded media
    Error,
}

impl TransportState {
    /// True for every state in which no media is progressing and nothing
    /// will progress without a new `play` command.
    pub fn is_ended(&self) -> bool {
        matches!(
            self,
            TransportState::Idle
                | TransportState::Stopped
                | TransportState::Ended
                | TransportState::Error
        )
    }
}

impl std::fmt::Display for TransportState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportState::Idle => write!(f, "idle"),
            TransportState::Opening => write!(f, "opening"),
            TransportState::Playing => write!(f, "playing"),
            TransportState::Paused => write!(f, "paused"),
            TransportState::Stopped => write!(f, "stopped"),
            TransportState::Ended => write!(f, "ended"),
            TransportState::Error => write!(f, "error"),
        }
    }
}
