//! Event types for the jukebox event system
//!
//! Provides shared event definitions and the EventBus.

// Sub-modules (supporting types)
mod playback_types;
mod queue_types;

pub use playback_types::TransportState;
pub use queue_types::QueueChangeTrigger;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Jukebox event types
///
/// Events are broadcast via EventBus and serialize to tagged JSON for any
/// downstream push channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum JukeboxEvent {
    /// A new item entered the pending queue
    ItemEnqueued {
        /// Queue item id
        item_id: Uuid,
        /// Submitting user
        user: String,
        /// Display title of the resolved media
        title: String,
        /// When the item arrived
        timestamp: DateTime<Utc>,
    },

    /// A user endorsed an existing pending item
    VoteCast {
        /// Queue item id
        item_id: Uuid,
        /// Voting user
        user: String,
        /// Voter count after the vote
        voter_count: usize,
        /// Priority weight after the vote
        weight: u64,
        /// When the vote was recorded
        timestamp: DateTime<Utc>,
    },

    /// An item was promoted to now playing
    ItemStarted {
        /// Queue item id
        item_id: Uuid,
        /// Display title
        title: String,
        /// When playback was commanded
        timestamp: DateTime<Utc>,
    },

    /// The playing item was finalized
    ///
    /// Triggers:
    /// - History: durable record (written separately by the scheduler)
    /// - Observers: distinguish skip from natural end
    ItemFinished {
        /// Queue item id
        item_id: Uuid,
        /// True when advancement came from an explicit skip request
        skipped: bool,
        /// When the item was finalized
        timestamp: DateTime<Utc>,
    },

    /// Pending queue changed
    QueueChanged {
        /// Pending item ids in selection order
        queue: Vec<Uuid>,
        /// Why the queue changed
        trigger: QueueChangeTrigger,
        /// When the queue changed
        timestamp: DateTime<Utc>,
    },

    /// Engine transport state changed through a scheduler command
    PlaybackStateChanged {
        /// Transport state after the command
        state: TransportState,
        /// When the state changed
        timestamp: DateTime<Utc>,
    },

    /// Output volume changed (0-100)
    VolumeChanged {
        /// New volume
        volume: u8,
        /// When the volume changed
        timestamp: DateTime<Utc>,
    },
}

impl JukeboxEvent {
    /// Event type name, matching the serialized `type` tag
    pub fn event_type(&self) -> &'static str {
        match self {
            JukeboxEvent::ItemEnqueued { .. } => "ItemEnqueued",
            JukeboxEvent::VoteCast { .. } => "VoteCast",
            JukeboxEvent::ItemStarted { .. } => "ItemStarted",
            JukeboxEvent::ItemFinished { .. } => "ItemFinished",
            JukeboxEvent::QueueChanged { .. } => "QueueChanged",
            JukeboxEvent::PlaybackStateChanged { .. } => "PlaybackStateChanged",
            JukeboxEvent::VolumeChanged { .. } => "VolumeChanged",
        }
    }
}

// ========================================
// EventBus Implementation
// ========================================

/// Central event distribution bus
///
/// The EventBus uses tokio::broadcast internally, providing:
/// - Non-blocking publish (slow subscribers don't block producers)
/// - Multiple concurrent subscribers
/// - Lagged message detection for slow subscribers
///
/// # Examples
///
/// ```
/// use jukebox_common::events::{EventBus, JukeboxEvent, TransportState};
///
/// let event_bus = EventBus::new(100);
/// let mut rx = event_bus.subscribe();
///
/// event_bus.emit_lossy(JukeboxEvent::PlaybackStateChanged {
///     state: TransportState::Paused,
///     timestamp: chrono::Utc::now(),
/// });
///
/// assert!(rx.try_recv().is_ok());
/// ```
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<JukeboxEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<JukeboxEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: JukeboxEvent,
    ) -> Result<usize, broadcast::error::SendError<JukeboxEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: JukeboxEvent) {
        let _ = self.tx.send(event);
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
