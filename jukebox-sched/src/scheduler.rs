//! Queue Scheduler
//!
//! Owns the pending items and the single "now playing" slot, applies the
//! vote-weighted selection policy and drives the playback engine.
//!
//! Every public operation runs under one async mutex, so a vote-triggered
//! promotion and a monitor-triggered advancement can never interleave.
//! Collaborator calls are bounded by the configured timeout; catalog
//! resolution happens before the guard is taken because it never touches
//! queue state.

use crate::collaborators::{
    CatalogResolver, EngineStatus, HistoryRecord, HistorySink, PlayableDescriptor, PlaybackEngine,
    Target,
};
use crate::config::SchedulerConfig;
use crate::error::{Error, Result};
use crate::queue::{selection_order, ItemId, ItemSummary, QueueItem, QueueView};
use jukebox_common::events::{EventBus, JukeboxEvent, QueueChangeTrigger};
use jukebox_common::time;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

/// Result of an advancement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "item_id", rename_all = "snake_case")]
pub enum AdvanceOutcome {
    /// A pending item was promoted and is now playing
    Promoted(ItemId),
    /// Nothing left to play; the engine was stopped (normal terminal state)
    NoItemsQueued,
}

/// What `play_next` did
#[derive(Debug, Clone, Serialize)]
pub struct Advance {
    /// Item that was finalized and sent to history, if one was playing
    pub finalized: Option<ItemId>,
    pub outcome: AdvanceOutcome,
    pub view: QueueView,
}

/// Now-playing item together with the engine's view of the transport
#[derive(Debug, Clone, Serialize)]
pub struct NowPlaying {
    pub item: Option<ItemSummary>,
    /// `None` when the engine could not report its status
    pub status: Option<EngineStatus>,
}

/// Trimmed user name; blank names are rejected
fn acting_user(user: &str) -> Result<&str> {
    let user = user.trim();
    if user.is_empty() {
        return Err(Error::BadRequest("user must not be empty".to_string()));
    }
    Ok(user)
}

/// Queue state guarded by the scheduler mutex
#[derive(Default)]
struct QueueState {
    /// Unordered; selection order is computed on demand
    pending: Vec<QueueItem>,
    now_playing: Option<QueueItem>,
    /// Monotonic admission counter
    next_seq: u64,
}

impl QueueState {
    fn view(&self, caller: Option<&str>) -> QueueView {
        QueueView::build(self.now_playing.as_ref(), self.pending.iter(), caller)
    }

    fn position_of(&self, identity: &Target) -> Option<usize> {
        self.pending.iter().position(|item| item.identity() == identity)
    }

    /// Index of the pending item that would be selected next
    fn top_index(&self) -> Option<usize> {
        self.pending
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| selection_order(a, b))
            .map(|(idx, _)| idx)
    }

    fn now_playing_id(&self) -> Option<ItemId> {
        self.now_playing.as_ref().map(QueueItem::id)
    }
}

/// Vote-ordered playback queue
pub struct QueueScheduler {
    state: Mutex<QueueState>,
    resolver: Arc<dyn CatalogResolver>,
    engine: Arc<dyn PlaybackEngine>,
    history: Arc<dyn HistorySink>,
    events: EventBus,
    call_timeout: Duration,
    player_name: String,
}

impl QueueScheduler {
    /// Create a scheduler with injected collaborators
    pub fn new(
        config: &SchedulerConfig,
        resolver: Arc<dyn CatalogResolver>,
        engine: Arc<dyn PlaybackEngine>,
        history: Arc<dyn HistorySink>,
    ) -> Self {
        Self {
            state: Mutex::new(QueueState::default()),
            resolver,
            engine,
            history,
            events: EventBus::new(config.event_capacity),
            call_timeout: config.collaborator_timeout(),
            player_name: config.player_name.clone(),
        }
    }

    /// Event bus carrying queue and playback notifications
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Submit `target` on behalf of `user`, or vote for it if already pending
    ///
    /// Resolution happens first; a resolution failure creates nothing. A
    /// repeat vote by the same user is rejected with `AlreadyVoted` and
    /// leaves the queue unchanged. When nothing is playing the top pending
    /// item is promoted immediately.
    pub async fn vote_song(&self, user: &str, target: Target) -> Result<QueueView> {
        let user = acting_user(user)?;
        info!("User '{}' added/voted for {}", user, target);

        let descriptor = self.resolve(&target).await?;

        let mut state = self.state.lock().await;

        if let Some(idx) = state.position_of(&descriptor.identity) {
            let item = &mut state.pending[idx];
            item.add_vote(user)?;
            debug!(
                "Vote recorded: item={} voters={} weight={}",
                item.id(),
                item.voter_count(),
                item.weight()
            );
            self.events.emit_lossy(JukeboxEvent::VoteCast {
                item_id: item.id(),
                user: user.to_string(),
                voter_count: item.voter_count(),
                weight: item.weight(),
                timestamp: time::now(),
            });
        } else {
            let seq = state.next_seq;
            state.next_seq += 1;
            let item = QueueItem::new(user, descriptor, seq);
            info!("Enqueued '{}' as item {}", item.title(), item.id());
            self.events.emit_lossy(JukeboxEvent::ItemEnqueued {
                item_id: item.id(),
                user: user.to_string(),
                title: item.title().to_string(),
                timestamp: item.arrival_time(),
            });
            state.pending.push(item);
        }

        if state.now_playing.is_none() {
            // The vote itself is already recorded; a failed start leaves the
            // item pending for the next advancement to retry.
            if let Err(e) = self.promote_top(&mut state).await {
                warn!("Failed to start playback after vote: {}", e);
            }
        }

        self.emit_queue_changed(&state, QueueChangeTrigger::UserVote);
        Ok(state.view(Some(user)))
    }

    /// Pending items in selection order, optionally annotated for `user`
    pub async fn get_queue(&self, user: Option<&str>) -> QueueView {
        let state = self.state.lock().await;
        state.view(user)
    }

    /// Administratively discard a pending item (no history record)
    ///
    /// Returns `ItemNotFound` when no pending item has this id; that error
    /// is informational and nothing changed.
    pub async fn remove_song(&self, item_id: ItemId) -> Result<QueueView> {
        let mut state = self.state.lock().await;

        let Some(idx) = state.pending.iter().position(|item| item.id() == item_id) else {
            debug!("Remove requested for absent item {}", item_id);
            return Err(Error::ItemNotFound(item_id));
        };

        let removed = state.pending.remove(idx);
        info!("Removed item {} ('{}') from queue", item_id, removed.title());

        self.emit_queue_changed(&state, QueueChangeTrigger::UserRemove);
        Ok(state.view(None))
    }

    /// Discard every pending item; the playing item is untouched
    pub async fn clear(&self) -> QueueView {
        let mut state = self.state.lock().await;

        let count = state.pending.len();
        state.pending.clear();
        info!("Cleared queue ({} pending items discarded)", count);

        self.emit_queue_changed(&state, QueueChangeTrigger::UserClear);
        state.view(None)
    }

    /// Finalize the playing item and promote the next one
    ///
    /// `skip` only labels the event source: finalization and history are
    /// identical for an explicit skip and a natural end. With no pending
    /// items the engine is stopped and the outcome is `NoItemsQueued`.
    pub async fn play_next(&self, skip: bool) -> Result<Advance> {
        let mut state = self.state.lock().await;
        self.advance_locked(&mut state, skip).await
    }

    /// Natural-completion advancement guarded against stale detections
    ///
    /// Behaves as `play_next(false)` only when the playing item is still
    /// `expected`; otherwise the completion was already handled (for
    /// instance by a concurrent skip) and `Ok(None)` is returned.
    pub async fn complete_playing(&self, expected: Option<ItemId>) -> Result<Option<Advance>> {
        let mut state = self.state.lock().await;

        let current = state.now_playing_id();
        if current != expected {
            debug!(
                "Ignoring stale completion: expected {:?}, now playing {:?}",
                expected, current
            );
            return Ok(None);
        }

        self.advance_locked(&mut state, false).await.map(Some)
    }

    /// Id of the playing item, if any
    pub async fn now_playing_id(&self) -> Option<ItemId> {
        self.state.lock().await.now_playing_id()
    }

    /// True when nothing is playing although items are pending
    ///
    /// Only reachable after the engine refused to start an item.
    pub async fn is_stalled(&self) -> bool {
        let state = self.state.lock().await;
        state.now_playing.is_none() && !state.pending.is_empty()
    }

    /// Playing item summary plus engine status
    ///
    /// An engine that cannot report its status still leaves the item visible.
    pub async fn get_now_playing(&self) -> NowPlaying {
        let state = self.state.lock().await;
        let status = match self.engine_call("get_status", self.engine.get_status()).await {
            Ok(status) => Some(status),
            Err(e) => {
                warn!("Engine status unavailable: {}", e);
                None
            }
        };
        NowPlaying {
            item: state
                .now_playing
                .as_ref()
                .map(|item| ItemSummary::from_item(item, None)),
            status,
        }
    }

    /// Toggle pause/resume of the playing media
    pub async fn pause(&self, user: &str) -> Result<EngineStatus> {
        let user = acting_user(user)?;
        let _state = self.state.lock().await;
        info!("User '{}' paused/resumed playback", user);

        self.engine_call("pause", self.engine.pause()).await?;
        let status = self.engine_call("get_status", self.engine.get_status()).await?;

        self.events.emit_lossy(JukeboxEvent::PlaybackStateChanged {
            state: status.state,
            timestamp: time::now(),
        });
        Ok(status)
    }

    /// Set output volume (0-100)
    pub async fn set_volume(&self, user: &str, volume: u8) -> Result<EngineStatus> {
        let user = acting_user(user)?;
        if volume > 100 {
            return Err(Error::BadRequest(format!(
                "Volume must be between 0 and 100, got {}",
                volume
            )));
        }

        let _state = self.state.lock().await;
        info!("User '{}' changed volume to {}", user, volume);

        self.engine_call("set_volume", self.engine.set_volume(volume)).await?;
        self.events.emit_lossy(JukeboxEvent::VolumeChanged {
            volume,
            timestamp: time::now(),
        });
        self.engine_call("get_status", self.engine.get_status()).await
    }

    // ========================================
    // Internals (caller holds the state guard)
    // ========================================

    async fn advance_locked(&self, state: &mut QueueState, skip: bool) -> Result<Advance> {
        let finalized = state.now_playing.take().map(|item| {
            let item_id = item.id();
            if skip {
                info!("Skipped item {} ('{}')", item_id, item.title());
            } else {
                info!("Item {} ('{}') finished", item_id, item.title());
            }

            let record = item.finalize(skip, &self.player_name);
            self.events.emit_lossy(JukeboxEvent::ItemFinished {
                item_id,
                skipped: skip,
                timestamp: record.finish_time,
            });
            self.record_history(record);
            item_id
        });

        let result = if state.pending.is_empty() {
            info!("No items queued, stopping playback");
            self.engine_call("stop", self.engine.stop())
                .await
                .map(|_| AdvanceOutcome::NoItemsQueued)
        } else {
            self.promote_top(state).await.map(AdvanceOutcome::Promoted)
        };

        self.emit_queue_changed(state, QueueChangeTrigger::Advance);

        let outcome = result?;
        if outcome == AdvanceOutcome::NoItemsQueued {
            self.events.emit_lossy(JukeboxEvent::PlaybackStateChanged {
                state: jukebox_common::events::TransportState::Stopped,
                timestamp: time::now(),
            });
        }

        Ok(Advance {
            finalized,
            outcome,
            view: state.view(None),
        })
    }

    /// Start the highest-priority pending item
    ///
    /// The item leaves `pending` only once the engine accepted it; on
    /// failure it stays pending with no start time.
    async fn promote_top(&self, state: &mut QueueState) -> Result<ItemId> {
        let idx = state
            .top_index()
            .ok_or_else(|| Error::BadRequest("no pending items to promote".to_string()))?;

        self.engine_call("play", self.engine.play(state.pending[idx].payload()))
            .await?;

        let mut item = state.pending.remove(idx);
        let started = item.mark_started();
        let item_id = item.id();
        info!("Now playing item {} ('{}')", item_id, item.title());

        self.events.emit_lossy(JukeboxEvent::ItemStarted {
            item_id,
            title: item.title().to_string(),
            timestamp: started,
        });
        state.now_playing = Some(item);
        Ok(item_id)
    }

    /// Hand a record to the history sink without waiting for it
    ///
    /// A failed or slow write is logged and never delays playback.
    fn record_history(&self, record: HistoryRecord) {
        let history = Arc::clone(&self.history);
        let limit = self.call_timeout;
        tokio::spawn(async move {
            let item_id = record.item_id;
            match tokio::time::timeout(limit, history.record(record)).await {
                Ok(Ok(())) => debug!("History recorded for item {}", item_id),
                Ok(Err(e)) => error!("Failed to record history for item {}: {}", item_id, e),
                Err(_) => error!(
                    "History write for item {} timed out after {:?}",
                    item_id, limit
                ),
            }
        });
    }

    async fn resolve(&self, target: &Target) -> Result<PlayableDescriptor> {
        match tokio::time::timeout(self.call_timeout, self.resolver.resolve(target)).await {
            Ok(Ok(descriptor)) => Ok(descriptor),
            Ok(Err(Error::ResolutionFailed(msg))) => Err(Error::ResolutionFailed(msg)),
            Ok(Err(e)) => Err(Error::ResolutionFailed(format!("{}: {}", target, e))),
            Err(_) => Err(Error::ResolutionFailed(format!(
                "{}: timed out after {:?}",
                target, self.call_timeout
            ))),
        }
    }

    async fn engine_call<T>(
        &self,
        operation: &str,
        call: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        match tokio::time::timeout(self.call_timeout, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(Error::EngineFault(msg))) => Err(Error::EngineFault(msg)),
            Ok(Err(e)) => Err(Error::EngineFault(format!("{} failed: {}", operation, e))),
            Err(_) => Err(Error::EngineFault(format!(
                "{} timed out after {:?}",
                operation, self.call_timeout
            ))),
        }
    }

    fn emit_queue_changed(&self, state: &QueueState, trigger: QueueChangeTrigger) {
        self.events.emit_lossy(JukeboxEvent::QueueChanged {
            queue: state.view(None).pending_ids(),
            trigger,
            timestamp: time::now(),
        });
    }
}
