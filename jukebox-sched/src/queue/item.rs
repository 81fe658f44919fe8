//! Queue item model
//!
//! The unit the scheduler orders. An item is pending from creation, playing
//! once promoted, and finalized when it is consumed into a `HistoryRecord`.
//! Finalization takes `self` by value, so a finalized item cannot linger in
//! scheduler state.

use crate::collaborators::{HistoryRecord, PlayableDescriptor, Target};
use chrono::{DateTime, Utc};
use jukebox_common::time;
use uuid::Uuid;

/// Queue item identifier
pub type ItemId = Uuid;

/// Queued media with its submitter, voters and lifecycle timestamps
#[derive(Debug, Clone)]
pub struct QueueItem {
    id: ItemId,
    payload: PlayableDescriptor,
    submitter: String,
    /// Distinct endorsing users, submitter first, in vote order
    voters: Vec<String>,
    arrival_time: DateTime<Utc>,
    /// Admission counter; breaks ties between equal arrival timestamps
    arrival_seq: u64,
    start_time: Option<DateTime<Utc>>,
}

impl QueueItem {
    /// Create a pending item submitted by `submitter`
    ///
    /// `arrival_seq` must increase with every admission so that ordering by
    /// arrival stays total even when two items share a timestamp.
    pub fn new(submitter: &str, payload: PlayableDescriptor, arrival_seq: u64) -> Self {
        Self {
            id: Uuid::new_v4(),
            payload,
            submitter: submitter.to_string(),
            voters: vec![submitter.to_string()],
            arrival_time: time::now(),
            arrival_seq,
            start_time: None,
        }
    }

    pub fn id(&self) -> ItemId {
        self.id
    }

    pub fn payload(&self) -> &PlayableDescriptor {
        &self.payload
    }

    /// Resolved identity used for duplicate detection
    pub fn identity(&self) -> &Target {
        &self.payload.identity
    }

    pub fn title(&self) -> &str {
        &self.payload.title
    }

    pub fn submitter(&self) -> &str {
        &self.submitter
    }

    pub fn voters(&self) -> &[String] {
        &self.voters
    }

    pub fn voter_count(&self) -> usize {
        self.voters.len()
    }

    pub fn arrival_time(&self) -> DateTime<Utc> {
        self.arrival_time
    }

    pub fn arrival_seq(&self) -> u64 {
        self.arrival_seq
    }

    pub fn start_time(&self) -> Option<DateTime<Utc>> {
        self.start_time
    }

    pub fn is_playing(&self) -> bool {
        self.start_time.is_some()
    }

    pub(crate) fn push_voter(&mut self, user: String) {
        self.voters.push(user);
    }

    /// Stamp the promotion time; a second call keeps the first stamp
    pub(crate) fn mark_started(&mut self) -> DateTime<Utc> {
        let arrival = self.arrival_time;
        *self
            .start_time
            .get_or_insert_with(|| time::now_not_before(arrival))
    }

    /// Finalize the item into its history record
    ///
    /// Sets `finish_time = now` (never before `start_time`). An item that was
    /// never started is recorded as starting at its finish time.
    pub(crate) fn finalize(self, skipped: bool, player_name: &str) -> HistoryRecord {
        let start_time = self
            .start_time
            .unwrap_or_else(|| time::now_not_before(self.arrival_time));
        let finish_time = time::now_not_before(start_time);

        HistoryRecord {
            item_id: self.id,
            identity: self.payload.identity,
            title: self.payload.title,
            submitter: self.submitter,
            voters: self.voters,
            arrival_time: self.arrival_time,
            start_time,
            finish_time,
            skipped,
            player_name: player_name.to_string(),
        }
    }
}
