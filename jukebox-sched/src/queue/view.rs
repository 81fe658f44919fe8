//! Ordered, read-only queue views
//!
//! Selection policy: descending weight, then ascending arrival time, then
//! ascending admission counter. The last key makes the order total.

use super::item::{ItemId, QueueItem};
use crate::collaborators::Target;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Order in which pending items are selected for play
pub fn selection_order(a: &QueueItem, b: &QueueItem) -> Ordering {
    b.weight()
        .cmp(&a.weight())
        .then_with(|| a.arrival_time().cmp(&b.arrival_time()))
        .then_with(|| a.arrival_seq().cmp(&b.arrival_seq()))
}

/// Per-item summary exposed to callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemSummary {
    pub id: ItemId,
    pub identity: Target,
    pub title: String,
    pub duration_ms: Option<u64>,
    pub submitter: String,
    pub weight: u64,
    pub voter_count: usize,
    pub arrival_time: DateTime<Utc>,
    pub start_time: Option<DateTime<Utc>>,
    /// Whether the requesting user endorsed this item; `None` when the
    /// view was requested anonymously
    pub has_voted_by_caller: Option<bool>,
}

impl ItemSummary {
    pub fn from_item(item: &QueueItem, caller: Option<&str>) -> Self {
        Self {
            id: item.id(),
            identity: item.identity().clone(),
            title: item.title().to_string(),
            duration_ms: item.payload().duration.map(|d| d.as_millis() as u64),
            submitter: item.submitter().to_string(),
            weight: item.weight(),
            voter_count: item.voter_count(),
            arrival_time: item.arrival_time(),
            start_time: item.start_time(),
            has_voted_by_caller: caller.map(|user| item.has_voted(user)),
        }
    }
}

/// Snapshot of the queue: the playing item plus pending items in
/// selection order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueueView {
    pub now_playing: Option<ItemSummary>,
    pub pending: Vec<ItemSummary>,
}

impl QueueView {
    /// Build a view; `pending` need not be sorted
    pub fn build<'a>(
        now_playing: Option<&QueueItem>,
        pending: impl IntoIterator<Item = &'a QueueItem>,
        caller: Option<&str>,
    ) -> Self {
        let mut ordered: Vec<&QueueItem> = pending.into_iter().collect();
        ordered.sort_by(|a, b| selection_order(a, b));

        Self {
            now_playing: now_playing.map(|item| ItemSummary::from_item(item, caller)),
            pending: ordered
                .into_iter()
                .map(|item| ItemSummary::from_item(item, caller))
                .collect(),
        }
    }

    /// Pending item ids in selection order
    pub fn pending_ids(&self) -> Vec<ItemId> {
        self.pending.iter().map(|s| s.id).collect()
    }

    pub fn is_idle(&self) -> bool {
        self.now_playing.is_none()
    }
}
