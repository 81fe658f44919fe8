//! Voting ledger
//!
//! Votes are not stored separately: a vote `(item, user)` exists exactly
//! when `user` is in the item's voter list. Priority weight is derived from
//! the voter count alone.

use super::item::QueueItem;
use crate::error::{Error, Result};

/// Priority weight for an item endorsed by `voter_count` users
///
/// Doubles with every additional voter: `2^(voter_count - 1)`, so a second
/// voter outranks any single-voter item regardless of wait time. All
/// weighting policy lives here; capping or linearizing it needs no change
/// in the scheduler. Saturates at `u64::MAX`.
pub fn weight_for_voters(voter_count: usize) -> u64 {
    if voter_count == 0 {
        return 0;
    }
    u32::try_from(voter_count - 1)
        .ok()
        .and_then(|shift| 1u64.checked_shl(shift))
        .unwrap_or(u64::MAX)
}

impl QueueItem {
    /// Derived priority weight
    pub fn weight(&self) -> u64 {
        weight_for_voters(self.voter_count())
    }

    /// True iff `user` has endorsed this item (the submitter counts)
    pub fn has_voted(&self, user: &str) -> bool {
        self.voters().iter().any(|v| v == user)
    }

    /// Record `user`'s endorsement
    ///
    /// Fails with `AlreadyVoted` and leaves the voter list untouched when
    /// the user is already present. Never changes `arrival_time`.
    pub fn add_vote(&mut self, user: &str) -> Result<()> {
        if self.has_voted(user) {
            return Err(Error::AlreadyVoted {
                item_id: self.id(),
                user: user.to_string(),
            });
        }
        self.push_voter(user.to_string());
        Ok(())
    }
}
