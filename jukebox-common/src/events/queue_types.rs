//! Queue type definitions
//!
//! Supporting types for queue change notifications.

use serde::{Deserialize, Serialize};

/// Why the queue changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum QueueChangeTrigger {
    /// A user submitted a new item or voted for an existing one
    UserVote,
    /// An administrator removed a pending item
    UserRemove,
    /// An administrator cleared all pending items
    UserClear,
    /// The playing item was finalized and a successor (if any) promoted
    Advance,
}

impl std::fmt::Display for QueueChangeTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueueChangeTrigger::UserVote => write!(f, "UserVote"),
            QueueChangeTrigger::UserRemove => write!(f, "UserRemove"),
            QueueChangeTrigger::UserClear => write!(f, "UserClear"),
            QueueChangeTrigger::Advance => write!(f, "Advance"),
        }
    }
}
