//! Queue item model, voting ledger and ordered views

pub mod item;
pub mod view;
pub mod voting;

pub use item::{ItemId, QueueItem};
pub use view::{selection_order, ItemSummary, QueueView};
pub use voting::weight_for_voters;
