//! SQLite persistence: song catalog and play history

pub mod catalog;
pub mod history;
pub mod init;

pub use catalog::SqliteCatalog;
pub use history::SqliteHistory;
pub use init::{connect, init_schema, open_stores};
