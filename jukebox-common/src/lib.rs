//! # Jukebox Common Library
//!
//! Shared code for the jukebox services including:
//! - Common error type
//! - Configuration file resolution and TOML loading
//! - Event types (JukeboxEvent enum) and the EventBus
//! - Timestamp helpers

pub mod config;
pub mod error;
pub mod events;
pub mod time;

pub use error::{Error, Result};
