//! Playback engine adapters and the completion monitor

pub mod clock_engine;
pub mod monitor;

pub use clock_engine::ClockEngine;
pub use monitor::{MonitorHandle, PlaybackMonitor, PollOutcome};
