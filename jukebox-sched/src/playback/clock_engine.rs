//! Clock-driven playback engine
//!
//! A `PlaybackEngine` that produces no audio: it tracks transport state and
//! position against the loaded media's duration using the tokio clock.
//! Media ends once its duration has elapsed; media of unknown length plays
//! until stopped. Useful for headless deployments and for exercising the
//! monitor under paused test time.

use crate::collaborators::{CompletionProbe, EngineStatus, PlayableDescriptor, PlaybackEngine};
use crate::error::{Error, Result};
use async_trait::async_trait;
use jukebox_common::events::TransportState;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

#[derive(Debug)]
struct ClockState {
    state: TransportState,
    media: Option<PlayableDescriptor>,
    /// Set while playing
    resumed_at: Option<Instant>,
    /// Position accumulated before the last resume
    played: Duration,
    volume: u8,
}

impl ClockState {
    fn position(&self) -> Duration {
        self.played + self.resumed_at.map(|t| t.elapsed()).unwrap_or_default()
    }

    fn duration(&self) -> Option<Duration> {
        self.media.as_ref().and_then(|m| m.duration)
    }

    /// Move to `Ended` once the duration has elapsed
    fn refresh(&mut self) {
        if self.state != TransportState::Playing {
            return;
        }
        if let Some(duration) = self.duration() {
            if self.position() >= duration {
                self.state = TransportState::Ended;
                self.played = duration;
                self.resumed_at = None;
            }
        }
    }
}

/// Virtual transport with a wall-clock position
pub struct ClockEngine {
    inner: RwLock<ClockState>,
}

impl ClockEngine {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(ClockState {
                state: TransportState::Idle,
                media: None,
                resumed_at: None,
                played: Duration::ZERO,
                volume: 100,
            }),
        }
    }
}

impl Default for ClockEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CompletionProbe for ClockEngine {
    async fn has_ended(&self) -> Result<bool> {
        let mut inner = self.inner.write().await;
        inner.refresh();
        Ok(inner.state.is_ended())
    }
}

#[async_trait]
impl PlaybackEngine for ClockEngine {
    async fn play(&self, descriptor: &PlayableDescriptor) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.media = Some(descriptor.clone());
        inner.played = Duration::ZERO;
        inner.resumed_at = Some(Instant::now());
        inner.state = TransportState::Playing;
        Ok(())
    }

    async fn pause(&self) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.refresh();
        match inner.state {
            TransportState::Playing => {
                inner.played = inner.position();
                inner.resumed_at = None;
                inner.state = TransportState::Paused;
            }
            TransportState::Paused => {
                inner.resumed_at = Some(Instant::now());
                inner.state = TransportState::Playing;
            }
            _ => {}
        }
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.played = Duration::ZERO;
        inner.resumed_at = None;
        inner.state = TransportState::Stopped;
        Ok(())
    }

    async fn set_volume(&self, volume: u8) -> Result<()> {
        if volume > 100 {
            return Err(Error::BadRequest(format!("volume {} out of range", volume)));
        }
        self.inner.write().await.volume = volume;
        Ok(())
    }

    async fn get_status(&self) -> Result<EngineStatus> {
        let mut inner = self.inner.write().await;
        inner.refresh();
        let loaded = inner.media.is_some() && inner.state != TransportState::Stopped;

        Ok(EngineStatus {
            state: inner.state,
            media: inner.media.as_ref().map(|m| m.mrl.clone()),
            position_ms: loaded.then(|| inner.position().as_millis() as u64),
            duration_ms: inner.duration().map(|d| d.as_millis() as u64),
            volume: inner.volume,
        })
    }
}
