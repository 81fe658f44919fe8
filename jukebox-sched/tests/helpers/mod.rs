//! Test doubles shared by the jukebox-sched integration tests
//!
//! - FakeResolver: in-memory catalog with scriptable failures
//! - FakeEngine: scripted `has_ended()` plus call counters
//! - RecordingHistory: collects history records, optionally failing or slow

#![allow(dead_code)]

use async_trait::async_trait;
use jukebox_common::events::TransportState;
use jukebox_sched::{
    CatalogResolver, CompletionProbe, EngineStatus, Error, HistoryRecord, HistorySink,
    PlayableDescriptor, PlaybackEngine, QueueScheduler, Result, SchedulerConfig, Target,
};
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Install a test log subscriber once (`RUST_LOG` controls verbosity)
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Config with short timeouts suitable for tests
pub fn test_config() -> SchedulerConfig {
    SchedulerConfig {
        poll_interval_ms: 500,
        collaborator_timeout_ms: 200,
        start_grace_ms: 5000,
        player_name: "test-player".to_string(),
        database_url: None,
        event_capacity: 256,
    }
}

pub fn song(id: i64) -> Target {
    Target::Song(id)
}

pub fn stream(url: &str) -> Target {
    Target::Stream(url.to_string())
}

// ========================================
// Resolver
// ========================================

/// Songs with a positive id exist; everything else fails to resolve
pub struct FakeResolver {
    song_length: Duration,
    hang: AtomicBool,
    calls: AtomicUsize,
}

impl FakeResolver {
    pub fn new() -> Self {
        Self::with_song_length(Duration::from_secs(180))
    }

    pub fn with_song_length(song_length: Duration) -> Self {
        Self {
            song_length,
            hang: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        }
    }

    /// Make every call block forever
    pub fn set_hang(&self, hang: bool) {
        self.hang.store(hang, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CatalogResolver for FakeResolver {
    async fn resolve(&self, target: &Target) -> Result<PlayableDescriptor> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.hang.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }

        match target {
            Target::Song(id) if *id > 0 => Ok(PlayableDescriptor {
                identity: target.clone(),
                mrl: format!("file:///music/{}.mp3", id),
                title: format!("Song {}", id),
                artist: Some("Test Artist".to_string()),
                album: None,
                duration: Some(self.song_length),
            }),
            Target::Stream(url) if url.starts_with("http") => Ok(PlayableDescriptor {
                identity: target.clone(),
                mrl: url.clone(),
                title: url.clone(),
                artist: None,
                album: None,
                duration: None,
            }),
            other => Err(Error::ResolutionFailed(format!("unknown {}", other))),
        }
    }
}

// ========================================
// Engine
// ========================================

/// Engine whose completion state is driven by the test
///
/// Starts ended (idle). `play` clears the ended flag unless
/// `set_start_on_play(false)`; `finish()` simulates end of media.
pub struct FakeEngine {
    ended: AtomicBool,
    start_on_play: AtomicBool,
    fail_play: AtomicBool,
    fail_probe: AtomicBool,
    fail_status: AtomicBool,
    hang_play: AtomicBool,
    paused: AtomicBool,
    volume: AtomicU8,
    stops: AtomicUsize,
    played: Mutex<Vec<String>>,
}

impl FakeEngine {
    pub fn new() -> Self {
        Self {
            ended: AtomicBool::new(true),
            start_on_play: AtomicBool::new(true),
            fail_play: AtomicBool::new(false),
            fail_probe: AtomicBool::new(false),
            fail_status: AtomicBool::new(false),
            hang_play: AtomicBool::new(false),
            paused: AtomicBool::new(false),
            volume: AtomicU8::new(100),
            stops: AtomicUsize::new(0),
            played: Mutex::new(Vec::new()),
        }
    }

    /// Media reached its end
    pub fn finish(&self) {
        self.ended.store(true, Ordering::SeqCst);
    }

    pub fn set_ended(&self, ended: bool) {
        self.ended.store(ended, Ordering::SeqCst);
    }

    pub fn set_start_on_play(&self, start: bool) {
        self.start_on_play.store(start, Ordering::SeqCst);
    }

    pub fn set_fail_play(&self, fail: bool) {
        self.fail_play.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_probe(&self, fail: bool) {
        self.fail_probe.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_status(&self, fail: bool) {
        self.fail_status.store(fail, Ordering::SeqCst);
    }

    pub fn set_hang_play(&self, hang: bool) {
        self.hang_play.store(hang, Ordering::SeqCst);
    }

    /// Locators passed to `play`, in call order
    pub fn played(&self) -> Vec<String> {
        self.played.lock().unwrap().clone()
    }

    pub fn play_count(&self) -> usize {
        self.played.lock().unwrap().len()
    }

    pub fn stop_count(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }

    pub fn volume(&self) -> u8 {
        self.volume.load(Ordering::SeqCst)
    }

    fn state(&self) -> TransportState {
        if self.ended.load(Ordering::SeqCst) {
            TransportState::Ended
        } else if self.paused.load(Ordering::SeqCst) {
            TransportState::Paused
        } else {
            TransportState::Playing
        }
    }
}

#[async_trait]
impl CompletionProbe for FakeEngine {
    async fn has_ended(&self) -> Result<bool> {
        if self.fail_probe.load(Ordering::SeqCst) {
            return Err(Error::EngineFault("probe unavailable".to_string()));
        }
        Ok(self.ended.load(Ordering::SeqCst))
    }
}

#[async_trait]
impl PlaybackEngine for FakeEngine {
    async fn play(&self, descriptor: &PlayableDescriptor) -> Result<()> {
        if self.hang_play.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if self.fail_play.load(Ordering::SeqCst) {
            return Err(Error::EngineFault(format!("cannot open {}", descriptor.mrl)));
        }

        self.played.lock().unwrap().push(descriptor.mrl.clone());
        self.paused.store(false, Ordering::SeqCst);
        if self.start_on_play.load(Ordering::SeqCst) {
            self.ended.store(false, Ordering::SeqCst);
        }
        Ok(())
    }

    async fn pause(&self) -> Result<()> {
        self.paused.fetch_xor(true, Ordering::SeqCst);
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        self.stops.fetch_add(1, Ordering::SeqCst);
        self.ended.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn set_volume(&self, volume: u8) -> Result<()> {
        self.volume.store(volume, Ordering::SeqCst);
        Ok(())
    }

    async fn get_status(&self) -> Result<EngineStatus> {
        if self.fail_status.load(Ordering::SeqCst) {
            return Err(Error::EngineFault("status unavailable".to_string()));
        }
        Ok(EngineStatus {
            state: self.state(),
            media: self.played.lock().unwrap().last().cloned(),
            position_ms: None,
            duration_ms: None,
            volume: self.volume(),
        })
    }
}

// ========================================
// History
// ========================================

/// Collects history records; can be told to fail or to stall
pub struct RecordingHistory {
    records: Mutex<Vec<HistoryRecord>>,
    fail: AtomicBool,
    delay: Mutex<Option<Duration>>,
}

impl RecordingHistory {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            fail: AtomicBool::new(false),
            delay: Mutex::new(None),
        }
    }

    pub fn failing() -> Self {
        let history = Self::new();
        history.fail.store(true, Ordering::SeqCst);
        history
    }

    pub fn slow(delay: Duration) -> Self {
        let history = Self::new();
        *history.delay.lock().unwrap() = Some(delay);
        history
    }

    pub fn records(&self) -> Vec<HistoryRecord> {
        self.records.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    /// Yield until `count` records arrived (history writes are spawned)
    pub async fn wait_for(&self, count: usize) -> Vec<HistoryRecord> {
        for _ in 0..200 {
            if self.len() >= count {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        self.records()
    }
}

#[async_trait]
impl HistorySink for RecordingHistory {
    async fn record(&self, record: HistoryRecord) -> Result<()> {
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::HistorySink("disk full".to_string()));
        }
        self.records.lock().unwrap().push(record);
        Ok(())
    }
}

// ========================================
// Wiring
// ========================================

pub struct Harness {
    pub scheduler: Arc<QueueScheduler>,
    pub resolver: Arc<FakeResolver>,
    pub engine: Arc<FakeEngine>,
    pub history: Arc<RecordingHistory>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_history(RecordingHistory::new())
    }

    pub fn with_history(history: RecordingHistory) -> Self {
        init_logging();
        let resolver = Arc::new(FakeResolver::new());
        let engine = Arc::new(FakeEngine::new());
        let history = Arc::new(history);
        let scheduler = Arc::new(QueueScheduler::new(
            &test_config(),
            resolver.clone(),
            engine.clone(),
            history.clone(),
        ));

        Self {
            scheduler,
            resolver,
            engine,
            history,
        }
    }
}
