//! Background completion monitor
//!
//! The playback engine cannot notify completion, so this task polls
//! `has_ended()` on a fixed interval and advances the scheduler.
//!
//! An armed flag makes advancement happen once per completion: the monitor
//! disarms as soon as it advances and re-arms only after it has seen the
//! engine report a non-ended state, i.e. after the next item really
//! started. While armed it remembers which item was playing, so a
//! completion that raced with an explicit skip is recognised as stale.

use crate::collaborators::CompletionProbe;
use crate::config::SchedulerConfig;
use crate::queue::ItemId;
use crate::scheduler::{Advance, AdvanceOutcome, QueueScheduler};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArmState {
    /// Waiting to observe the engine in a non-ended state
    ///
    /// `ended_ticks` counts consecutive ended ticks spent on the item
    /// `watching` (or on a stalled queue when `watching` is `None`); it
    /// restarts whenever the playing item changes and stays at zero while
    /// the scheduler is idle.
    Disarmed {
        ended_ticks: u32,
        watching: Option<ItemId>,
    },
    /// Next observed end is a completion of `playing`
    Armed { playing: Option<ItemId> },
}

/// What a single poll did
#[derive(Debug, Clone)]
pub enum PollOutcome {
    /// Engine ended but the monitor is disarmed; nothing to do
    Waiting,
    /// Engine is progressing; monitor is (now) armed
    Armed,
    /// A completion was detected and the scheduler advanced
    Advanced(Advance),
    /// The completion belonged to an item already finalized elsewhere
    Stale,
    /// The engine never started the promoted item within the start grace;
    /// the scheduler was advanced past it
    Recovered(Advance),
    /// `has_ended()` failed or timed out; retried next tick
    ProbeFailed,
    /// The scheduler returned an error while advancing; retried next tick
    AdvanceFailed,
}

/// Polls the engine and drives automatic advancement
pub struct PlaybackMonitor {
    scheduler: Arc<QueueScheduler>,
    probe: Arc<dyn CompletionProbe>,
    poll_interval: Duration,
    probe_timeout: Duration,
    /// Consecutive disarmed+ended ticks tolerated before recovery
    start_grace_ticks: u32,
    arm: ArmState,
}

/// Handle to a running monitor task
pub struct MonitorHandle {
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl MonitorHandle {
    /// Signal shutdown and wait for the loop to exit between ticks
    pub async fn stop(self) {
        self.token.cancel();
        if let Err(e) = self.task.await {
            error!("Playback monitor task failed: {}", e);
        }
    }
}

impl PlaybackMonitor {
    pub fn new(
        config: &SchedulerConfig,
        scheduler: Arc<QueueScheduler>,
        probe: Arc<dyn CompletionProbe>,
    ) -> Self {
        let poll_ms = config.poll_interval_ms.max(1);
        let start_grace_ticks = config.start_grace_ms.div_ceil(poll_ms).max(1);

        Self {
            scheduler,
            probe,
            poll_interval: config.poll_interval(),
            probe_timeout: config.collaborator_timeout(),
            start_grace_ticks: u32::try_from(start_grace_ticks).unwrap_or(u32::MAX),
            arm: ArmState::Disarmed {
                ended_ticks: 0,
                watching: None,
            },
        }
    }

    /// Spawn the polling loop
    pub fn start(self) -> MonitorHandle {
        let token = CancellationToken::new();
        let task = tokio::spawn(self.run(token.clone()));
        MonitorHandle { token, task }
    }

    /// Poll until `token` is cancelled
    pub async fn run(mut self, token: CancellationToken) {
        let mut interval = time::interval(self.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!("Playback monitor started ({:?} interval)", self.poll_interval);

        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = interval.tick() => {
                    self.poll_once().await;
                }
            }
        }

        info!("Playback monitor stopped");
    }

    pub fn is_armed(&self) -> bool {
        matches!(self.arm, ArmState::Armed { .. })
    }

    /// One poll tick; never propagates errors
    pub async fn poll_once(&mut self) -> PollOutcome {
        let ended = match time::timeout(self.probe_timeout, self.probe.has_ended()).await {
            Ok(Ok(ended)) => ended,
            Ok(Err(e)) => {
                warn!("Playback engine status check failed: {}", e);
                return PollOutcome::ProbeFailed;
            }
            Err(_) => {
                warn!("Playback engine status check timed out after {:?}", self.probe_timeout);
                return PollOutcome::ProbeFailed;
            }
        };

        match (self.arm, ended) {
            (_, false) => {
                // Track the playing item on every tick so a skip while armed
                // moves the expectation along with it.
                let playing = self.scheduler.now_playing_id().await;
                if !self.is_armed() {
                    debug!("Engine progressing, monitor armed for {:?}", playing);
                }
                self.arm = ArmState::Armed { playing };
                PollOutcome::Armed
            }
            (ArmState::Armed { playing }, true) => {
                self.arm = ArmState::Disarmed {
                    ended_ticks: 0,
                    watching: None,
                };
                debug!("End of media detected for {:?}", playing);

                match self.scheduler.complete_playing(playing).await {
                    Ok(Some(advance)) => {
                        if let AdvanceOutcome::Promoted(next) = advance.outcome {
                            self.arm = ArmState::Disarmed {
                                ended_ticks: 0,
                                watching: Some(next),
                            };
                        }
                        PollOutcome::Advanced(advance)
                    }
                    Ok(None) => PollOutcome::Stale,
                    Err(e) => {
                        warn!("Automatic advancement failed, retrying next tick: {}", e);
                        self.rearm_for_retry().await;
                        PollOutcome::AdvanceFailed
                    }
                }
            }
            (ArmState::Disarmed { ended_ticks, watching }, true) => {
                let playing = self.scheduler.now_playing_id().await;
                if playing.is_none() && !self.scheduler.is_stalled().await {
                    // Idle and empty: nothing can be late to start
                    self.arm = ArmState::Disarmed {
                        ended_ticks: 0,
                        watching: None,
                    };
                    return PollOutcome::Waiting;
                }

                // The grace period runs from the first tick spent on this item
                let ended_ticks = if playing == watching {
                    ended_ticks.saturating_add(1)
                } else {
                    1
                };
                if ended_ticks < self.start_grace_ticks {
                    self.arm = ArmState::Disarmed {
                        ended_ticks,
                        watching: playing,
                    };
                    return PollOutcome::Waiting;
                }

                self.arm = ArmState::Disarmed {
                    ended_ticks: 0,
                    watching: playing,
                };
                self.recover(playing).await
            }
        }
    }

    /// Advance past an item the engine never reported as started, or
    /// start a pending item after an earlier start failure
    async fn recover(&mut self, playing: Option<ItemId>) -> PollOutcome {
        warn!(
            "Engine still ended after start grace (playing {:?}), advancing",
            playing
        );
        match self.scheduler.complete_playing(playing).await {
            Ok(Some(advance)) => PollOutcome::Recovered(advance),
            Ok(None) => PollOutcome::Stale,
            Err(e) => {
                warn!("Recovery advancement failed, retrying next tick: {}", e);
                self.rearm_for_retry().await;
                PollOutcome::AdvanceFailed
            }
        }
    }

    async fn rearm_for_retry(&mut self) {
        let playing = self.scheduler.now_playing_id().await;
        self.arm = ArmState::Armed { playing };
    }
}
