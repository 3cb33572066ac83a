//! Transition controller
//!
//! Idle → AwaitingConfirmation → Committed. An advance starts the standby
//! slot and then races two completion sources into one `CommitLatch`:
//! - the standby's status stream reporting loaded + playing
//! - the fallback timer (`fallback_timeout` after play is issued on the
//!   standby; time spent waiting for the slot or loading does not count)
//!
//! A failed start resolves the latch directly. Whichever source resolves
//! first commits; every later signal for the same transition is dropped.

use crate::error::{Error, Result};
use crate::playback::preload::{LoadedSurface, PreloadScheduler, SurfaceSlot};
use crate::playback::state::{AdvanceDecision, PendingTransition, PlaybackState};
use crate::state::SharedState;
use crate::surface::SurfaceStatus;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use walkthru_common::events::{CommitReason, WalkthruEvent};
use walkthru_common::{Playlist, Region, Slot, SlotPair};

/// Single-resolution latch for one pending transition
///
/// Resolving also cancels the transition's token, which drops the fallback
/// timer and the confirmation wait.
pub struct CommitLatch {
    generation: u64,
    resolved: AtomicBool,
    cancel: CancellationToken,
}

impl CommitLatch {
    pub fn new(generation: u64, cancel: CancellationToken) -> Self {
        Self {
            generation,
            resolved: AtomicBool::new(false),
            cancel,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// True for exactly one caller
    pub fn try_resolve(&self) -> bool {
        let first = !self.resolved.swap(true, Ordering::AcqRel);
        if first {
            self.cancel.cancel();
        }
        first
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved.load(Ordering::Acquire)
    }

    async fn cancelled(&self) {
        self.cancel.cancelled().await
    }
}

/// What an advance request did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvanceOutcome {
    /// Transition to `target_index` is in flight
    Started { target_index: usize },
    /// Dropped: a transition is already pending
    Busy,
    /// Advanced past the last clip; completion signaled now
    PlaybackComplete,
    /// Completion was signaled earlier; nothing to do
    AlreadyComplete,
    ShutDown,
}

#[derive(Clone)]
pub(crate) struct TransitionController {
    playlist: Arc<Playlist>,
    surfaces: Arc<SlotPair<SurfaceSlot>>,
    playback: Arc<Mutex<PlaybackState>>,
    state: Arc<SharedState>,
    preload: PreloadScheduler,
    fallback_timeout: Duration,
    shutdown: CancellationToken,
}

impl TransitionController {
    pub(crate) fn new(
        playlist: Arc<Playlist>,
        surfaces: SlotPair<LoadedSurface>,
        state: Arc<SharedState>,
        preload: PreloadScheduler,
        fallback_timeout: Duration,
        shutdown: CancellationToken,
    ) -> Self {
        let clip_count = playlist.len();
        Self {
            playlist,
            surfaces: Arc::new(surfaces.map(|_, loaded| Mutex::new(loaded))),
            playback: Arc::new(Mutex::new(PlaybackState::new(clip_count))),
            state,
            preload,
            fallback_timeout,
            shutdown,
        }
    }

    /// Clip 0 playing in the primary slot, clip 1 primed in the secondary
    pub(crate) async fn prime_initial(&self) {
        let primary = async {
            let mut slot = self.surfaces[Slot::Primary].lock().await;
            self.preload.prime_slot(Slot::Primary, &mut slot, 0, true).await
        };
        let secondary = async {
            let mut slot = self.surfaces[Slot::Secondary].lock().await;
            self.preload.prime_slot(Slot::Secondary, &mut slot, 1, false).await
        };
        let (primary_ok, secondary_ok) = tokio::join!(primary, secondary);
        debug!(
            "Initial prime: primary={} secondary={}",
            primary_ok, secondary_ok
        );
    }

    pub(crate) fn playback(&self) -> &Mutex<PlaybackState> {
        &self.playback
    }

    /// Hotspot of the clip currently driving the active slot
    pub(crate) async fn current_hotspot(&self) -> Option<Region> {
        let index = self.playback.lock().await.current_index();
        self.playlist.get(index).and_then(|clip| clip.hotspot)
    }

    /// Clip held by each slot
    pub(crate) async fn loaded_clips(&self) -> SlotPair<Option<usize>> {
        let primary = self.surfaces[Slot::Primary].lock().await.clip_index();
        let secondary = self.surfaces[Slot::Secondary].lock().await.clip_index();
        SlotPair::new(primary, secondary)
    }

    /// Handle an eligible advance request
    pub(crate) async fn request_advance(&self) -> AdvanceOutcome {
        let (decision, from_index) = {
            let mut playback = self.playback.lock().await;
            let decision = playback.request_advance(Instant::now());
            (decision, playback.current_index())
        };

        match decision {
            AdvanceDecision::Begin(pending) => {
                self.begin(pending, from_index).await;
                AdvanceOutcome::Started {
                    target_index: pending.target_index,
                }
            }
            AdvanceDecision::Busy => {
                debug!("Advance ignored: transition to clip {} still pending", from_index + 1);
                AdvanceOutcome::Busy
            }
            AdvanceDecision::Complete => {
                info!("Advance from last clip {}: playback complete", from_index);
                self.state.broadcast_event(WalkthruEvent::PlaybackComplete {
                    clip_count: self.playlist.len(),
                    timestamp: chrono::Utc::now(),
                });
                AdvanceOutcome::PlaybackComplete
            }
            AdvanceDecision::AlreadyComplete => AdvanceOutcome::AlreadyComplete,
            AdvanceDecision::ShutDown => AdvanceOutcome::ShutDown,
        }
    }

    /// Enter AwaitingConfirmation and start the standby slot
    async fn begin(&self, pending: PendingTransition, from_index: usize) {
        info!(
            "Transition {} -> {} via {} slot",
            from_index, pending.target_index, pending.target_slot
        );
        self.state.broadcast_event(WalkthruEvent::TransitionStarted {
            from_index,
            to_index: pending.target_index,
            target_slot: pending.target_slot,
            timestamp: chrono::Utc::now(),
        });

        let latch = Arc::new(CommitLatch::new(
            pending.generation,
            self.shutdown.child_token(),
        ));

        // Blocks while the slot is still being recycled by the previous commit
        let mut target = self.surfaces[pending.target_slot].lock().await;
        let started = self.start_target(&pending, &mut target, &latch).await;
        drop(target);

        if let Err(e) = started {
            warn!("{}; committing without confirmation", e);
            self.resolve(&latch, CommitReason::StartFailed).await;
        }
    }

    /// Seek the primed standby to zero and play it, loading it first if the
    /// preload never landed
    ///
    /// The arbiter is spawned immediately before play, so the fallback window
    /// measures decoder start-up only.
    async fn start_target(
        &self,
        pending: &PendingTransition,
        target: &mut LoadedSurface,
        latch: &Arc<CommitLatch>,
    ) -> Result<()> {
        let start_failure = |message: String| Error::TransitionStartFailure {
            clip_index: pending.target_index,
            message,
        };

        if target.clip_index() != Some(pending.target_index) {
            info!(
                "Clip {} not preloaded in {} slot; loading before play",
                pending.target_index, pending.target_slot
            );
            let primed = self
                .preload
                .prime_slot(pending.target_slot, target, pending.target_index, false)
                .await;
            if !primed {
                return Err(start_failure("clip could not be loaded".to_string()));
            }
        }

        // Subscribe before playing so the playing report cannot be missed
        let status = target.surface().status();
        let deadline = Instant::now() + self.fallback_timeout;
        tokio::spawn(self.clone().arbitrate(Arc::clone(latch), status, deadline));

        let surface = target.surface_mut();
        surface
            .seek_to_start()
            .await
            .map_err(|e| start_failure(e.to_string()))?;
        surface.play().await.map_err(|e| start_failure(e.to_string()))
    }

    /// Race confirmation against the fallback timer
    async fn arbitrate(
        self,
        latch: Arc<CommitLatch>,
        status: watch::Receiver<SurfaceStatus>,
        deadline: Instant,
    ) {
        if !self
            .playback
            .lock()
            .await
            .arm_deadline(latch.generation(), deadline)
        {
            debug!("Transition {} resolved before arming", latch.generation());
            return;
        }

        let reason = tokio::select! {
            biased;
            _ = latch.cancelled() => {
                debug!("Transition {} arbiter stopped", latch.generation());
                return;
            }
            _ = confirmed_playing(status) => CommitReason::Confirmed,
            _ = tokio::time::sleep_until(deadline) => CommitReason::StallTimeout,
        };
        self.resolve(&latch, reason).await;
    }

    async fn resolve(&self, latch: &CommitLatch, reason: CommitReason) {
        if !latch.try_resolve() {
            debug!(
                "Transition {} already resolved; ignoring {}",
                latch.generation(),
                reason
            );
            return;
        }
        self.commit(latch.generation(), reason).await;
    }

    /// Flip slots, then restart the new active slot and recycle the old one
    async fn commit(&self, generation: u64, reason: CommitReason) {
        let (committed, mut former) = {
            let mut playback = self.playback.lock().await;
            if !playback.is_pending(generation) {
                debug!("Transition {} no longer pending; commit skipped", generation);
                return;
            }
            // Take the outgoing slot before the flip is visible so no new
            // transition can touch it until it has been recycled
            let former = self.surfaces[playback.active_slot()].lock().await;
            let Some(committed) = playback.commit(generation) else {
                return;
            };
            (committed, former)
        };

        let latency_ms = committed.requested_at.elapsed().as_millis() as u64;
        match reason {
            CommitReason::Confirmed => info!(
                "Committed clip {} on {} slot after {} ms",
                committed.clip_index, committed.active_slot, latency_ms
            ),
            CommitReason::StallTimeout => {
                warn!(
                    "[FALLBACK] {} slot never confirmed clip {} within {} ms; committing anyway",
                    committed.active_slot,
                    committed.clip_index,
                    self.fallback_timeout.as_millis()
                );
                self.state.increment_fallback_commits();
            }
            CommitReason::StartFailed => warn!(
                "Committed clip {} on {} slot after start failure",
                committed.clip_index, committed.active_slot
            ),
        }
        self.state.broadcast_event(WalkthruEvent::TransitionCommitted {
            clip_index: committed.clip_index,
            active_slot: committed.active_slot,
            reason,
            latency_ms,
            timestamp: chrono::Utc::now(),
        });

        // Re-issue play in case the new slot was paused between confirm and commit
        {
            let mut active = self.surfaces[committed.active_slot].lock().await;
            if let Err(e) = active.surface_mut().play().await {
                warn!("{} slot: play after commit failed: {}", committed.active_slot, e);
            }
        }

        // Priming or releasing stops the former slot first
        let next_index = committed.clip_index + 1;
        if next_index < self.playlist.len() {
            self.preload
                .prime_slot(committed.former_slot, &mut former, next_index, false)
                .await;
        } else {
            debug!(
                "Clip {} is the last; releasing {} slot",
                committed.clip_index, committed.former_slot
            );
            self.preload.release(committed.former_slot, &mut former).await;
        }
    }

    /// Cancel any pending transition and release both slots
    pub(crate) async fn shutdown(&self) {
        self.shutdown.cancel();

        let cancelled = self.playback.lock().await.shut_down();
        if let Some(pending) = cancelled {
            info!(
                "Shutdown cancelled pending transition to clip {}",
                pending.target_index
            );
        }

        for slot in Slot::ALL {
            let mut loaded = self.surfaces[slot].lock().await;
            self.preload.release(slot, &mut loaded).await;
        }
    }
}

/// Resolves once the surface reports loaded and playing
async fn confirmed_playing(mut status: watch::Receiver<SurfaceStatus>) {
    if status
        .wait_for(SurfaceStatus::is_confirmed_playing)
        .await
        .is_err()
    {
        // Status sender gone: only the fallback timer can resolve now
        std::future::pending::<()>().await;
    }
}
