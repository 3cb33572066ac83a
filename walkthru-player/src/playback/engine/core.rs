//! Core playback engine - construction and lifecycle
//!
//! **Responsibilities:**
//! - PlaybackEngine struct definition and initialization
//! - Initial slot priming (clip 0 playing, clip 1 primed)
//! - Tap hint auto-hide timer
//! - Shutdown (idempotent, safe while a transition is pending)

use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::playback::preload::{LoadedSurface, PreloadScheduler};
use crate::playback::transition::TransitionController;
use crate::state::SharedState;
use crate::surface::MediaSurface;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use walkthru_common::events::WalkthruEvent;
use walkthru_common::{Playlist, SlotPair};

/// Dual-buffer clip playback engine
///
/// Owns two media surfaces for its whole lifetime. Exactly one is the active
/// (visible) slot; the other holds the next clip primed at position zero.
pub struct PlaybackEngine {
    /// Surfaces, playback state and the commit arbiter
    pub(super) controller: TransitionController,

    /// Shared state (event bus, trigger phase, counters)
    pub(super) state: Arc<SharedState>,

    pub(super) clip_count: usize,

    /// "Tap to continue" overlay visibility
    ///
    /// Cleared exactly once, by the first tap or the auto-hide timer.
    pub(super) tap_hint_visible: Arc<AtomicBool>,

    /// Cancels the fallback timers and the tap hint timer
    pub(super) shutdown_token: CancellationToken,

    pub(super) shut_down: AtomicBool,
}

impl PlaybackEngine {
    /// Create the engine and start playback of clip 0
    ///
    /// Fails with `EmptySequence` for an empty playlist before touching any
    /// surface. A clip that fails to preload is logged and leaves its slot
    /// empty; initialization still succeeds.
    pub async fn initialize(
        playlist: impl Into<Arc<Playlist>>,
        surfaces: SlotPair<Box<dyn MediaSurface>>,
        config: EngineConfig,
        state: Arc<SharedState>,
    ) -> Result<Self> {
        let playlist = playlist.into();
        if playlist.is_empty() {
            warn!("Cannot initialize playback engine: playlist has no clips");
            return Err(Error::EmptySequence);
        }

        let init_start = std::time::Instant::now();
        info!(
            "Initializing playback engine: {} clips, trigger={}, fallback={}ms, loop={}",
            playlist.len(),
            config.advance_trigger,
            config.fallback_timeout.as_millis(),
            config.loop_active
        );

        state.set_trigger_phase(config.advance_trigger).await;

        let shutdown_token = CancellationToken::new();
        let preload = PreloadScheduler::new(
            Arc::clone(&playlist),
            Arc::clone(&state),
            config.loop_active,
        );
        let controller = TransitionController::new(
            Arc::clone(&playlist),
            surfaces.map(|_, surface| LoadedSurface::new(surface)),
            Arc::clone(&state),
            preload,
            config.fallback_timeout,
            shutdown_token.clone(),
        );
        controller.prime_initial().await;

        let engine = Self {
            controller,
            state,
            clip_count: playlist.len(),
            tap_hint_visible: Arc::new(AtomicBool::new(true)),
            shutdown_token,
            shut_down: AtomicBool::new(false),
        };
        if let Some(timeout) = config.tap_hint_timeout {
            engine.spawn_tap_hint_timer(timeout);
        }

        engine.state.broadcast_event(WalkthruEvent::EngineInitialized {
            clip_count: engine.clip_count,
            timestamp: chrono::Utc::now(),
        });
        info!(
            "Playback engine initialized in {:.2}ms",
            init_start.elapsed().as_secs_f64() * 1000.0
        );
        Ok(engine)
    }

    /// Hide the tap hint after `timeout` unless a tap already did
    fn spawn_tap_hint_timer(&self, timeout: Duration) {
        let visible = Arc::clone(&self.tap_hint_visible);
        let state = Arc::clone(&self.state);
        let token = self.shutdown_token.clone();

        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(timeout) => {
                    if visible.swap(false, Ordering::AcqRel) {
                        debug!("Tap hint timed out after {}ms", timeout.as_millis());
                        state.broadcast_event(WalkthruEvent::TapHintDismissed {
                            by_tap: false,
                            timestamp: chrono::Utc::now(),
                        });
                    }
                }
            }
        });
    }

    /// Stop and release both surfaces
    ///
    /// Cancels a pending transition (and its fallback timer) without
    /// committing it. Release failures are logged and swallowed. Calling
    /// this more than once is a no-op.
    pub async fn shutdown(&self) {
        if self.shut_down.swap(true, Ordering::AcqRel) {
            debug!("Playback engine already shut down");
            return;
        }
        info!("Shutting down playback engine");

        self.shutdown_token.cancel();
        self.tap_hint_visible.store(false, Ordering::Release);
        self.controller.shutdown().await;

        self.state.broadcast_event(WalkthruEvent::EngineShutdown {
            timestamp: chrono::Utc::now(),
        });
        info!("Playback engine shut down");
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::Acquire)
    }

    pub fn clip_count(&self) -> usize {
        self.clip_count
    }
}

impl Drop for PlaybackEngine {
    fn drop(&mut self) {
        // Stops background timers only; `shutdown` releases the surfaces
        self.shutdown_token.cancel();
    }
}
