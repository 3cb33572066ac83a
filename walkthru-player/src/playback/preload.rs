//! Preload scheduler
//!
//! Loads clips into slots. Every operation takes the slot's surface by
//! `&mut`, so callers must hold that slot's lock: operations on one slot are
//! serialized, the two slots proceed independently.

use crate::error::{Error, Result};
use crate::state::SharedState;
use crate::surface::MediaSurface;
use std::sync::Arc;
use tracing::{debug, warn};
use walkthru_common::events::WalkthruEvent;
use walkthru_common::{Clip, Playlist, Slot};

/// A surface plus the clip it currently holds
pub struct LoadedSurface {
    surface: Box<dyn MediaSurface>,
    clip_index: Option<usize>,
}

/// Per-slot lock; held for the full duration of any surface operation
pub type SurfaceSlot = tokio::sync::Mutex<LoadedSurface>;

impl LoadedSurface {
    pub fn new(surface: Box<dyn MediaSurface>) -> Self {
        Self {
            surface,
            clip_index: None,
        }
    }

    /// Clip successfully primed into this surface, if any
    pub fn clip_index(&self) -> Option<usize> {
        self.clip_index
    }

    pub fn surface(&self) -> &dyn MediaSurface {
        self.surface.as_ref()
    }

    pub fn surface_mut(&mut self) -> &mut dyn MediaSurface {
        self.surface.as_mut()
    }

    fn holds_media(&self) -> bool {
        self.clip_index.is_some() || self.surface.status().borrow().is_loaded
    }
}

#[derive(Clone)]
pub struct PreloadScheduler {
    playlist: Arc<Playlist>,
    state: Arc<SharedState>,
    loop_active: bool,
}

impl PreloadScheduler {
    pub fn new(playlist: Arc<Playlist>, state: Arc<SharedState>, loop_active: bool) -> Self {
        Self {
            playlist,
            state,
            loop_active,
        }
    }

    /// Load clip `clip_index` into `target`
    ///
    /// - Releases whatever the slot held first.
    /// - `autoplay == false`: primed paused at position zero.
    /// - `autoplay == true`: playing (looping when configured).
    /// - Out-of-range index: slot left released.
    ///
    /// Load failures are logged and reported as `PreloadFailed`; the slot is
    /// left empty. Returns whether the clip is now in the slot.
    pub async fn prime_slot(
        &self,
        slot: Slot,
        target: &mut LoadedSurface,
        clip_index: usize,
        autoplay: bool,
    ) -> bool {
        if target.holds_media() {
            self.release(slot, target).await;
        }

        let Some(clip) = self.playlist.get(clip_index) else {
            debug!("No clip {} to preload; {} slot stays empty", clip_index, slot);
            return false;
        };

        match self.load_clip(target, clip, autoplay).await {
            Ok(()) => {
                target.clip_index = Some(clip_index);
                debug!(
                    "Primed clip {} into {} slot ({})",
                    clip_index,
                    slot,
                    if autoplay { "playing" } else { "paused at 0" }
                );
                true
            }
            Err(e) => {
                let failure = Error::PreloadFailure {
                    clip_index,
                    message: e.to_string(),
                };
                warn!("{} slot: {}", slot, failure);
                // Drop any half-loaded media
                self.release(slot, target).await;
                self.state.broadcast_event(WalkthruEvent::PreloadFailed {
                    clip_index,
                    slot,
                    message: e.to_string(),
                    timestamp: chrono::Utc::now(),
                });
                false
            }
        }
    }

    async fn load_clip(
        &self,
        target: &mut LoadedSurface,
        clip: &Clip,
        autoplay: bool,
    ) -> Result<()> {
        let surface = target.surface_mut();
        surface.load(&clip.locator).await?;
        surface.set_looping(self.loop_active).await?;
        if autoplay {
            surface.play().await?;
        } else {
            // Promoted later: must start exactly at the first frame
            surface.seek_to_start().await?;
            surface.pause().await?;
        }
        Ok(())
    }

    /// Stop and unload a slot; failures are logged and swallowed
    pub async fn release(&self, slot: Slot, target: &mut LoadedSurface) {
        let surface = target.surface_mut();
        if let Err(e) = surface.stop().await {
            warn!("{} slot: stop during release failed: {}", slot, e);
        }
        if let Err(e) = surface.unload().await {
            warn!("{} slot: unload failed: {}", slot, e);
        }
        if let Some(previous) = target.clip_index.take() {
            debug!("Released clip {} from {} slot", previous, slot);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::SimulatedSurface;
    use tempfile::NamedTempFile;

    fn scheduler(locators: &[&str], state: &Arc<SharedState>) -> PreloadScheduler {
        let playlist = Arc::new(Playlist::from_locators(locators.iter().copied()));
        PreloadScheduler::new(playlist, Arc::clone(state), true)
    }

    #[tokio::test]
    async fn test_prime_paused_then_autoplay() {
        let clip = NamedTempFile::new().unwrap();
        let path = clip.path().to_str().unwrap();
        let state = Arc::new(SharedState::new());
        let preload = scheduler(&[path, path], &state);

        let mut slot = LoadedSurface::new(Box::new(SimulatedSurface::new("test")));
        let status = slot.surface().status();

        assert!(preload.prime_slot(Slot::Secondary, &mut slot, 1, false).await);
        assert_eq!(slot.clip_index(), Some(1));
        assert!(status.borrow().is_loaded);
        assert!(!status.borrow().is_playing);

        assert!(preload.prime_slot(Slot::Secondary, &mut slot, 0, true).await);
        assert_eq!(slot.clip_index(), Some(0));
        assert!(status.borrow().is_confirmed_playing());
    }

    #[tokio::test]
    async fn test_failed_load_leaves_slot_empty() {
        let clip = NamedTempFile::new().unwrap();
        let state = Arc::new(SharedState::new());
        let mut events = state.subscribe_events();
        let preload = scheduler(
            &[clip.path().to_str().unwrap(), "/no/such/clip.mov"],
            &state,
        );

        let mut slot = LoadedSurface::new(Box::new(SimulatedSurface::new("test")));
        assert!(preload.prime_slot(Slot::Primary, &mut slot, 0, false).await);

        assert!(!preload.prime_slot(Slot::Primary, &mut slot, 1, false).await);
        assert_eq!(slot.clip_index(), None);
        assert!(!slot.surface().status().borrow().is_loaded);

        match events.recv().await.unwrap() {
            WalkthruEvent::PreloadFailed { clip_index, slot, .. } => {
                assert_eq!(clip_index, 1);
                assert_eq!(slot, Slot::Primary);
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_out_of_range_releases() {
        let clip = NamedTempFile::new().unwrap();
        let state = Arc::new(SharedState::new());
        let preload = scheduler(&[clip.path().to_str().unwrap()], &state);

        let mut slot = LoadedSurface::new(Box::new(SimulatedSurface::new("test")));
        assert!(preload.prime_slot(Slot::Secondary, &mut slot, 0, false).await);
        assert!(!preload.prime_slot(Slot::Secondary, &mut slot, 1, false).await);
        assert_eq!(slot.clip_index(), None);
        assert!(!slot.surface().status().borrow().is_loaded);
    }
}
