//! Diagnostics
//!
//! Point-in-time engine snapshots and event subscription for hosts.

use super::core::PlaybackEngine;
use crate::playback::state::TransitionPhase;
use serde::Serialize;
use std::sync::atomic::Ordering;
use tokio::sync::broadcast;
use walkthru_common::events::WalkthruEvent;
use walkthru_common::{Slot, SlotPair};

/// Engine status at one instant
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineSnapshot {
    pub current_index: usize,
    pub clip_count: usize,
    pub active_slot: Slot,
    #[serde(skip)]
    pub phase: TransitionPhase,
    /// Whether a transition is awaiting confirmation
    pub pending: bool,
    /// Clip index of the most recent commit
    pub last_committed: Option<usize>,
    /// Clip held by each slot
    pub loaded: SlotPair<Option<usize>>,
    pub tap_hint_visible: bool,
    pub completed: bool,
    pub shut_down: bool,
    /// Transitions forced through by the fallback timer
    pub fallback_commits: u64,
}

impl PlaybackEngine {
    pub async fn snapshot(&self) -> EngineSnapshot {
        let (current_index, active_slot, phase, last_committed, completed) = {
            let playback = self.controller.playback().lock().await;
            (
                playback.current_index(),
                playback.active_slot(),
                playback.phase(),
                playback.last_committed(),
                playback.is_complete(),
            )
        };
        let loaded = self.controller.loaded_clips().await;

        EngineSnapshot {
            current_index,
            clip_count: self.clip_count,
            active_slot,
            phase,
            pending: matches!(phase, TransitionPhase::AwaitingConfirmation { .. }),
            last_committed,
            loaded,
            tap_hint_visible: self.tap_hint_visible.load(Ordering::Acquire),
            completed,
            shut_down: self.is_shut_down(),
            fallback_commits: self.state.get_fallback_commits(),
        }
    }

    /// Subscribe to engine events (commits, completion, preload failures)
    pub fn subscribe_events(&self) -> broadcast::Receiver<WalkthruEvent> {
        self.state.subscribe_events()
    }
}
