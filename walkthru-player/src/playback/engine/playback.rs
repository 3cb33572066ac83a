//! Tap handling
//!
//! Host touch input → hit test → advance request.

use super::core::PlaybackEngine;
use crate::playback::hit_test::{should_advance, TapPoint, TouchEvent, TriggerPhase, ViewportSize};
use crate::playback::transition::AdvanceOutcome;
use std::sync::atomic::Ordering;
use tracing::{debug, info, trace};
use walkthru_common::events::WalkthruEvent;

/// What the engine did with a tap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapOutcome {
    /// Tap fell outside the current clip's hotspot
    Missed,
    /// Touch event of the phase not configured as the trigger
    WrongPhase,
    /// Engine is shut down
    Inactive,
    /// Tap was eligible and forwarded as an advance request
    Advance(AdvanceOutcome),
}

impl PlaybackEngine {
    /// Handle a tap at `point` within a viewport of `viewport` size
    ///
    /// The first tap hides the tap hint whether or not it hits.
    pub async fn handle_tap(&self, point: TapPoint, viewport: ViewportSize) -> TapOutcome {
        if self.is_shut_down() {
            return TapOutcome::Inactive;
        }
        self.dismiss_tap_hint();

        let hotspot = self.controller.current_hotspot().await;
        if !should_advance(point, viewport, hotspot.as_ref()) {
            debug!(
                "Tap at ({:.1}, {:.1}) missed hotspot {:?}",
                point.x, point.y, hotspot
            );
            return TapOutcome::Missed;
        }

        TapOutcome::Advance(self.controller.request_advance().await)
    }

    /// Handle a raw touch event, sampling only the configured trigger phase
    pub async fn handle_touch(&self, event: TouchEvent, viewport: ViewportSize) -> TapOutcome {
        let trigger = self.state.get_trigger_phase().await;
        if !trigger.accepts(event.phase) {
            trace!("Ignoring {:?} touch (trigger is {})", event.phase, trigger);
            return TapOutcome::WrongPhase;
        }
        self.handle_tap(event.point, viewport).await
    }

    pub async fn trigger_phase(&self) -> TriggerPhase {
        self.state.get_trigger_phase().await
    }

    /// Change which touch phase triggers advances; applies from the next event
    pub async fn set_trigger_phase(&self, phase: TriggerPhase) {
        info!("Advance trigger set to {}", phase);
        self.state.set_trigger_phase(phase).await;
    }

    pub fn is_tap_hint_visible(&self) -> bool {
        self.tap_hint_visible.load(Ordering::Acquire)
    }

    fn dismiss_tap_hint(&self) {
        if self.tap_hint_visible.swap(false, Ordering::AcqRel) {
            debug!("Tap hint dismissed by tap");
            self.state.broadcast_event(WalkthruEvent::TapHintDismissed {
                by_tap: true,
                timestamp: chrono::Utc::now(),
            });
        }
    }
}
