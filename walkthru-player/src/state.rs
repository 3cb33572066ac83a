//! Shared engine state
//!
//! State shared between the engine, its background tasks and the host:
//! the event bus, the live trigger-phase setting and fallback counters.

use crate::playback::hit_test::TriggerPhase;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{broadcast, RwLock};
use walkthru_common::events::{EventBus, WalkthruEvent};

/// Event bus capacity per subscriber
const EVENT_CAPACITY: usize = 100;

/// Shared state accessible by all components
///
/// Uses RwLock for concurrent read access with rare writes
pub struct SharedState {
    /// Which touch phase samples advance taps (settings collaborator)
    pub trigger_phase: RwLock<TriggerPhase>,

    /// Event broadcaster for hosts
    pub events: EventBus,

    /// Transitions that committed through the fallback timer
    ///
    /// Each one means the standby surface never confirmed playback in time.
    pub fallback_commits_total: AtomicU64,
}

impl SharedState {
    /// Create new shared state with default values
    pub fn new() -> Self {
        Self {
            trigger_phase: RwLock::new(TriggerPhase::default()),
            events: EventBus::new(EVENT_CAPACITY),
            fallback_commits_total: AtomicU64::new(0),
        }
    }

    /// Broadcast an event to all subscribers
    pub fn broadcast_event(&self, event: WalkthruEvent) {
        // No receivers is OK
        self.events.emit_lossy(event);
    }

    /// Subscribe to the event stream
    pub fn subscribe_events(&self) -> broadcast::Receiver<WalkthruEvent> {
        self.events.subscribe()
    }

    pub async fn get_trigger_phase(&self) -> TriggerPhase {
        *self.trigger_phase.read().await
    }

    pub async fn set_trigger_phase(&self, phase: TriggerPhase) {
        *self.trigger_phase.write().await = phase;
    }

    pub fn increment_fallback_commits(&self) {
        self.fallback_commits_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_fallback_commits(&self) -> u64 {
        self.fallback_commits_total.load(Ordering::Relaxed)
    }
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new()
    }
}
