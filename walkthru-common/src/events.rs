//! Event types for the walkthru event system
//!
//! Provides the shared event enum and the EventBus hosts subscribe to.

use crate::slot::Slot;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Why a pending transition committed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitReason {
    /// Standby surface reported loaded and playing
    Confirmed,
    /// Fallback timer expired before confirmation
    StallTimeout,
    /// Starting the standby surface failed outright
    StartFailed,
}

impl std::fmt::Display for CommitReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommitReason::Confirmed => write!(f, "confirmed"),
            CommitReason::StallTimeout => write!(f, "stall_timeout"),
            CommitReason::StartFailed => write!(f, "start_failed"),
        }
    }
}

/// Walkthru event types
///
/// Broadcast via EventBus; serializable so hosts can forward them as JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum WalkthruEvent {
    /// Engine accepted a playlist and primed its surfaces
    EngineInitialized {
        clip_count: usize,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// An advance request entered AwaitingConfirmation
    TransitionStarted {
        from_index: usize,
        to_index: usize,
        target_slot: Slot,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// The active slot flipped
    ///
    /// Triggers:
    /// - Host: swap surface visibility
    TransitionCommitted {
        /// Clip now driving the active slot
        clip_index: usize,
        active_slot: Slot,
        reason: CommitReason,
        /// Time from advance request to commit
        latency_ms: u64,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Loading a clip into a slot failed; the slot was left empty
    PreloadFailed {
        clip_index: usize,
        slot: Slot,
        message: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// "Tap to continue" hint hidden
    TapHintDismissed {
        /// false when the hint timed out on its own
        by_tap: bool,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Advance requested from the last clip (fired once per engine)
    PlaybackComplete {
        clip_count: usize,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Both surfaces stopped and released
    EngineShutdown {
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

/// Central event distribution bus
///
/// The EventBus uses tokio::broadcast internally, providing:
/// - Non-blocking publish (slow subscribers don't block producers)
/// - Multiple concurrent subscribers
/// - Lagged message detection for slow subscribers
///
/// # Examples
///
/// ```
/// use walkthru_common::events::{EventBus, WalkthruEvent};
///
/// let event_bus = EventBus::new(100);
/// let mut rx = event_bus.subscribe();
///
/// event_bus.emit_lossy(WalkthruEvent::EngineShutdown {
///     timestamp: chrono::Utc::now(),
/// });
/// assert!(matches!(rx.try_recv(), Ok(WalkthruEvent::EngineShutdown { .. })));
/// ```
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<WalkthruEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus buffering up to `capacity` events per subscriber
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<WalkthruEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: WalkthruEvent,
    ) -> Result<usize, broadcast::error::SendError<WalkthruEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: WalkthruEvent) {
        let _ = self.tx.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
