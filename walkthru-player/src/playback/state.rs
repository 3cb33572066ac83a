//! Playback state machine
//!
//! Pure bookkeeping for the current clip, the active slot and the (at most
//! one) pending transition. No I/O happens here; the transition controller
//! drives the surfaces and calls into this state under its lock.

use tokio::time::Instant;
use walkthru_common::Slot;

/// Transition awaiting confirmation from the standby slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingTransition {
    pub target_slot: Slot,
    pub target_index: usize,
    /// Fallback timer expiry; armed when play is issued on the target
    pub deadline: Option<Instant>,
    pub requested_at: Instant,
    /// Distinguishes this transition from earlier ones in late signals
    pub generation: u64,
}

/// Transition controller phase
///
/// A commit is the instant `AwaitingConfirmation` resolves (see
/// `CommittedTransition`); the machine is back in `Idle` right after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionPhase {
    /// Ready for the next advance
    Idle,
    AwaitingConfirmation {
        target_slot: Slot,
        target_index: usize,
        /// `None` while the target slot is still busy before play
        deadline: Option<Instant>,
    },
}

/// Outcome of an advance request against the state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvanceDecision {
    /// Enter AwaitingConfirmation for this transition
    Begin(PendingTransition),
    /// A transition is already pending; request dropped
    Busy,
    /// Advance from the last clip: signal playback complete
    Complete,
    /// Playback complete was already signaled
    AlreadyComplete,
    ShutDown,
}

/// Result of a commit: the slots and clip after the flip
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommittedTransition {
    /// Slot that was active before the flip (now standby)
    pub former_slot: Slot,
    pub active_slot: Slot,
    pub clip_index: usize,
    pub requested_at: Instant,
}

#[derive(Debug)]
pub struct PlaybackState {
    clip_count: usize,
    current_index: usize,
    active_slot: Slot,
    pending: Option<PendingTransition>,
    last_commit: Option<usize>,
    completed: bool,
    shut_down: bool,
    next_generation: u64,
}

impl PlaybackState {
    /// Fresh state: clip 0 in the primary slot
    pub fn new(clip_count: usize) -> Self {
        Self {
            clip_count,
            current_index: 0,
            active_slot: Slot::Primary,
            pending: None,
            last_commit: None,
            completed: false,
            shut_down: false,
            next_generation: 0,
        }
    }

    pub fn clip_count(&self) -> usize {
        self.clip_count
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn active_slot(&self) -> Slot {
        self.active_slot
    }

    pub fn standby_slot(&self) -> Slot {
        self.active_slot.other()
    }

    pub fn pending(&self) -> Option<&PendingTransition> {
        self.pending.as_ref()
    }

    pub fn is_complete(&self) -> bool {
        self.completed
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }

    pub fn phase(&self) -> TransitionPhase {
        match &self.pending {
            Some(p) => TransitionPhase::AwaitingConfirmation {
                target_slot: p.target_slot,
                target_index: p.target_index,
                deadline: p.deadline,
            },
            None => TransitionPhase::Idle,
        }
    }

    /// Clip index of the most recent commit
    pub fn last_committed(&self) -> Option<usize> {
        self.last_commit
    }

    /// Decide what an eligible advance request does
    ///
    /// Only `Begin` mutates the state (it records the pending transition);
    /// `Complete` just latches the completion flag so it fires once.
    pub fn request_advance(&mut self, now: Instant) -> AdvanceDecision {
        if self.shut_down {
            return AdvanceDecision::ShutDown;
        }
        if self.pending.is_some() {
            return AdvanceDecision::Busy;
        }

        let target_index = self.current_index + 1;
        if target_index >= self.clip_count {
            if self.completed {
                return AdvanceDecision::AlreadyComplete;
            }
            self.completed = true;
            return AdvanceDecision::Complete;
        }

        let pending = PendingTransition {
            target_slot: self.standby_slot(),
            target_index,
            deadline: None,
            requested_at: now,
            generation: self.next_generation,
        };
        self.next_generation += 1;
        self.pending = Some(pending);
        AdvanceDecision::Begin(pending)
    }

    /// Record the fallback expiry of the pending transition
    ///
    /// Returns false (and changes nothing) when `generation` is no longer
    /// pending.
    pub fn arm_deadline(&mut self, generation: u64, deadline: Instant) -> bool {
        match self.pending.as_mut() {
            Some(p) if p.generation == generation => {
                p.deadline = Some(deadline);
                true
            }
            _ => false,
        }
    }

    /// Whether `generation` is the transition currently pending
    pub fn is_pending(&self, generation: u64) -> bool {
        self.pending.map(|p| p.generation) == Some(generation)
    }

    /// Flip the active slot and advance the index
    ///
    /// Returns `None` (and changes nothing) for a stale or unknown generation.
    pub fn commit(&mut self, generation: u64) -> Option<CommittedTransition> {
        if !self.is_pending(generation) {
            return None;
        }
        let pending = self.pending.take()?;

        let former_slot = self.active_slot;
        self.active_slot = pending.target_slot;
        self.current_index = pending.target_index;
        self.last_commit = Some(pending.target_index);

        Some(CommittedTransition {
            former_slot,
            active_slot: self.active_slot,
            clip_index: self.current_index,
            requested_at: pending.requested_at,
        })
    }

    /// Stop accepting work; returns the transition that was pending, if any
    pub fn shut_down(&mut self) -> Option<PendingTransition> {
        self.shut_down = true;
        self.pending.take()
    }
}
