//! Playback: hit testing, slot preloading and slot transitions

pub mod engine;
pub mod preload;
pub mod state;
pub mod transition;

pub use engine::{EngineSnapshot, PlaybackEngine, TapOutcome};
pub use hit_test::{should_advance, TapPoint, TouchEvent, TouchPhase, TriggerPhase, ViewportSize};
pub use state::{PlaybackState, TransitionPhase};
pub use transition::AdvanceOutcome;
