//! Playback engine façade
//!
//! **Module Structure:**
//! - `core.rs`: Construction, lifecycle (initialize, shutdown)
//! - `playback.rs`: Tap handling, trigger phase, tap hint
//! - `diagnostics.rs`: Snapshots and event subscription

mod core;
mod diagnostics;
mod playback;

pub use self::core::PlaybackEngine;
pub use diagnostics::EngineSnapshot;
pub use playback::TapOutcome;
