//! # Walkthru Player Library (walkthru-player)
//!
//! Dual-buffer seamless clip playback engine.
//!
//! **Purpose:** Play an ordered sequence of short clips so that advancing from
//! one clip to the next (by tap, optionally gated by a hotspot) shows no black
//! frame and no decode stall.
//!
//! **Architecture:** Two media surfaces in fixed slots. The standby slot is
//! primed with the upcoming clip while the active one loops; an advance starts
//! the standby, waits for it to report playing (or for a fallback timer), then
//! flips the slots and preloads the clip after that.

pub mod config;
pub mod error;
pub mod host;
pub mod playback;
pub mod state;
pub mod surface;

pub use error::{Error, Result};
pub use playback::PlaybackEngine;
pub use state::SharedState;
