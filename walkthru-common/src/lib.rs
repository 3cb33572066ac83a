//! # Walkthru Common Library
//!
//! Shared code for the walkthru player and its hosts:
//! - Clip, hotspot region and playlist model
//! - Playlist persistence (manifest + stored clip files)
//! - Surface slot identifiers and the two-slot pool
//! - Event types (WalkthruEvent enum) and EventBus
//! - Configuration file and data folder resolution

pub mod config;
pub mod error;
pub mod events;
pub mod playlist;
pub mod slot;
pub mod store;

pub use error::{Error, Result};
pub use playlist::{Clip, Playlist, Region};
pub use slot::{Slot, SlotPair};
