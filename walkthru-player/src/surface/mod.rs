//! Media surface capability
//!
//! A surface is one platform video view plus its player. The engine holds two
//! of them and never issues overlapping operations on the same one.

mod simulated;

pub use simulated::SimulatedSurface;

use crate::error::Result;
use async_trait::async_trait;
use tokio::sync::watch;

/// Asynchronous status reported by a surface
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SurfaceStatus {
    pub is_loaded: bool,
    pub is_playing: bool,
}

impl SurfaceStatus {
    /// Loaded and decoding frames: safe to make visible
    pub fn is_confirmed_playing(&self) -> bool {
        self.is_loaded && self.is_playing
    }
}

/// Platform playback surface
///
/// All operations may suspend on platform I/O. Status changes (including the
/// "now playing" confirmation after `play`) arrive through `status()`, not
/// through the return value of `play`.
#[async_trait]
pub trait MediaSurface: Send + Sync {
    /// Open a clip; the surface ends up loaded and paused
    async fn load(&mut self, locator: &str) -> Result<()>;

    /// Seek to position zero
    async fn seek_to_start(&mut self) -> Result<()>;

    async fn play(&mut self) -> Result<()>;

    async fn pause(&mut self) -> Result<()>;

    /// Pause and rewind
    async fn stop(&mut self) -> Result<()>;

    /// Release the loaded clip and its decoder
    async fn unload(&mut self) -> Result<()>;

    async fn set_looping(&mut self, looping: bool) -> Result<()>;

    /// Subscribe to status updates
    fn status(&self) -> watch::Receiver<SurfaceStatus>;
}
