//! Simulated media surface
//!
//! Stands in for a platform video view on hosts without a decoder. Loading
//! checks the locator is a readable file; playback only drives the status
//! stream, with optional latencies to mimic decoder start-up.

use super::{MediaSurface, SurfaceStatus};
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

pub struct SimulatedSurface {
    name: String,
    load_latency: Duration,
    start_latency: Duration,
    status_tx: Arc<watch::Sender<SurfaceStatus>>,
    loaded: Option<String>,
    looping: bool,
    /// Pending "now playing" report after a delayed start
    start_task: Option<JoinHandle<()>>,
}

impl SimulatedSurface {
    pub fn new(name: impl Into<String>) -> Self {
        let (status_tx, _) = watch::channel(SurfaceStatus::default());
        Self {
            name: name.into(),
            load_latency: Duration::ZERO,
            start_latency: Duration::ZERO,
            status_tx: Arc::new(status_tx),
            loaded: None,
            looping: false,
            start_task: None,
        }
    }

    /// Delay applied to every `load`
    pub fn with_load_latency(mut self, latency: Duration) -> Self {
        self.load_latency = latency;
        self
    }

    /// Delay between `play` and the playing status report
    pub fn with_start_latency(mut self, latency: Duration) -> Self {
        self.start_latency = latency;
        self
    }

    pub fn loaded_locator(&self) -> Option<&str> {
        self.loaded.as_deref()
    }

    pub fn is_looping(&self) -> bool {
        self.looping
    }

    fn cancel_start(&mut self) {
        if let Some(task) = self.start_task.take() {
            task.abort();
        }
    }

    fn set_playing(&self, playing: bool) {
        self.status_tx.send_modify(|status| status.is_playing = playing);
    }
}

#[async_trait]
impl MediaSurface for SimulatedSurface {
    async fn load(&mut self, locator: &str) -> Result<()> {
        self.cancel_start();
        if !self.load_latency.is_zero() {
            tokio::time::sleep(self.load_latency).await;
        }

        let metadata = tokio::fs::metadata(locator)
            .await
            .map_err(|e| Error::Surface(format!("{}: cannot open {}: {}", self.name, locator, e)))?;
        if !metadata.is_file() {
            return Err(Error::Surface(format!(
                "{}: {} is not a file",
                self.name, locator
            )));
        }

        self.loaded = Some(locator.to_string());
        self.status_tx.send_replace(SurfaceStatus {
            is_loaded: true,
            is_playing: false,
        });
        debug!("{}: loaded {}", self.name, locator);
        Ok(())
    }

    async fn seek_to_start(&mut self) -> Result<()> {
        if self.loaded.is_none() {
            return Err(Error::Surface(format!("{}: seek with nothing loaded", self.name)));
        }
        trace!("{}: seek to 0", self.name);
        Ok(())
    }

    async fn play(&mut self) -> Result<()> {
        if self.loaded.is_none() {
            return Err(Error::Surface(format!("{}: play with nothing loaded", self.name)));
        }
        if self.status_tx.borrow().is_playing {
            return Ok(());
        }

        self.cancel_start();
        if self.start_latency.is_zero() {
            self.set_playing(true);
        } else {
            let tx = Arc::clone(&self.status_tx);
            let latency = self.start_latency;
            self.start_task = Some(tokio::spawn(async move {
                tokio::time::sleep(latency).await;
                tx.send_modify(|status| status.is_playing = true);
            }));
        }
        debug!("{}: play", self.name);
        Ok(())
    }

    async fn pause(&mut self) -> Result<()> {
        self.cancel_start();
        self.set_playing(false);
        trace!("{}: pause", self.name);
        Ok(())
    }

    async fn stop(&mut self) -> Result<()> {
        self.cancel_start();
        self.set_playing(false);
        debug!("{}: stop", self.name);
        Ok(())
    }

    async fn unload(&mut self) -> Result<()> {
        self.cancel_start();
        self.loaded = None;
        self.status_tx.send_replace(SurfaceStatus::default());
        debug!("{}: unloaded", self.name);
        Ok(())
    }

    async fn set_looping(&mut self, looping: bool) -> Result<()> {
        self.looping = looping;
        Ok(())
    }

    fn status(&self) -> watch::Receiver<SurfaceStatus> {
        self.status_tx.subscribe()
    }
}

impl Drop for SimulatedSurface {
    fn drop(&mut self) {
        self.cancel_start();
    }
}
