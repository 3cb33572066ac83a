//! Test helpers for walkthru-player integration tests
//!
//! Provides reusable test infrastructure components:
//! - ScriptedSurface: MediaSurface spy with scripted failures, stalls and
//!   decoder latencies
//! - SurfaceProbe: test-side handle to inspect and steer a ScriptedSurface
//! - Engine builders and event collection

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use walkthru_common::events::{CommitReason, WalkthruEvent};
use walkthru_common::{Clip, Playlist, Region, Slot, SlotPair};
use walkthru_player::config::EngineConfig;
use walkthru_player::surface::{MediaSurface, SurfaceStatus};
use walkthru_player::{Error, PlaybackEngine, Result, SharedState};

/// Operation issued by the engine against a surface
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceOp {
    Load(String),
    SeekToStart,
    Play,
    Pause,
    Stop,
    Unload,
    SetLooping(bool),
}

/// Scripted surface behavior; adjustable while the engine runs
#[derive(Debug, Clone)]
struct Script {
    /// Locators whose load fails
    failing_loads: HashSet<String>,
    /// Locators whose next load fails, once
    failing_once: HashSet<String>,
    /// Delay inside every `load`
    load_latency: Duration,
    /// Delay between `play` and the playing report
    start_latency: Duration,
    /// `play` returns an error
    fail_play: bool,
    /// `play` reports playing (false simulates a stalled decoder)
    confirm_playing: bool,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            failing_loads: HashSet::new(),
            failing_once: HashSet::new(),
            load_latency: Duration::ZERO,
            start_latency: Duration::ZERO,
            fail_play: false,
            confirm_playing: true,
        }
    }
}

struct Shared {
    ops: Mutex<Vec<SurfaceOp>>,
    script: Mutex<Script>,
    loaded: Mutex<Option<String>>,
    status_tx: watch::Sender<SurfaceStatus>,
}

/// MediaSurface spy
///
/// Records every operation; loads never touch the filesystem.
pub struct ScriptedSurface {
    shared: Arc<Shared>,
    /// Pending playing report after a delayed start
    start_task: Option<JoinHandle<()>>,
}

/// Test-side handle onto a ScriptedSurface
#[derive(Clone)]
pub struct SurfaceProbe {
    shared: Arc<Shared>,
}

impl ScriptedSurface {
    pub fn new() -> (Self, SurfaceProbe) {
        let (status_tx, _) = watch::channel(SurfaceStatus::default());
        let shared = Arc::new(Shared {
            ops: Mutex::new(Vec::new()),
            script: Mutex::new(Script::default()),
            loaded: Mutex::new(None),
            status_tx,
        });
        (
            Self {
                shared: Arc::clone(&shared),
                start_task: None,
            },
            SurfaceProbe { shared },
        )
    }

    fn record(&self, op: SurfaceOp) {
        self.shared.ops.lock().unwrap().push(op);
    }

    fn script(&self) -> Script {
        self.shared.script.lock().unwrap().clone()
    }

    fn cancel_start(&mut self) {
        if let Some(task) = self.start_task.take() {
            task.abort();
        }
    }

    fn set_playing(&self, playing: bool) {
        self.shared
            .status_tx
            .send_modify(|status| status.is_playing = playing);
    }
}

impl Drop for ScriptedSurface {
    fn drop(&mut self) {
        self.cancel_start();
    }
}

#[async_trait]
impl MediaSurface for ScriptedSurface {
    async fn load(&mut self, locator: &str) -> Result<()> {
        self.record(SurfaceOp::Load(locator.to_string()));
        self.cancel_start();
        let script = self.script();
        if !script.load_latency.is_zero() {
            tokio::time::sleep(script.load_latency).await;
        }
        let fail_once = self.shared.script.lock().unwrap().failing_once.remove(locator);
        if fail_once || script.failing_loads.contains(locator) {
            return Err(Error::Surface(format!("scripted load failure: {}", locator)));
        }
        *self.shared.loaded.lock().unwrap() = Some(locator.to_string());
        self.shared.status_tx.send_replace(SurfaceStatus {
            is_loaded: true,
            is_playing: false,
        });
        Ok(())
    }

    async fn seek_to_start(&mut self) -> Result<()> {
        self.record(SurfaceOp::SeekToStart);
        Ok(())
    }

    async fn play(&mut self) -> Result<()> {
        self.record(SurfaceOp::Play);
        let script = self.script();
        if script.fail_play {
            return Err(Error::Surface("scripted play failure".to_string()));
        }
        if self.shared.loaded.lock().unwrap().is_none() {
            return Err(Error::Surface("play with nothing loaded".to_string()));
        }
        let already_playing = self.shared.status_tx.borrow().is_playing;
        if !script.confirm_playing || already_playing {
            return Ok(());
        }

        self.cancel_start();
        if script.start_latency.is_zero() {
            self.set_playing(true);
        } else {
            let shared = Arc::clone(&self.shared);
            self.start_task = Some(tokio::spawn(async move {
                tokio::time::sleep(script.start_latency).await;
                shared.status_tx.send_modify(|status| status.is_playing = true);
            }));
        }
        Ok(())
    }

    async fn pause(&mut self) -> Result<()> {
        self.record(SurfaceOp::Pause);
        self.cancel_start();
        self.set_playing(false);
        Ok(())
    }

    async fn stop(&mut self) -> Result<()> {
        self.record(SurfaceOp::Stop);
        self.cancel_start();
        self.set_playing(false);
        Ok(())
    }

    async fn unload(&mut self) -> Result<()> {
        self.record(SurfaceOp::Unload);
        self.cancel_start();
        *self.shared.loaded.lock().unwrap() = None;
        self.shared.status_tx.send_replace(SurfaceStatus::default());
        Ok(())
    }

    async fn set_looping(&mut self, looping: bool) -> Result<()> {
        self.record(SurfaceOp::SetLooping(looping));
        Ok(())
    }

    fn status(&self) -> watch::Receiver<SurfaceStatus> {
        self.shared.status_tx.subscribe()
    }
}

impl SurfaceProbe {
    pub fn ops(&self) -> Vec<SurfaceOp> {
        self.shared.ops.lock().unwrap().clone()
    }

    pub fn clear_ops(&self) {
        self.shared.ops.lock().unwrap().clear();
    }

    pub fn status(&self) -> SurfaceStatus {
        *self.shared.status_tx.borrow()
    }

    pub fn loaded(&self) -> Option<String> {
        self.shared.loaded.lock().unwrap().clone()
    }

    pub fn fail_load(&self, locator: &str) {
        self.shared
            .script
            .lock()
            .unwrap()
            .failing_loads
            .insert(locator.to_string());
    }

    /// Fail only the next load of `locator`
    pub fn fail_load_once(&self, locator: &str) {
        self.shared
            .script
            .lock()
            .unwrap()
            .failing_once
            .insert(locator.to_string());
    }

    pub fn set_load_latency(&self, latency: Duration) {
        self.shared.script.lock().unwrap().load_latency = latency;
    }

    pub fn set_start_latency(&self, latency: Duration) {
        self.shared.script.lock().unwrap().start_latency = latency;
    }

    pub fn set_fail_play(&self, fail: bool) {
        self.shared.script.lock().unwrap().fail_play = fail;
    }

    /// false: `play` succeeds but the surface never reports playing
    pub fn set_confirm_playing(&self, confirm: bool) {
        self.shared.script.lock().unwrap().confirm_playing = confirm;
    }

    /// Report playing now, as a late decoder would
    pub fn force_playing(&self) {
        self.shared
            .status_tx
            .send_modify(|status| status.is_playing = true);
    }
}

/// Two scripted surfaces plus their probes
pub fn scripted_surfaces() -> (SlotPair<Box<dyn MediaSurface>>, SlotPair<SurfaceProbe>) {
    let (primary, primary_probe) = ScriptedSurface::new();
    let (secondary, secondary_probe) = ScriptedSurface::new();
    (
        SlotPair::new(
            Box::new(primary) as Box<dyn MediaSurface>,
            Box::new(secondary) as Box<dyn MediaSurface>,
        ),
        SlotPair::new(primary_probe, secondary_probe),
    )
}

/// Locator used for clip `index` in generated playlists
pub fn clip_locator(index: usize) -> String {
    format!("clip{}.mov", index)
}

/// Playlist of `count` clips without hotspots
pub fn playlist(count: usize) -> Playlist {
    Playlist::from_locators((0..count).map(clip_locator))
}

/// Playlist whose clips all carry `hotspot`
pub fn playlist_with_hotspot(count: usize, hotspot: Region) -> Playlist {
    Playlist::new(
        (0..count)
            .map(|i| Clip::new(clip_locator(i)).with_hotspot(hotspot))
            .collect(),
    )
}

/// Engine defaults with the tap hint timer disabled
pub fn test_config() -> EngineConfig {
    EngineConfig {
        tap_hint_timeout: None,
        ..EngineConfig::default()
    }
}

/// Running engine over scripted surfaces
pub struct TestEngine {
    pub engine: PlaybackEngine,
    pub probes: SlotPair<SurfaceProbe>,
    pub events: broadcast::Receiver<WalkthruEvent>,
}

impl TestEngine {
    pub async fn start(playlist: Playlist) -> Self {
        Self::start_with(playlist, test_config(), |_| {}).await
    }

    /// Start with `setup` applied to the probes before initialization
    pub async fn start_with(
        playlist: Playlist,
        config: EngineConfig,
        setup: impl FnOnce(&SlotPair<SurfaceProbe>),
    ) -> Self {
        let (surfaces, probes) = scripted_surfaces();
        setup(&probes);

        let state = Arc::new(SharedState::new());
        let events = state.subscribe_events();
        let engine = PlaybackEngine::initialize(playlist, surfaces, config, state)
            .await
            .expect("engine should initialize");

        Self {
            engine,
            probes,
            events,
        }
    }

    pub fn probe(&self, slot: Slot) -> &SurfaceProbe {
        &self.probes[slot]
    }

    /// Events received since the last call
    pub fn drain_events(&mut self) -> Vec<WalkthruEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            events.push(event);
        }
        events
    }
}

/// Let spawned tasks run without reaching the fallback deadline
///
/// With the clock paused, the runtime only advances time once every task is
/// idle, so one short sleep drains all ready work.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}

/// TransitionCommitted events in `events`
pub fn commits(events: &[WalkthruEvent]) -> Vec<(usize, Slot, CommitReason)> {
    events
        .iter()
        .filter_map(|event| match event {
            WalkthruEvent::TransitionCommitted {
                clip_index,
                active_slot,
                reason,
                ..
            } => Some((*clip_index, *active_slot, *reason)),
            _ => None,
        })
        .collect()
}

/// Request-to-commit latency of each TransitionCommitted event
pub fn commit_latencies(events: &[WalkthruEvent]) -> Vec<u64> {
    events
        .iter()
        .filter_map(|event| match event {
            WalkthruEvent::TransitionCommitted { latency_ms, .. } => Some(*latency_ms),
            _ => None,
        })
        .collect()
}

pub fn count_complete(events: &[WalkthruEvent]) -> usize {
    events
        .iter()
        .filter(|event| matches!(event, WalkthruEvent::PlaybackComplete { .. }))
        .count()
}
