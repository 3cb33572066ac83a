//! Walkthru Player (walkthru-player) - Main entry point
//!
//! Runs the playback engine over two simulated surfaces and drives it with
//! line commands from stdin (see `walkthru_player::host`). Engine events are
//! printed to stdout as JSON lines.
//!
//! The `import`, `hotspot` and `clear` subcommands author the playlist store
//! that playback reads.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tokio::sync::broadcast;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use walkthru_common::config::{
    resolve_config_file, resolve_data_folder, CONFIG_ENV_VAR, DATA_DIR_ENV_VAR,
};
use walkthru_common::events::WalkthruEvent;
use walkthru_common::playlist::DEFAULT_HOTSPOT_SIZE;
use walkthru_common::store::PlaylistStore;
use walkthru_common::{Playlist, SlotPair};
use walkthru_player::config::{ConfigOverrides, EngineConfig, TomlConfig};
use walkthru_player::host::HostCommand;
use walkthru_player::playback::{TriggerPhase, ViewportSize};
use walkthru_player::surface::{MediaSurface, SimulatedSurface};
use walkthru_player::{Error, PlaybackEngine, SharedState};

/// Command-line arguments for walkthru-player
#[derive(Parser, Debug)]
#[command(name = "walkthru-player")]
#[command(about = "Seamless tap-to-advance clip player")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// TOML bootstrap config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Playlist store folder (playlist.json + clips/)
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// Play this playlist manifest instead of the store's
    #[arg(short, long, env = "WALKTHRU_PLAYLIST")]
    playlist: Option<PathBuf>,

    /// Touch phase that triggers advances (touch_start | touch_end)
    #[arg(long)]
    trigger: Option<TriggerPhase>,

    /// Fallback commit window in milliseconds
    #[arg(long)]
    fallback_ms: Option<u64>,

    /// Viewport width in tap coordinate units
    #[arg(long, default_value = "100")]
    width: f64,

    /// Viewport height in tap coordinate units
    #[arg(long, default_value = "100")]
    height: f64,

    /// Simulated decoder load latency in milliseconds
    #[arg(long, default_value = "0")]
    load_latency_ms: u64,

    /// Simulated decoder start latency in milliseconds
    #[arg(long, default_value = "0")]
    start_latency_ms: u64,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Play the walkthrough (default)
    Play,

    /// Copy clips into the store as the next steps, in order
    Import {
        #[arg(required = true)]
        clips: Vec<PathBuf>,
    },

    /// Place a step's hotspot centered on a tap at percent coordinates
    Hotspot {
        /// Zero-based step index
        step: usize,
        x: f64,
        y: f64,

        /// Hotspot width and height in percent
        #[arg(long, default_value_t = DEFAULT_HOTSPOT_SIZE)]
        size: f64,
    },

    /// Delete the saved playlist and every stored clip
    Clear,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Config is read before tracing starts: it supplies the default filter
    let config_path = resolve_config_file(args.config.as_deref(), CONFIG_ENV_VAR)
        .context("Failed to resolve config file")?;
    let toml_config = match &config_path {
        Some(path) => TomlConfig::load(path)
            .await
            .context("Failed to load config file")?,
        None => TomlConfig::default(),
    };

    // Initialize tracing
    let default_filter = format!(
        "walkthru_player={level},walkthru_common={level}",
        level = toml_config.logging.level
    );
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("Starting Walkthru Player v{}", env!("CARGO_PKG_VERSION"));
    match &config_path {
        Some(path) => info!("Config file: {}", path.display()),
        None => info!("No config file found, using built-in defaults"),
    }

    match &args.command {
        Some(Command::Import { clips }) => {
            let store = open_store(&args, &toml_config).await?;
            let playlist = store
                .append_clips(clips)
                .await
                .context("Failed to import clips")?;
            info!("Playlist now has {} clips", playlist.len());
            Ok(())
        }
        Some(Command::Hotspot { step, x, y, size }) => {
            let store = open_store(&args, &toml_config).await?;
            let region = store
                .place_hotspot(*step, *x, *y, *size)
                .await
                .with_context(|| format!("Failed to place hotspot on step {}", step))?;
            info!(
                "Step {} hotspot: x={} y={} {}x{}",
                step,
                region.x(),
                region.y(),
                region.width(),
                region.height()
            );
            Ok(())
        }
        Some(Command::Clear) => {
            let store = open_store(&args, &toml_config).await?;
            store.clear().await.context("Failed to clear playlist store")
        }
        Some(Command::Play) | None => play(&args, &toml_config).await,
    }
}

/// Run the engine until completion, stdin EOF, `quit`, or Ctrl+C
async fn play(args: &Args, toml_config: &TomlConfig) -> Result<()> {
    let overrides = ConfigOverrides {
        advance_trigger: args.trigger,
        fallback_timeout_ms: args.fallback_ms,
    };
    let engine_config = EngineConfig::from_section(&toml_config.engine).with_overrides(&overrides);

    let playlist = load_playlist(args, toml_config).await?;
    info!("Playlist: {} clips", playlist.len());

    let load_latency = Duration::from_millis(args.load_latency_ms);
    let start_latency = Duration::from_millis(args.start_latency_ms);
    let surfaces = SlotPair::from_fn(|slot| {
        Box::new(
            SimulatedSurface::new(slot.to_string())
                .with_load_latency(load_latency)
                .with_start_latency(start_latency),
        ) as Box<dyn MediaSurface>
    });

    let state = Arc::new(SharedState::new());
    // Subscribe before initialize so EngineInitialized is printed
    let printer = tokio::spawn(print_events(state.subscribe_events()));
    let mut completion = state.subscribe_events();

    let initialized =
        PlaybackEngine::initialize(playlist, surfaces, engine_config, Arc::clone(&state)).await;
    let engine = match initialized {
        Ok(engine) => engine,
        Err(Error::EmptySequence) => {
            warn!("Nothing to play: the playlist is empty (add clips with `import`)");
            printer.abort();
            return Ok(());
        }
        Err(e) => return Err(e).context("Failed to initialize playback engine"),
    };

    let viewport = ViewportSize::new(args.width, args.height);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            _ = signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down");
                break;
            }
            _ = wait_for_completion(&mut completion) => {
                info!("Walkthrough complete");
                break;
            }
            line = lines.next_line() => match line {
                Ok(Some(line)) => {
                    if !run_command(&engine, &line, viewport).await? {
                        break;
                    }
                }
                Ok(None) => {
                    info!("Input closed, shutting down");
                    break;
                }
                Err(e) => {
                    warn!("Failed to read input: {}", e);
                    break;
                }
            },
        }
    }

    engine.shutdown().await;
    // Let the printer drain the shutdown event
    tokio::task::yield_now().await;
    printer.abort();
    info!("Walkthru Player stopped");
    Ok(())
}

/// `--playlist` manifest if given, otherwise the store in the data folder
async fn load_playlist(args: &Args, toml_config: &TomlConfig) -> Result<Playlist> {
    if let Some(path) = &args.playlist {
        info!("Playlist manifest: {}", path.display());
        return Playlist::load_json(path)
            .await
            .with_context(|| format!("Failed to load playlist {}", path.display()));
    }

    let store = open_store(args, toml_config).await?;
    store.load().await.context("Failed to load stored playlist")
}

async fn open_store(args: &Args, toml_config: &TomlConfig) -> Result<PlaylistStore> {
    let data_folder = resolve_data_folder(
        args.data_dir.as_deref(),
        DATA_DIR_ENV_VAR,
        toml_config.data_folder.as_deref(),
    );
    info!("Data folder: {}", data_folder.display());
    PlaylistStore::open(&data_folder)
        .await
        .context("Failed to open playlist store")
}

/// Execute one input line; returns false when the host should exit
async fn run_command(engine: &PlaybackEngine, line: &str, viewport: ViewportSize) -> Result<bool> {
    let command = match HostCommand::parse(line) {
        Ok(Some(command)) => command,
        Ok(None) => return Ok(true),
        Err(e) => {
            warn!("{}", e);
            return Ok(true);
        }
    };

    match command {
        HostCommand::Tap(point) => {
            let outcome = engine.handle_tap(point, viewport).await;
            info!("tap ({}, {}) -> {:?}", point.x, point.y, outcome);
        }
        HostCommand::Touch(event) => {
            let outcome = engine.handle_touch(event, viewport).await;
            info!("{:?} ({}, {}) -> {:?}", event.phase, event.point.x, event.point.y, outcome);
        }
        HostCommand::SetTrigger(phase) => engine.set_trigger_phase(phase).await,
        HostCommand::Status => {
            let snapshot = engine.snapshot().await;
            println!(
                "{}",
                serde_json::to_string(&snapshot).context("Failed to serialize snapshot")?
            );
        }
        HostCommand::Quit => return Ok(false),
    }
    Ok(true)
}

/// Print every engine event as one JSON line
async fn print_events(mut rx: broadcast::Receiver<WalkthruEvent>) {
    loop {
        match rx.recv().await {
            Ok(event) => match serde_json::to_string(&event) {
                Ok(json) => println!("{}", json),
                Err(e) => warn!("Failed to serialize event: {}", e),
            },
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!("Event printer lagged, {} events dropped", skipped);
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

async fn wait_for_completion(rx: &mut broadcast::Receiver<WalkthruEvent>) {
    loop {
        match rx.recv().await {
            Ok(WalkthruEvent::PlaybackComplete { .. }) => return,
            Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => continue,
            Err(broadcast::error::RecvError::Closed) => std::future::pending::<()>().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_command_plays() {
        let args = Args::try_parse_from(["walkthru-player", "--width", "390"]).unwrap();
        assert!(args.command.is_none());
        assert_eq!(args.width, 390.0);
    }

    #[test]
    fn test_authoring_subcommands() {
        let args = Args::try_parse_from(["walkthru-player", "hotspot", "1", "30", "40"]).unwrap();
        match args.command {
            Some(Command::Hotspot { step, x, y, size }) => {
                assert_eq!((step, x, y, size), (1, 30.0, 40.0, DEFAULT_HOTSPOT_SIZE));
            }
            other => panic!("expected hotspot, got {:?}", other),
        }

        let argv = ["walkthru-player", "-d", "/tmp/w", "import", "a.mov", "b.mp4"];
        let args = Args::try_parse_from(argv).unwrap();
        match args.command {
            Some(Command::Import { clips }) => {
                assert_eq!(clips, vec![PathBuf::from("a.mov"), PathBuf::from("b.mp4")]);
            }
            other => panic!("expected import, got {:?}", other),
        }

        // At least one clip is required
        assert!(Args::try_parse_from(["walkthru-player", "import"]).is_err());
    }
}
