//! Configuration management for walkthru-player
//!
//! Two layers:
//! 1. **TOML Bootstrap**: data folder, logging, engine tuning (read once at start)
//! 2. **EngineConfig**: the validated values the engine is constructed with
//!
//! # Settings Sources Priority
//!
//! 1. Command-line arguments (--trigger, --fallback-ms, --data-dir)
//! 2. Environment variables (WALKTHRU_CONFIG, WALKTHRU_DATA_DIR)
//! 3. TOML configuration file
//! 4. Built-in defaults (code constants)

use crate::error::{Error, Result};
use crate::playback::hit_test::TriggerPhase;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Default fallback window before a stalled transition is force-committed
pub const DEFAULT_FALLBACK_TIMEOUT_MS: u64 = 700;

/// Accepted fallback window range
pub const FALLBACK_TIMEOUT_RANGE_MS: (u64, u64) = (50, 10_000);

/// Default delay before the tap hint hides itself
pub const DEFAULT_TAP_HINT_TIMEOUT_MS: u64 = 3000;

/// Bootstrap configuration loaded from TOML file
///
/// Every key is optional; a missing file is the same as an empty one.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    /// Playlist store root (optional)
    ///
    /// If not specified: CLI → environment → OS default
    #[serde(default)]
    pub data_folder: Option<PathBuf>,

    /// Engine tuning (optional)
    #[serde(default)]
    pub engine: EngineSection,

    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// `[engine]` table
#[derive(Debug, Clone, Deserialize)]
pub struct EngineSection {
    #[serde(default)]
    pub advance_trigger: TriggerPhase,

    #[serde(default = "default_fallback_timeout_ms")]
    pub fallback_timeout_ms: u64,

    #[serde(default = "default_loop_active")]
    pub loop_active: bool,

    /// 0 keeps the hint until the first tap
    #[serde(default = "default_tap_hint_timeout_ms")]
    pub tap_hint_timeout_ms: u64,
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            advance_trigger: TriggerPhase::default(),
            fallback_timeout_ms: default_fallback_timeout_ms(),
            loop_active: default_loop_active(),
            tap_hint_timeout_ms: default_tap_hint_timeout_ms(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_fallback_timeout_ms() -> u64 {
    DEFAULT_FALLBACK_TIMEOUT_MS
}

fn default_loop_active() -> bool {
    true
}

fn default_tap_hint_timeout_ms() -> u64 {
    DEFAULT_TAP_HINT_TIMEOUT_MS
}

fn default_log_level() -> String {
    "info".to_string()
}

impl TomlConfig {
    /// Read and parse a TOML bootstrap file
    pub async fn load(path: &Path) -> Result<Self> {
        let toml_str = tokio::fs::read_to_string(path).await.map_err(|e| {
            Error::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;
        let config = Self::parse(&toml_str)?;
        info!("Loaded TOML configuration from {:?}", path);
        Ok(config)
    }

    pub fn parse(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str).map_err(|e| Error::Config(format!("Failed to parse TOML: {}", e)))
    }
}

/// Validated engine configuration
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Which touch phase samples the advance tap
    pub advance_trigger: TriggerPhase,

    /// Window for the standby slot to confirm playback before a forced commit
    pub fallback_timeout: Duration,

    /// Active clip loops in place until an advance
    pub loop_active: bool,

    /// Auto-hide delay for the tap hint; `None` keeps it until the first tap
    pub tap_hint_timeout: Option<Duration>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::from_section(&EngineSection::default())
    }
}

impl EngineConfig {
    /// Build from the `[engine]` table, clamping out-of-range values
    pub fn from_section(section: &EngineSection) -> Self {
        let (min, max) = FALLBACK_TIMEOUT_RANGE_MS;
        let fallback_ms = section.fallback_timeout_ms.clamp(min, max);
        if fallback_ms != section.fallback_timeout_ms {
            warn!(
                "fallback_timeout_ms {} out of range [{}, {}], using {}",
                section.fallback_timeout_ms, min, max, fallback_ms
            );
        }

        Self {
            advance_trigger: section.advance_trigger,
            fallback_timeout: Duration::from_millis(fallback_ms),
            loop_active: section.loop_active,
            tap_hint_timeout: match section.tap_hint_timeout_ms {
                0 => None,
                ms => Some(Duration::from_millis(ms)),
            },
        }
    }

    /// Apply command-line overrides on top of file values
    pub fn with_overrides(mut self, overrides: &ConfigOverrides) -> Self {
        if let Some(phase) = overrides.advance_trigger {
            self.advance_trigger = phase;
        }
        if let Some(ms) = overrides.fallback_timeout_ms {
            let (min, max) = FALLBACK_TIMEOUT_RANGE_MS;
            self.fallback_timeout = Duration::from_millis(ms.clamp(min, max));
        }
        self
    }
}

/// Command-line configuration overrides
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub advance_trigger: Option<TriggerPhase>,
    pub fallback_timeout_ms: Option<u64>,
}
