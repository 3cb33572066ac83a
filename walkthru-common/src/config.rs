//! Configuration file and data folder resolution

use crate::{Error, Result};
use std::path::{Path, PathBuf};

/// Environment variable naming the bootstrap config file
pub const CONFIG_ENV_VAR: &str = "WALKTHRU_CONFIG";

/// Environment variable naming the data folder (playlist store root)
pub const DATA_DIR_ENV_VAR: &str = "WALKTHRU_DATA_DIR";

/// Locate the bootstrap config file, priority order:
/// 1. Command-line argument (highest priority, must exist)
/// 2. Environment variable (must exist)
/// 3. Platform config file, if present
///
/// `Ok(None)` means no file anywhere; callers fall back to built-in defaults.
pub fn resolve_config_file(cli_arg: Option<&Path>, env_var_name: &str) -> Result<Option<PathBuf>> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return require_existing(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(env_var_name) {
        return require_existing(PathBuf::from(path));
    }

    // Priority 3: Platform config file
    Ok(default_config_file().filter(|path| path.exists()))
}

fn require_existing(path: PathBuf) -> Result<Option<PathBuf>> {
    if path.exists() {
        Ok(Some(path))
    } else {
        Err(Error::Config(format!("Config file not found: {:?}", path)))
    }
}

/// Data folder resolution:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable
/// 3. `data_folder` from the config file
/// 4. OS-dependent compiled default (fallback)
pub fn resolve_data_folder(
    cli_arg: Option<&Path>,
    env_var_name: &str,
    config_value: Option<&Path>,
) -> PathBuf {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(env_var_name) {
        return PathBuf::from(path);
    }

    // Priority 3: TOML config file
    if let Some(path) = config_value {
        return path.to_path_buf();
    }

    // Priority 4: OS-dependent compiled default
    default_data_folder()
}

/// Platform config file path (`<config dir>/walkthru/config.toml`)
fn default_config_file() -> Option<PathBuf> {
    if cfg!(target_os = "linux") {
        // Try ~/.config/walkthru/config.toml first, then /etc/walkthru/config.toml
        let user_config = dirs::config_dir().map(|d| d.join("walkthru").join("config.toml"));
        match user_config {
            Some(path) if path.exists() => Some(path),
            _ => Some(PathBuf::from("/etc/walkthru/config.toml")),
        }
    } else {
        dirs::config_dir().map(|d| d.join("walkthru").join("config.toml"))
    }
}

/// OS-dependent default data folder
fn default_data_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        // ~/.local/share/walkthru
        dirs::data_local_dir()
            .map(|d| d.join("walkthru"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/walkthru"))
    } else if cfg!(target_os = "macos") {
        // ~/Library/Application Support/walkthru
        dirs::data_dir()
            .map(|d| d.join("walkthru"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/walkthru"))
    } else if cfg!(target_os = "windows") {
        // %LOCALAPPDATA%\walkthru
        dirs::data_local_dir()
            .map(|d| d.join("walkthru"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\walkthru"))
    } else {
        PathBuf::from("./walkthru_data")
    }
}
