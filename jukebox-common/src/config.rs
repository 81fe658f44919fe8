//! Configuration file resolution and TOML loading

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Name of the per-user configuration directory
pub const CONFIG_DIR_NAME: &str = "jukebox";

/// Name of the configuration file inside the configuration directory
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Config file resolution in priority order:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable
/// 3. Platform config directory (`~/.config/jukebox/config.toml` on Linux)
///
/// Returns `None` when no candidate exists; callers fall back to compiled
/// defaults in that case.
pub fn resolve_config_path(cli_arg: Option<&Path>, env_var_name: &str) -> Option<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(env_var_name) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    // Priority 3: Platform config directory
    let user_config = default_config_path()?;
    if user_config.exists() {
        Some(user_config)
    } else {
        None
    }
}

/// Platform-dependent default config file location
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

/// Load a TOML config file into `T`
///
/// A missing file is not fatal: a warning is logged and `T::default()` is
/// returned. A file that exists but cannot be read or parsed is a
/// configuration error.
pub fn load_toml_or_default<T>(path: Option<&Path>) -> Result<T>
where
    T: DeserializeOwned + Default,
{
    let Some(path) = path else {
        debug!("No config file found, using compiled defaults");
        return Ok(T::default());
    };

    if !path.exists() {
        warn!("Config file {} not found, using compiled defaults", path.display());
        return Ok(T::default());
    }

    let content = std::fs::read_to_string(path)?;
    let parsed = toml::from_str::<T>(&content)
        .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))?;

    info!("Loaded configuration from {}", path.display());
    Ok(parsed)
}
