pub mod types;

pub use types::{ChatConfig, Config, HistoryConfig, McpConfig, SummarizerSettings};

use crate::error::{ConfigError, Result};
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILE_NAME: &str = ".parley.toml";

/// Get the global config file path (~/.parley.toml)
pub fn global_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(CONFIG_FILE_NAME))
}

/// Get the local config file path (./.parley.toml)
pub fn local_config_path(dir: &Path) -> PathBuf {
    dir.join(CONFIG_FILE_NAME)
}

/// Load configuration from file or use defaults
///
/// An explicit path must exist and parse. Otherwise the local config is tried
/// first, then the global one; unreadable implicit files are skipped.
pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    if let Some(path) = explicit {
        return read_config(path);
    }

    let candidates = std::env::current_dir()
        .ok()
        .map(|cwd| local_config_path(&cwd))
        .into_iter()
        .chain(global_config_path());

    for path in candidates {
        if !path.exists() {
            continue;
        }
        match read_config(&path) {
            Ok(config) => {
                log::debug!("Loaded configuration from {}", path.display());
                return Ok(config);
            }
            Err(e) => log::warn!("Ignoring {}: {}", path.display(), e),
        }
    }

    Ok(Config::default())
}

/// Parse one TOML config file
pub fn read_config(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path).map_err(|e| ConfigError::Unreadable {
        path: path.to_path_buf(),
        source: e,
    })?;
    let config = toml::from_str(&content)
        .map_err(|e| ConfigError::ParsingFailed(format!("{}: {}", path.display(), e)))?;
    Ok(config)
}
