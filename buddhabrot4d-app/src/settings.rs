use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, error, info};

use buddhabrot4d_core::BuddhabrotConfig;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings file {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("failed to parse settings file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Load engine settings from a JSON file. Missing fields take their default
/// values; a missing or malformed file is an error.
pub fn load(path: &Path) -> Result<BuddhabrotConfig, SettingsError> {
    let json = fs::read_to_string(path).map_err(|source| SettingsError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let config = serde_json::from_str::<BuddhabrotConfig>(&json).map_err(|source| {
        SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        }
    })?;
    info!("Loaded settings from {}", path.display());
    Ok(config)
}

/// Persist settings as pretty-printed JSON. Returns `false` on failure.
pub fn save(config: &BuddhabrotConfig, path: &Path) -> bool {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if let Err(e) = fs::create_dir_all(parent) {
            error!("Failed to create settings directory: {e}");
            return false;
        }
    }
    match serde_json::to_string_pretty(config) {
        Ok(json) => match fs::write(path, json) {
            Ok(()) => {
                debug!("Saved settings to {}", path.display());
                true
            }
            Err(e) => {
                error!("Failed to write settings: {e}");
                false
            }
        },
        Err(e) => {
            error!("Failed to serialize settings: {e}");
            false
        }
    }
}
