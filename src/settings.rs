//! User settings loaded from the config directory.

use std::fs;
use std::path::{Path, PathBuf};

use log::warn;
use serde::{Deserialize, Serialize};

use crate::viewer::{ZOOM_IN_RATE, ZOOM_OUT_RATE};

const SETTINGS_FILENAME: &str = "config.toml";
const APP_NAME: &str = "pagepane";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Multiplier applied per zoom-in step
    pub zoom_in_rate: f32,
    /// Multiplier applied per zoom-out step
    pub zoom_out_rate: f32,
    /// Number of rendered pages kept in memory
    pub cache_capacity: usize,
    /// Log file location; next to the working directory when unset
    pub log_file: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            zoom_in_rate: ZOOM_IN_RATE,
            zoom_out_rate: ZOOM_OUT_RATE,
            cache_capacity: crate::viewer::DEFAULT_CACHE_CAPACITY,
            log_file: None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("failed to read settings: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed settings file: {0}")]
    Parse(#[from] toml::de::Error),
}

impl Settings {
    #[must_use]
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_NAME).join(SETTINGS_FILENAME))
    }

    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        let raw = fs::read_to_string(path)?;
        Ok(toml::from_str(&raw)?)
    }

    /// Settings from the user config dir. A missing file means defaults;
    /// a malformed file is reported and ignored.
    #[must_use]
    pub fn load_or_default() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        match Self::load_from(&path) {
            Ok(settings) => settings,
            Err(e) => {
                warn!("ignoring settings at {}: {e}", path.display());
                Self::default()
            }
        }
    }
}
