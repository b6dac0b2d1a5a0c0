/// Application settings
///
/// Loaded once at start-up from `settings.json` in the user's config
/// directory. Every field has a default, so a partial file is valid.
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{OverlayError, Result};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Stage width before any query or preset is applied
    pub initial_width: u32,
    /// Stage height before any query or preset is applied
    pub initial_height: u32,
    /// Overlay opacity (percent) before any query is applied
    pub initial_opacity: u8,
    /// How often the overlay layer is re-fetched while a URL is set
    pub refresh_interval_ms: u64,
    /// How long a notice stays on screen
    pub notice_duration_ms: u64,
    /// Enable `debug` logging (and let `RUST_LOG` override it)
    pub debug_logging: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            initial_width: 2880,
            initial_height: 1452,
            initial_opacity: 70,
            refresh_interval_ms: 2000,
            notice_duration_ms: 3000,
            debug_logging: false,
        }
    }
}

impl Settings {
    /// Load from the default location. A missing file yields the defaults.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::default_path()?)
    }

    /// Load from `path`. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        match fs::read_to_string(path) {
            Ok(text) => Self::from_json(&text),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(OverlayError::io(path, e)),
        }
    }

    /// Returns ~/.config/design-overlay/settings.json on Linux
    fn default_path() -> Result<PathBuf> {
        let mut path = dirs::config_dir()
            .or_else(dirs::home_dir)
            .ok_or(OverlayError::NoDataDir)?;
        path.push("design-overlay");
        path.push("settings.json");
        Ok(path)
    }

    /// Parse from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms.max(100))
    }

    pub fn notice_duration(&self) -> Duration {
        Duration::from_millis(self.notice_duration_ms)
    }
}
