use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::{OverlayError, Result};

/// Minimal string key-value store
///
/// The controller persists presets through this seam so it can run
/// without touching the filesystem in tests.
pub trait KeyValueStore {
    /// Read a value, `None` when the key was never written
    fn get(&self, key: &str) -> Option<String>;

    /// Write a value, replacing any previous one
    fn set(&mut self, key: &str, value: String) -> Result<()>;
}

/// Store kept in a single JSON object file.
///
/// The file is created in the user's data directory:
/// - Linux: ~/.local/share/design-overlay/storage.json
/// - macOS: ~/Library/Application Support/design-overlay/storage.json
/// - Windows: %APPDATA%\design-overlay\storage.json
pub struct JsonFileStore {
    path: PathBuf,
    entries: Map<String, Value>,
}

impl JsonFileStore {
    /// Open the store at its default location
    pub fn new() -> Result<Self> {
        Self::open(Self::default_path()?)
    }

    /// Open (or lazily create) the store at `path`.
    ///
    /// A missing or unreadable file yields an empty store; nothing is
    /// written until the first `set`.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = Self::read_entries(&path);
        info!(path = %path.display(), keys = entries.len(), "storage opened");
        Ok(Self { path, entries })
    }

    /// Get the path where the store should be kept
    fn default_path() -> Result<PathBuf> {
        let mut path = dirs::data_dir()
            .or_else(dirs::home_dir)
            .ok_or(OverlayError::NoDataDir)?;

        path.push("design-overlay");
        path.push("storage.json");
        Ok(path)
    }

    fn read_entries(path: &Path) -> Map<String, Value> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "no storage file yet");
                return Map::new();
            }
        };
        match serde_json::from_str::<Value>(&text) {
            Ok(Value::Object(map)) => map,
            Ok(_) | Err(_) => {
                warn!(path = %path.display(), "storage file is not a JSON object, starting empty");
                Map::new()
            }
        }
    }

    fn flush(&self) -> Result<()> {
        // Ensure the parent directory exists
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| OverlayError::io(parent, e))?;
        }
        let text = serde_json::to_string_pretty(&self.entries)?;
        fs::write(&self.path, text).map_err(|e| OverlayError::io(&self.path, e))
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<String> {
        match self.entries.get(key)? {
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    fn set(&mut self, key: &str, value: String) -> Result<()> {
        self.entries.insert(key.to_owned(), Value::String(value));
        self.flush()
    }
}

impl std::fmt::Debug for JsonFileStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonFileStore")
            .field("path", &self.path)
            .finish()
    }
}

/// Volatile store, used when no data directory is available and in tests
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) -> Result<()> {
        self.entries.insert(key.to_owned(), value);
        Ok(())
    }
}
