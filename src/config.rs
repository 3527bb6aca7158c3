use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use directories::ProjectDirs;
use log::{debug, error, info};
use serde::{Deserialize, Serialize};

use crate::{NotesError, Result};

/// Versioned name of the notes file; bump when the schema changes incompatibly
pub const NOTES_FILE_NAME: &str = "notes_v2.json";

/// Default quiet period before pending edits are written
pub const DEFAULT_DEBOUNCE_MS: u64 = 400;

/// Application configuration settings.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Private directory holding the notes file
    pub data_dir: PathBuf,

    /// Name of the notes file inside `data_dir`
    pub file_name: String,

    /// Debounce window for saves, in milliseconds
    pub debounce_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            data_dir: PathBuf::from("."),
            file_name: NOTES_FILE_NAME.to_string(),
            debounce_ms: DEFAULT_DEBOUNCE_MS,
        }
    }
}

impl Config {
    /// Configuration rooted at `data_dir` with default settings
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Config {
            data_dir: data_dir.into(),
            ..Config::default()
        }
    }

    /// Configuration rooted in the platform's per-user data directory.
    ///
    /// Failing to resolve that directory is an environment problem the
    /// application cannot recover from.
    pub fn from_platform_dirs() -> Result<Self> {
        let dirs = ProjectDirs::from("com", "blocknotes", "BlockNotes").ok_or_else(|| {
            error!("Could not resolve a private data directory for this user");
            NotesError::Config {
                message: "no valid home directory found".to_string(),
            }
        })?;
        let config = Self::with_data_dir(dirs.data_dir());
        debug!("Resolved data directory: {}", config.data_dir.display());
        Ok(config)
    }

    /// Reads configuration from a JSON file; missing fields take defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        info!("Loading configuration from {}", path.display());
        let content = fs::read_to_string(path).map_err(|e| {
            error!("Failed to read config file {}: {}", path.display(), e);
            NotesError::Config {
                message: format!("cannot read {}: {}", path.display(), e),
            }
        })?;
        serde_json::from_str(&content).map_err(|e| {
            error!("Failed to parse config file {}: {}", path.display(), e);
            NotesError::Config {
                message: format!("invalid config {}: {}", path.display(), e),
            }
        })
    }

    /// Full path of the notes file
    pub fn notes_file(&self) -> PathBuf {
        self.data_dir.join(&self.file_name)
    }

    /// Debounce window as a duration
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}
