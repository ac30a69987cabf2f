//! Reading and writing the configuration directory.

use super::app_config::AppConfig;
use super::state_config::StateConfig;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

const CONFIG_FILE_NAME: &str = "config.toml";
const STATE_FILE_NAME: &str = "state.toml";

/// Failures reading or writing the configuration directory.
#[derive(Debug, Error)]
#[allow(missing_docs)]
pub enum ConfigError {
    #[error("no configuration directory for this platform")]
    ConfigDirNotFound,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("cannot encode toml: {0}")]
    TomlSer(#[from] toml::ser::Error),
}

/// Owns the carousel configuration directory.
///
/// `config.toml` is edited by hand and created with defaults on first run.
/// `state.toml` is written by carousel itself. A file that fails to parse is
/// left alone and defaults are used in its place.
pub struct StorageManager {
    config_dir: PathBuf,
}

impl StorageManager {
    /// Uses the platform configuration directory.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ConfigDirNotFound` when the platform has none.
    pub fn new() -> Result<Self, ConfigError> {
        AppConfig::default_config_dir()
            .map(Self::with_dir)
            .ok_or(ConfigError::ConfigDirNotFound)
    }

    /// Uses `config_dir` instead of the platform directory.
    #[must_use]
    pub const fn with_dir(config_dir: PathBuf) -> Self {
        Self { config_dir }
    }

    /// Directory holding both files.
    #[must_use]
    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Creates the directory if it is missing.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Io` if it cannot be created.
    pub fn ensure_config_dir(&self) -> Result<(), ConfigError> {
        if !self.config_dir.exists() {
            info!(dir = %self.config_dir.display(), "Creating configuration directory");
            fs::create_dir_all(&self.config_dir)?;
        }
        Ok(())
    }

    /// Reads `config.toml`, or `path_override` when given.
    ///
    /// A missing file is written out with defaults so it can be edited.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file cannot be read or the default written.
    pub fn load_config(&self, path_override: Option<&Path>) -> Result<AppConfig, ConfigError> {
        let path = match path_override {
            Some(path) => path.to_path_buf(),
            None => {
                self.ensure_config_dir()?;
                self.config_dir.join(CONFIG_FILE_NAME)
            }
        };

        if let Some(config) = Self::read_toml(&path)? {
            return Ok(config);
        }

        info!(path = %path.display(), "No config file, writing defaults");
        let config = AppConfig::default();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        Self::write_toml(&path, &config)?;
        Ok(config)
    }

    /// Reads `state.toml`, defaulting when it is missing or unreadable.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Io` if the file exists but cannot be read.
    pub fn load_state(&self) -> Result<StateConfig, ConfigError> {
        let path = self.config_dir.join(STATE_FILE_NAME);
        Ok(Self::read_toml(&path)?.unwrap_or_default())
    }

    /// Replaces `state.toml`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file cannot be written.
    pub fn save_state(&self, state: &StateConfig) -> Result<(), ConfigError> {
        self.ensure_config_dir()?;
        Self::write_toml(&self.config_dir.join(STATE_FILE_NAME), state)
    }

    /// `Ok(None)` when the file is absent. Parse failures fall back to
    /// `T::default()` without touching the file.
    fn read_toml<T: DeserializeOwned + Default>(path: &Path) -> Result<Option<T>, ConfigError> {
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(path)?;
        let value = toml::from_str(&content).unwrap_or_else(|e| {
            warn!(path = %path.display(), error = %e, "Unparsable toml, using defaults");
            T::default()
        });
        Ok(Some(value))
    }

    /// Writes through a temp file in the same directory, then renames.
    fn write_toml<T: Serialize>(path: &Path, data: &T) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(data)?;
        let parent = path
            .parent()
            .ok_or_else(|| std::io::Error::other("path has no parent directory"))?;

        let mut staged = tempfile::NamedTempFile::new_in(parent)?;
        staged.write_all(content.as_bytes())?;
        staged.persist(path).map_err(|e| e.error)?;
        debug!(path = %path.display(), "Wrote toml");
        Ok(())
    }
}
