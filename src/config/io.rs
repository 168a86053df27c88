//! Configuration file I/O operations

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use fs2::FileExt;

use super::Config;

impl Config {
    /// Get the global config directory path (~/.deadline-bridge/)
    pub fn global_config_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".deadline-bridge")
    }

    /// Get the global config file path (~/.deadline-bridge/config.toml)
    pub fn global_config_path() -> PathBuf {
        Self::global_config_dir().join("config.toml")
    }

    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config = Config::from_toml(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Load configuration for a project directory.
    ///
    /// Looks for `.deadline-bridge/config.toml`, then `deadline-bridge.toml`,
    /// then the global config. Falls back to defaults when none exist.
    pub fn from_dir(dir: &Path) -> Result<Self> {
        let project_path = dir.join(".deadline-bridge/config.toml");
        if project_path.exists() {
            return Self::from_file(&project_path);
        }

        let flat_path = dir.join("deadline-bridge.toml");
        if flat_path.exists() {
            return Self::from_file(&flat_path);
        }

        Self::load()
    }

    /// Load the global configuration, or defaults when there is none
    pub fn load() -> Result<Self> {
        let global_path = Self::global_config_path();
        if !global_path.exists() {
            tracing::debug!("No config at {}, using defaults", global_path.display());
            return Ok(Self::with_defaults());
        }
        Self::from_file(&global_path)
    }

    /// Save configuration to a file with atomic write and file locking.
    ///
    /// 1. Exclusive lock keeps concurrent `init` runs from interleaving
    /// 2. Atomic write (temp file + rename) prevents corruption on crash
    /// 3. Parent directory is created if needed
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let content = toml::to_string_pretty(self).with_context(|| "Failed to serialize config")?;

        // Lock file is separate from the config so the rename below is safe
        let lock_path = path.with_extension("toml.lock");
        let lock_file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&lock_path)
            .with_context(|| format!("Failed to create lock file: {}", lock_path.display()))?;

        lock_file
            .lock_exclusive()
            .with_context(|| "Failed to acquire config lock")?;

        let temp_path = path.with_extension("toml.tmp");
        let mut temp_file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&temp_path)
            .with_context(|| format!("Failed to create temp file: {}", temp_path.display()))?;

        temp_file
            .write_all(content.as_bytes())
            .with_context(|| "Failed to write config content")?;

        temp_file
            .sync_all()
            .with_context(|| "Failed to sync config file")?;

        std::fs::rename(&temp_path, path)
            .with_context(|| format!("Failed to rename config file: {}", path.display()))?;

        // Lock is released when lock_file is dropped
        Ok(())
    }
}
