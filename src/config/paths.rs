//! Path management for spoty
//!
//! All persisted state lives in one config directory: the settings file and
//! the key-value storage file.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Filesystem locations used by the client
#[derive(Debug, Clone)]
pub struct Paths {
    config_dir: PathBuf,
}

impl Paths {
    /// Resolve the config directory and create it.
    ///
    /// `config_override` wins; otherwise the platform config directory
    /// (e.g. `~/.config/spoty`) is used.
    pub fn init(config_override: Option<PathBuf>) -> Result<Self> {
        let config_dir = match config_override {
            Some(path) => path,
            None => directories::ProjectDirs::from("", "", "spoty")
                .map(|dirs| dirs.config_dir().to_path_buf())
                .context("Could not determine a config directory, pass --config")?,
        };

        let paths = Self { config_dir };
        paths.create_directories()?;
        Ok(paths)
    }

    fn create_directories(&self) -> Result<()> {
        std::fs::create_dir_all(&self.config_dir).with_context(|| {
            format!(
                "Failed to create config directory {}",
                self.config_dir.display()
            )
        })
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// settings.json
    pub fn settings_path(&self) -> PathBuf {
        self.config_dir.join("settings.json")
    }

    /// Token, verifier and custom albums
    pub fn storage_path(&self) -> PathBuf {
        self.config_dir.join("storage.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_paths_creation() {
        let temp_dir = TempDir::new().unwrap();
        let config = temp_dir.path().join("spoty");

        let paths = Paths::init(Some(config.clone())).unwrap();

        assert!(paths.config_dir().exists());
        assert_eq!(paths.settings_path(), config.join("settings.json"));
        assert_eq!(paths.storage_path(), config.join("storage.json"));
    }
}
