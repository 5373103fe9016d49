use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use engine_logging::{engine_info, engine_warn};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use thiserror::Error;

const SETTINGS_FILENAME: &str = "settings.ron";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub(crate) struct Settings {
    /// Base address of the search service, e.g. `http://localhost:8000/api`.
    #[serde(default)]
    pub base_url: Option<String>,
}

#[derive(Debug, Error)]
pub(crate) enum SettingsError {
    #[error("settings directory unavailable: {0}")]
    Dir(String),
    #[error("failed to serialize settings: {0}")]
    Serialize(#[from] ron::Error),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Loads and atomically rewrites `settings.ron` in one directory.
#[derive(Debug, Clone)]
pub(crate) struct SettingsStore {
    dir: PathBuf,
}

impl SettingsStore {
    pub(crate) fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// `<config dir>/partscout`, falling back to the working directory.
    pub(crate) fn default_dir() -> PathBuf {
        dirs::config_dir()
            .map(|dir| dir.join("partscout"))
            .unwrap_or_else(|| PathBuf::from("."))
    }

    pub(crate) fn path(&self) -> PathBuf {
        self.dir.join(SETTINGS_FILENAME)
    }

    pub(crate) fn load(&self) -> Settings {
        let path = self.path();
        let content = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Settings::default();
            }
            Err(err) => {
                engine_warn!("Failed to read settings from {:?}: {}", path, err);
                return Settings::default();
            }
        };

        match ron::from_str(&content) {
            Ok(settings) => {
                engine_info!("Loaded settings from {:?}", path);
                settings
            }
            Err(err) => {
                engine_warn!("Failed to parse settings from {:?}: {}", path, err);
                Settings::default()
            }
        }
    }

    /// Stores `base_url`, keeping any other settings already on disk.
    pub(crate) fn save_base_url(&self, base_url: &str) -> Result<PathBuf, SettingsError> {
        let mut settings = self.load();
        settings.base_url = Some(base_url.to_string());
        self.save(&settings)
    }

    pub(crate) fn save(&self, settings: &Settings) -> Result<PathBuf, SettingsError> {
        ensure_dir(&self.dir)?;
        let content = ron::ser::to_string_pretty(settings, ron::ser::PrettyConfig::new())?;

        let target = self.path();
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(content.as_bytes())?;
        tmp.flush()?;
        tmp.as_file_mut().sync_all()?;
        tmp.persist(&target).map_err(|e| SettingsError::Io(e.error))?;
        Ok(target)
    }
}

fn ensure_dir(dir: &Path) -> Result<(), SettingsError> {
    if dir.exists() {
        let meta = fs::metadata(dir).map_err(|e| SettingsError::Dir(e.to_string()))?;
        if !meta.is_dir() {
            return Err(SettingsError::Dir("path is not a directory".into()));
        }
        return Ok(());
    }
    fs::create_dir_all(dir).map_err(|e| SettingsError::Dir(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_yields_defaults() {
        let temp = TempDir::new().unwrap();
        let store = SettingsStore::new(temp.path().join("nested"));
        assert_eq!(store.load(), Settings::default());
    }

    #[test]
    fn saved_base_url_round_trips_and_replaces() {
        let temp = TempDir::new().unwrap();
        let store = SettingsStore::new(temp.path().join("partscout"));

        let path = store.save_base_url("http://10.0.0.2:8000/api").unwrap();
        assert_eq!(path, store.path());
        assert_eq!(
            store.load().base_url.as_deref(),
            Some("http://10.0.0.2:8000/api")
        );

        store.save_base_url("http://10.0.0.3:8000/api").unwrap();
        assert_eq!(
            store.load().base_url.as_deref(),
            Some("http://10.0.0.3:8000/api")
        );
    }

    #[test]
    fn corrupt_file_yields_defaults() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(SETTINGS_FILENAME), "(base_url: Some(").unwrap();
        let store = SettingsStore::new(temp.path().to_path_buf());
        assert_eq!(store.load(), Settings::default());
    }

    #[test]
    fn save_into_a_file_path_fails_cleanly() {
        let temp = TempDir::new().unwrap();
        let file_path = temp.path().join("not_a_dir");
        fs::write(&file_path, "x").unwrap();

        let store = SettingsStore::new(file_path);
        assert!(matches!(
            store.save_base_url("http://x"),
            Err(SettingsError::Dir(_))
        ));
    }
}
