use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    sync::{PoisonError, RwLock},
    time::Duration,
};

use crate::{models::Coordinates, overlay::OverlayConfig};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplorerSettings {
    pub fetch_timeout_ms: u64,
    pub fixture_path: Option<PathBuf>,
    /// Artificial delay for every fixture response.
    pub fixture_latency_ms: u64,
    pub default_center: Coordinates,
}

impl Default for ExplorerSettings {
    fn default() -> Self {
        Self {
            fetch_timeout_ms: 10_000,
            fixture_path: None,
            fixture_latency_ms: 0,
            default_center: Coordinates {
                lat: 48.8566,
                lng: 2.3522,
            },
        }
    }
}

impl ExplorerSettings {
    pub fn overlay_config(&self) -> OverlayConfig {
        OverlayConfig {
            fetch_timeout: Duration::from_millis(self.fetch_timeout_ms.max(1)),
        }
    }

    pub fn fixture_latency(&self) -> Duration {
        Duration::from_millis(self.fixture_latency_ms)
    }
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<ExplorerSettings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_else(|err| {
                log::warn!(
                    "Ignoring unparsable settings in {}: {err}",
                    path.display()
                );
                ExplorerSettings::default()
            })
        } else {
            ExplorerSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn current(&self) -> ExplorerSettings {
        self.data
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn update(&self, settings: ExplorerSettings) -> Result<()> {
        let mut guard = self.data.write().unwrap_or_else(PoisonError::into_inner);
        self.persist(&settings)?;
        *guard = settings;
        Ok(())
    }

    fn persist(&self, data: &ExplorerSettings) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.json")).unwrap();
        assert_eq!(store.current(), ExplorerSettings::default());
    }

    #[test]
    fn update_persists_and_reloads() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");

        let store = SettingsStore::new(path.clone()).unwrap();
        let mut settings = store.current();
        settings.fetch_timeout_ms = 2_500;
        settings.fixture_path = Some(PathBuf::from("places.json"));
        store.update(settings.clone()).unwrap();

        let reloaded = SettingsStore::new(path).unwrap();
        assert_eq!(reloaded.current(), settings);
        assert_eq!(
            reloaded.current().overlay_config().fetch_timeout,
            Duration::from_millis(2_500)
        );
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{ "fetch_timeout_ms": 500, "fixture_latency_ms": 40 }"#).unwrap();

        let store = SettingsStore::new(path).unwrap();
        let current = store.current();
        assert_eq!(current.fetch_timeout_ms, 500);
        assert_eq!(current.fixture_latency(), Duration::from_millis(40));
        assert_eq!(current.fixture_path, None);
        assert_eq!(current.default_center, ExplorerSettings::default().default_center);
    }

    #[test]
    fn garbage_file_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "not json at all").unwrap();

        let store = SettingsStore::new(path).unwrap();
        assert_eq!(store.current(), ExplorerSettings::default());
    }
}
