use std::path::{Path, PathBuf};
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::error::Result;
use crate::mode::PreviewMode;

pub const SETTINGS_FILE: &str = "settings.json";

/// Supplies the preview mode to use when a caller does not name one.
pub trait PreviewModeSource: Send + Sync {
    fn current_mode(&self) -> PreviewMode;
}

/// A mode that never changes.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedMode(pub PreviewMode);

impl PreviewModeSource for FixedMode {
    fn current_mode(&self) -> PreviewMode {
        self.0
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct SettingsFile {
    #[serde(default)]
    preview_mode: PreviewMode,
}

/// Preview-mode selector persisted to `settings.json` under the data directory.
#[derive(Debug)]
pub struct PreviewSettings {
    path: PathBuf,
    mode: RwLock<PreviewMode>,
}

impl PreviewSettings {
    /// Reads the stored mode. A missing or unreadable file falls back to `raw`.
    pub async fn load(data_dir: impl AsRef<Path>) -> Self {
        let path = data_dir.as_ref().join(SETTINGS_FILE);
        let mode = match fs::read_to_string(&path).await {
            Ok(content) => match serde_json::from_str::<SettingsFile>(&content) {
                Ok(file) => file.preview_mode,
                Err(e) => {
                    log::warn!("Ignoring unreadable settings at {:?}: {}", path, e);
                    PreviewMode::default()
                }
            },
            Err(_) => PreviewMode::default(),
        };

        Self {
            path,
            mode: RwLock::new(mode),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn set_mode(&self, mode: PreviewMode) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(&SettingsFile { preview_mode: mode })?;
        fs::write(&self.path, json).await?;

        *self.mode.write().unwrap_or_else(|e| e.into_inner()) = mode;
        log::info!("Preview mode set to {}", mode);
        Ok(())
    }
}

impl PreviewModeSource for PreviewSettings {
    fn current_mode(&self) -> PreviewMode {
        *self.mode.read().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn missing_file_defaults_to_raw() {
        let dir = tempdir().unwrap();
        let settings = PreviewSettings::load(dir.path()).await;
        assert_eq!(settings.current_mode(), PreviewMode::Raw);
    }

    #[tokio::test]
    async fn set_mode_persists() {
        let dir = tempdir().unwrap();
        let data_dir = dir.path().join("nested");

        let settings = PreviewSettings::load(&data_dir).await;
        settings.set_mode(PreviewMode::Preflight).await.unwrap();
        assert_eq!(settings.current_mode(), PreviewMode::Preflight);

        let reloaded = PreviewSettings::load(&data_dir).await;
        assert_eq!(reloaded.current_mode(), PreviewMode::Preflight);
    }

    #[tokio::test]
    async fn garbage_file_defaults_to_raw() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join(SETTINGS_FILE), r#"{"preview_mode":"sideways"}"#).unwrap();
        let settings = PreviewSettings::load(dir.path()).await;
        assert_eq!(settings.current_mode(), PreviewMode::Raw);
    }

    #[test]
    fn fixed_mode() {
        assert_eq!(FixedMode(PreviewMode::Message).current_mode(), PreviewMode::Message);
    }
}
