use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_SERVICE_URL: &str = "http://localhost:3000/api";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_DEBOUNCE_MS: u64 = 1000;

const CONFIG_FILE_PATH: &str = "config.toml";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PreviewConfig {
    #[serde(default = "default_service_url")]
    pub service_url: String,
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

fn default_service_url() -> String {
    DEFAULT_SERVICE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_debounce_ms() -> u64 {
    DEFAULT_DEBOUNCE_MS
}

pub fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(".prompt-preview")
}

fn parse_u64_env(key: &str, value: &str) -> Option<u64> {
    match value.trim().parse::<u64>() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            log::warn!("Ignoring {}={:?}: not a non-negative integer", key, value);
            None
        }
    }
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            service_url: default_service_url(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            data_dir: None,
        }
    }
}

impl PreviewConfig {
    /// Defaults, then `~/.prompt-preview/config.json` (or `./config.toml`), then environment.
    pub fn new() -> Self {
        let mut config = Self::load_from(
            &default_data_dir().join("config.json"),
            Path::new(CONFIG_FILE_PATH),
        );
        config.apply_overrides(|key| std::env::var(key).ok());
        config
    }

    pub fn load_from(json_path: &Path, toml_path: &Path) -> Self {
        if json_path.exists() {
            match std::fs::read_to_string(json_path)
                .map_err(|e| e.to_string())
                .and_then(|content| {
                    serde_json::from_str::<PreviewConfig>(&content).map_err(|e| e.to_string())
                }) {
                Ok(config) => return config,
                Err(e) => log::warn!("Ignoring config at {:?}: {}", json_path, e),
            }
        }

        if toml_path.exists() {
            match std::fs::read_to_string(toml_path)
                .map_err(|e| e.to_string())
                .and_then(|content| {
                    toml::from_str::<PreviewConfig>(&content).map_err(|e| e.to_string())
                }) {
                Ok(config) => return config,
                Err(e) => log::warn!("Ignoring config at {:?}: {}", toml_path, e),
            }
        }

        Self::default()
    }

    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("PREVIEW_SERVICE_URL") {
            self.service_url = url;
        }
        if let Some(value) = lookup("PREVIEW_TIMEOUT_SECS") {
            if let Some(secs) = parse_u64_env("PREVIEW_TIMEOUT_SECS", &value) {
                self.request_timeout_secs = secs;
            }
        }
        if let Some(value) = lookup("PREVIEW_DEBOUNCE_MS") {
            if let Some(ms) = parse_u64_env("PREVIEW_DEBOUNCE_MS", &value) {
                self.debounce_ms = ms;
            }
        }
        if let Some(dir) = lookup("PREVIEW_DATA_DIR") {
            self.data_dir = Some(PathBuf::from(dir));
        }
    }

    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(default_data_dir)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}
