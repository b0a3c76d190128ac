use std::path::{Path, PathBuf};
use std::time::SystemTime;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tokio::fs;

use crate::error::{PreviewError, Result};
use crate::message::Message;
use crate::preset::PresetDocument;
use crate::snapshot::{ContextSnapshot, ContextSnapshotProvider, EditingState};

pub const PRESETS_FILE: &str = "presets.json";
pub const WORLD_BOOKS_FILE: &str = "world_books.json";
pub const REGEX_FILE: &str = "regex.json";
pub const CHARACTER_FILE: &str = "character.json";
pub const PERSONA_FILE: &str = "persona.json";
pub const HISTORY_FILE: &str = "history.json";

const WORKSPACE_FILES: [&str; 6] = [
    PRESETS_FILE,
    WORLD_BOOKS_FILE,
    REGEX_FILE,
    CHARACTER_FILE,
    PERSONA_FILE,
    HISTORY_FILE,
];

/// Reads the editing state from a directory of JSON documents.
#[derive(Debug, Clone)]
pub struct DirectorySnapshotProvider {
    base_path: PathBuf,
}

impl DirectorySnapshotProvider {
    pub fn new(base_path: impl AsRef<Path>) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    pub async fn load_state(&self) -> Result<EditingState> {
        Ok(EditingState {
            presets: self
                .read_document::<PresetDocument>(PRESETS_FILE)
                .await?
                .unwrap_or_default(),
            world_book_entries: self
                .read_document::<Vec<Value>>(WORLD_BOOKS_FILE)
                .await?
                .unwrap_or_default(),
            regex_rules: self
                .read_document::<Vec<Value>>(REGEX_FILE)
                .await?
                .unwrap_or_default(),
            character: self
                .read_document::<Map<String, Value>>(CHARACTER_FILE)
                .await?,
            persona: self
                .read_document::<Map<String, Value>>(PERSONA_FILE)
                .await?,
            history: self
                .read_document::<Vec<Message>>(HISTORY_FILE)
                .await?
                .unwrap_or_default(),
        })
    }

    /// Latest modification time across the workspace documents.
    ///
    /// `None` when none of them exist.
    pub async fn fingerprint(&self) -> Option<SystemTime> {
        let mut latest = None;
        for name in WORKSPACE_FILES {
            if let Ok(metadata) = fs::metadata(self.base_path.join(name)).await {
                if let Ok(modified) = metadata.modified() {
                    latest = latest.max(Some(modified));
                }
            }
        }
        latest
    }

    async fn read_document<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>> {
        let path = self.base_path.join(name);
        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(PreviewError::Snapshot(format!(
                    "failed to read {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| PreviewError::Snapshot(format!("invalid {}: {}", name, e)))
    }
}

#[async_trait]
impl ContextSnapshotProvider for DirectorySnapshotProvider {
    async fn snapshot(&self) -> Result<ContextSnapshot> {
        let state = self.load_state().await?;
        log::debug!(
            "Loaded workspace {:?}: {} enabled prompt slots, {} history messages, {} world-book entries",
            self.base_path,
            state.presets.enabled_prompts().count(),
            state.history.len(),
            state.world_book_entries.len()
        );
        Ok(ContextSnapshot::from_state(state))
    }
}
