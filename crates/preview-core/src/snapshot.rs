use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;
use crate::message::Message;
use crate::preset::PresetDocument;

/// The editable documents a preview is built from.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EditingState {
    #[serde(default)]
    pub presets: PresetDocument,
    #[serde(default)]
    pub world_book_entries: Vec<Value>,
    #[serde(default)]
    pub regex_rules: Vec<Value>,
    #[serde(default)]
    pub character: Option<Map<String, Value>>,
    #[serde(default)]
    pub persona: Option<Map<String, Value>>,
    #[serde(default)]
    pub history: Vec<Message>,
}

/// Point-in-time copy of [`EditingState`]. Owned, so later edits never leak in.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContextSnapshot {
    pub presets: PresetDocument,
    pub world_book_entries: Vec<Value>,
    pub regex_rules: Vec<Value>,
    pub character: Option<Map<String, Value>>,
    pub persona: Option<Map<String, Value>>,
    pub history: Vec<Message>,
    pub built_at: DateTime<Utc>,
}

impl ContextSnapshot {
    pub fn capture(state: &EditingState) -> Self {
        Self::from_state(state.clone())
    }

    pub fn from_state(state: EditingState) -> Self {
        Self {
            presets: state.presets,
            world_book_entries: state.world_book_entries,
            regex_rules: state.regex_rules,
            character: state.character,
            persona: state.persona,
            history: state.history,
            built_at: Utc::now(),
        }
    }

    pub fn empty() -> Self {
        Self::from_state(EditingState::default())
    }
}

#[async_trait]
pub trait ContextSnapshotProvider: Send + Sync {
    /// Capture the current editing state. Must not mutate anything.
    async fn snapshot(&self) -> Result<ContextSnapshot>;
}

/// In-memory editing state shared with whatever edits it.
#[derive(Debug, Default)]
pub struct SharedSnapshotProvider {
    state: RwLock<EditingState>,
}

impl SharedSnapshotProvider {
    pub fn new(state: EditingState) -> Self {
        Self {
            state: RwLock::new(state),
        }
    }

    pub fn update<F>(&self, edit: F)
    where
        F: FnOnce(&mut EditingState),
    {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        edit(&mut state);
    }

    pub fn replace(&self, state: EditingState) {
        self.update(|current| *current = state);
    }

    pub fn current(&self) -> EditingState {
        self.state.read().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl ContextSnapshotProvider for SharedSnapshotProvider {
    async fn snapshot(&self) -> Result<ContextSnapshot> {
        let state = self.state.read().unwrap_or_else(|e| e.into_inner());
        Ok(ContextSnapshot::capture(&state))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn snapshot_is_detached_from_live_state() {
        let provider = SharedSnapshotProvider::new(EditingState {
            history: vec![Message::user("hi")],
            ..Default::default()
        });

        let snapshot = provider.snapshot().await.unwrap();
        provider.update(|state| {
            state.history.push(Message::assistant("hello"));
            state.character = Some(Map::new());
        });

        assert_eq!(snapshot.history, vec![Message::user("hi")]);
        assert!(snapshot.character.is_none());
        assert_eq!(provider.current().history.len(), 2);
    }

    #[tokio::test]
    async fn each_snapshot_is_restamped() {
        let provider = SharedSnapshotProvider::default();
        let first = provider.snapshot().await.unwrap();
        let second = provider.snapshot().await.unwrap();
        assert!(second.built_at >= first.built_at);
        assert!(first.history.is_empty());
        assert!(first.presets.is_empty());
    }
}
