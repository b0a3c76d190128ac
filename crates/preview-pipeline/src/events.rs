use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use preview_core::PreviewMode;

/// Lifecycle notifications broadcast by the orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PipelineEvent {
    Scheduled {
        mode: Option<PreviewMode>,
        delay_ms: u64,
    },
    Started {
        mode: PreviewMode,
    },
    Completed {
        mode: PreviewMode,
        at: DateTime<Utc>,
    },
    Failed {
        mode: PreviewMode,
        error: String,
    },
    /// A generation finished after `clear()` and its output was dropped.
    Discarded {
        mode: PreviewMode,
    },
    Cleared,
}

/// What a `generate_now` call ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationOutcome {
    Completed,
    Failed,
    /// Another generation was in flight; nothing happened.
    Skipped,
    Discarded,
}
