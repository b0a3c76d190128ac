use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use preview_core::PipelineResults;

/// A debounced run that has not fired yet.
#[derive(Debug)]
pub(crate) struct PendingRun {
    pub id: u64,
    pub token: CancellationToken,
}

/// Mutable orchestrator state. Only the orchestrator writes it.
#[derive(Debug, Default)]
pub(crate) struct PipelineState {
    pub generating: bool,
    pub last_error: Option<String>,
    pub last_generated_at: Option<DateTime<Utc>>,
    pub results: PipelineResults,
    pub pending: Option<PendingRun>,
    /// Bumped by every `clear()`; generations started under an older epoch drop their output.
    pub epoch: u64,
    pub next_run_id: u64,
}

impl PipelineState {
    pub fn status(&self) -> PipelineStatus {
        PipelineStatus {
            generating: self.generating,
            last_error: self.last_error.clone(),
            last_generated_at: self.last_generated_at,
            results: self.results.clone(),
            pending: self.pending.is_some(),
        }
    }

    pub fn cancel_pending(&mut self) -> bool {
        match self.pending.take() {
            Some(run) => {
                run.token.cancel();
                true
            }
            None => false,
        }
    }
}

/// Point-in-time copy of the orchestrator state, for display.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct PipelineStatus {
    pub generating: bool,
    pub last_error: Option<String>,
    pub last_generated_at: Option<DateTime<Utc>>,
    pub results: PipelineResults,
    /// A debounced run is armed and has not fired.
    pub pending: bool,
}
