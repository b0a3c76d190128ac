use std::sync::Arc;

use preview_core::{ContextSnapshot, Message, RawResult, Result};

use crate::protocol::{parse_assemble_response, AssembleRequest};
use crate::service::ComputeService;

/// Builds the raw message sequence. One round trip per call, no retries.
#[derive(Clone)]
pub struct StageAssembler {
    service: Arc<dyn ComputeService>,
}

impl StageAssembler {
    pub fn new(service: Arc<dyn ComputeService>) -> Self {
        Self { service }
    }

    pub async fn assemble_raw(&self, snapshot: &ContextSnapshot) -> Result<RawResult> {
        self.assemble(AssembleRequest::from_snapshot(snapshot)).await
    }

    /// Assemble with `history` standing in for the snapshot's conversation.
    pub async fn assemble_with_history(
        &self,
        snapshot: &ContextSnapshot,
        history: Vec<Message>,
    ) -> Result<RawResult> {
        self.assemble(AssembleRequest::from_snapshot(snapshot).with_history(history))
            .await
    }

    async fn assemble(&self, request: AssembleRequest) -> Result<RawResult> {
        log::debug!(
            "Assembling with {} history messages, {} world-book entries",
            request.history.len(),
            request.world_books.len()
        );
        let response = self.service.assemble(&request).await?;
        let raw = parse_assemble_response(response)?;
        log::debug!("Assembled {} messages", raw.messages.len());
        Ok(raw)
    }
}
