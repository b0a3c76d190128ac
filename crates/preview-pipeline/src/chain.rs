use std::sync::Arc;

use preview_compute::{ComputeService, StageAssembler, ViewTransformer};
use preview_core::{ContextSnapshot, PipelineResult, PreviewMode, Result, VariableBag, View};

/// The fixed stage sequence behind every preview mode:
/// assemble, then `user_view`, then re-assemble and `assistant_view`.
///
/// Each stage waits for the previous one's validated response. Nothing is
/// reused between runs.
#[derive(Clone)]
pub struct StageChain {
    assembler: StageAssembler,
    transformer: ViewTransformer,
}

impl StageChain {
    pub fn new(service: Arc<dyn ComputeService>) -> Self {
        Self {
            assembler: StageAssembler::new(Arc::clone(&service)),
            transformer: ViewTransformer::new(service),
        }
    }

    pub async fn run(&self, mode: PreviewMode, snapshot: &ContextSnapshot) -> Result<PipelineResult> {
        let raw = self.assembler.assemble_raw(snapshot).await?;
        if mode == PreviewMode::Raw {
            return Ok(PipelineResult::Raw(raw));
        }

        let dialog = self
            .transformer
            .postprocess(
                raw.messages,
                &snapshot.regex_rules,
                View::UserView,
                VariableBag::new(),
            )
            .await?;
        if mode == PreviewMode::Message {
            return Ok(PipelineResult::Message(dialog));
        }

        // The dialog output becomes the whole history for the model-facing pass.
        let reassembled = self
            .assembler
            .assemble_with_history(snapshot, dialog.messages.clone())
            .await?;
        let preflight = self
            .transformer
            .postprocess(
                reassembled.messages,
                &snapshot.regex_rules,
                View::AssistantView,
                dialog.carry_forward(),
            )
            .await?;

        Ok(PipelineResult::Preflight(preflight))
    }
}
