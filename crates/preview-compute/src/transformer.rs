use std::sync::Arc;

use serde_json::Value;

use preview_core::{Message, Result, VariableBag, View, ViewResult};

use crate::protocol::{parse_postprocess_response, PostprocessRequest, RulesEnvelope};
use crate::service::ComputeService;

/// Runs a post-processing pass for one view.
#[derive(Clone)]
pub struct ViewTransformer {
    service: Arc<dyn ComputeService>,
}

impl ViewTransformer {
    pub fn new(service: Arc<dyn ComputeService>) -> Self {
        Self { service }
    }

    pub async fn postprocess(
        &self,
        messages: Vec<Message>,
        rules: &[Value],
        view: View,
        variables: VariableBag,
    ) -> Result<ViewResult> {
        let request = PostprocessRequest {
            messages,
            rules: RulesEnvelope {
                rules: rules.to_vec(),
            },
            view,
            variables,
        };

        log::debug!(
            "Post-processing {} messages for {} with {} rules",
            request.messages.len(),
            view,
            request.rules.rules.len()
        );
        let response = self.service.postprocess(&request).await?;
        parse_postprocess_response(response)
    }
}
