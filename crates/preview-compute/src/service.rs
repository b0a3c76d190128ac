use async_trait::async_trait;
use serde_json::Value;

use preview_core::Result;

use crate::protocol::{AssembleRequest, PostprocessRequest};

/// Remote assembly and post-processing backend.
///
/// Implementations return the reply body untouched; validating it is the
/// caller's job.
#[async_trait]
pub trait ComputeService: Send + Sync {
    async fn assemble(&self, request: &AssembleRequest) -> Result<Value>;

    async fn postprocess(&self, request: &PostprocessRequest) -> Result<Value>;
}
