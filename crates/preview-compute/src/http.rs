use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;

use preview_core::{PreviewConfig, PreviewError, Result};

use crate::protocol::{AssembleRequest, PostprocessRequest};
use crate::service::ComputeService;

/// [`ComputeService`] over HTTP: `POST {base}/assemble` and `POST {base}/postprocess`.
pub struct HttpComputeService {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl HttpComputeService {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(preview_core::config::DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn from_config(config: &PreviewConfig) -> Self {
        Self::new(config.service_url.clone()).with_timeout(config.request_timeout())
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post_json<B: Serialize + Sync>(&self, endpoint: &str, body: &B) -> Result<Value> {
        let url = format!("{}/{}", self.base_url, endpoint);
        log::debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .timeout(self.timeout)
            .json(body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        let text = response.text().await.map_err(transport_error)?;

        if !status.is_success() {
            log::warn!("{} returned HTTP {}", url, status);
            return Err(PreviewError::Http {
                status: status.as_u16(),
                body: text,
            });
        }

        serde_json::from_str(&text).map_err(|e| {
            PreviewError::malformed(format!("{} response is not JSON: {}", endpoint, e))
        })
    }
}

fn transport_error(err: reqwest::Error) -> PreviewError {
    if err.is_timeout() {
        PreviewError::Transport(format!("request timed out: {}", err))
    } else {
        PreviewError::Transport(err.to_string())
    }
}

#[async_trait]
impl ComputeService for HttpComputeService {
    async fn assemble(&self, request: &AssembleRequest) -> Result<Value> {
        self.post_json("assemble", request).await
    }

    async fn postprocess(&self, request: &PostprocessRequest) -> Result<Value> {
        self.post_json("postprocess", request).await
    }
}
