use reqwest::Client;

use super::{ChatRequest, ChatTransport, GatewayError};
use crate::config::LlamaConfig;

/// HTTP transport for the Llama chat-completion endpoint.
pub struct LlamaTransport {
    api_url: String,
    api_key: String,
    timeout: std::time::Duration,
    client: Client,
}

impl LlamaTransport {
    pub fn new(config: &LlamaConfig) -> anyhow::Result<Self> {
        let timeout = config.timeout();
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build HTTP client: {e}"))?;

        if config.api_key.is_empty() {
            log::warn!("Llama transport created without an API key");
        }

        Ok(Self {
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
            timeout,
            client,
        })
    }

    fn classify(&self, err: reqwest::Error) -> GatewayError {
        if err.is_timeout() {
            GatewayError::Timeout(self.timeout)
        } else if err.is_connect() {
            GatewayError::NetworkUnreachable(err.to_string())
        } else {
            GatewayError::Transport(err.to_string())
        }
    }
}

#[async_trait::async_trait]
impl ChatTransport for LlamaTransport {
    async fn post_chat(&self, request: &ChatRequest) -> Result<serde_json::Value, GatewayError> {
        if self.api_url.is_empty() {
            return Err(GatewayError::NetworkUnreachable(
                "no Llama API URL configured".to_string(),
            ));
        }

        log::debug!(
            "Sending {} message(s) to {} ({})",
            request.messages.len(),
            self.api_url,
            request.model
        );

        let resp = self
            .client
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = resp.status();
        let text = resp.text().await.map_err(|e| self.classify(e))?;

        if !status.is_success() {
            return Err(GatewayError::from_status(status.as_u16(), &text));
        }

        log::debug!("Llama API response: {text}");

        serde_json::from_str(&text).map_err(|e| {
            GatewayError::MalformedUpstreamResponse(format!("response is not JSON: {e}"))
        })
    }
}
