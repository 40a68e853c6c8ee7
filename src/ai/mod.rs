mod analysis;
mod context;
mod error;
mod gateway;
mod llama;
mod mock;
mod probe;

#[cfg(test)]
pub(crate) mod testing;

pub use analysis::{API_ERROR_PREFIX, IMAGE_ANALYSIS_APOLOGY, ImageAnalyzer, PostChat};
pub use context::{GENERIC_DESCRIPTION, UNDETERMINED_DESCRIPTION, describe_image_url};
pub use error::GatewayError;
pub use gateway::ChatGateway;
pub use llama::LlamaTransport;
pub use mock::MockResponder;
pub use probe::{PROBE_IMAGE_URL, PROBE_QUESTION};

use crate::model::Message;
use serde::Serialize;

/// Body of a chat-completion request. Message content is always plain text
/// by the time a request is built.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<Message>,
}

/// Trait for chat-completion transports.
///
/// [`LlamaTransport`] talks HTTP; implement this trait to put
/// [`ChatGateway`] in front of anything else that can answer a
/// [`ChatRequest`].
///
/// Implementations return the decoded JSON envelope on success and classify
/// every failure into a [`GatewayError`] (see [`GatewayError::from_status`]).
///
/// # Example
///
/// ```rust,no_run
/// use llama_feed::ai::{ChatGateway, ChatRequest, ChatTransport, GatewayError};
/// use llama_feed::model::Message;
///
/// struct Echo;
///
/// #[async_trait::async_trait]
/// impl ChatTransport for Echo {
///     async fn post_chat(&self, request: &ChatRequest) -> Result<serde_json::Value, GatewayError> {
///         let text = request.messages.last().map(|m| m.content.flatten()).unwrap_or_default();
///         Ok(serde_json::json!({ "completion_message": { "content": { "text": text } } }))
///     }
/// }
///
/// # async fn example() -> Result<(), GatewayError> {
/// let gateway = ChatGateway::with_transport(Echo, "echo");
/// let reply = gateway.send(&[Message::user("hi")]).await?;
/// assert_eq!(reply, "hi");
/// # Ok(())
/// # }
/// ```
#[async_trait::async_trait]
pub trait ChatTransport: Send + Sync {
    /// Send one request. No retries.
    async fn post_chat(&self, request: &ChatRequest) -> Result<serde_json::Value, GatewayError>;
}
