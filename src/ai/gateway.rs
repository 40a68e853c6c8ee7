use super::{ChatRequest, ChatTransport, GatewayError, LlamaTransport, MockResponder};
use crate::config::LlamaConfig;
use crate::model::Message;

/// Single entry point for chat completions.
///
/// Flattens structured message content, calls the endpoint once, and
/// substitutes a [`MockResponder`] answer for soft failures (unreachable,
/// 400, 401, 429, 502). Everything else is returned to the caller.
pub struct ChatGateway {
    transport: Box<dyn ChatTransport>,
    model: String,
    mock: MockResponder,
}

impl ChatGateway {
    /// Build a gateway talking HTTP to the configured endpoint.
    pub fn new(config: &LlamaConfig) -> anyhow::Result<Self> {
        let transport = LlamaTransport::new(config)?;
        Ok(Self::with_transport(transport, config.model.clone()))
    }

    /// Build a gateway over any transport.
    pub fn with_transport(
        transport: impl ChatTransport + 'static,
        model: impl Into<String>,
    ) -> Self {
        Self {
            transport: Box::new(transport),
            model: model.into(),
            mock: MockResponder,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send a conversation and return the assistant's reply.
    pub async fn send(&self, messages: &[Message]) -> Result<String, GatewayError> {
        match self.send_without_fallback(messages).await {
            Ok(reply) => Ok(reply),
            Err(e) if e.is_recoverable() => {
                log::warn!(
                    "Llama API call failed ({}): {e}. Falling back to mock response",
                    e.kind()
                );
                Ok(self.mock.respond(messages))
            }
            Err(e) => {
                log::error!("Llama API call failed ({}): {e}", e.kind());
                Err(e)
            }
        }
    }

    /// Like [`send`](Self::send) but never substitutes a mock reply.
    pub async fn send_without_fallback(
        &self,
        messages: &[Message],
    ) -> Result<String, GatewayError> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: messages.iter().map(Message::flattened).collect(),
        };

        let json = self.transport.post_chat(&request).await?;

        json["completion_message"]["content"]["text"]
            .as_str()
            .map(String::from)
            .ok_or_else(|| {
                GatewayError::MalformedUpstreamResponse(
                    "missing completion_message.content.text".to_string(),
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::testing::{ScriptedTransport, completion};
    use crate::model::{ContentPart, ImageUrl, MessageContent};
    use serde_json::json;

    fn conversation() -> Vec<Message> {
        vec![
            Message::system("You are a helpful Instagram assistant."),
            Message::user("What is the tone of the comments?"),
        ]
    }

    #[tokio::test]
    async fn returns_completion_text() {
        let transport = ScriptedTransport::new(vec![Ok(completion("Looks upbeat."))]);
        let gateway = ChatGateway::with_transport(transport.clone(), "m");

        let reply = gateway.send(&conversation()).await.unwrap();
        assert_eq!(reply, "Looks upbeat.");
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn flattens_structured_content_and_sets_model() {
        let transport = ScriptedTransport::new(vec![Ok(completion("ok"))]);
        let gateway = ChatGateway::with_transport(transport.clone(), "Llama-test");

        let messages = vec![Message::user_parts(vec![
            ContentPart::Text { text: "What is".into() },
            ContentPart::ImageUrl {
                image_url: ImageUrl { url: "https://x/y.jpg".into() },
            },
            ContentPart::Text { text: "shown?".into() },
        ])];
        gateway.send(&messages).await.unwrap();

        let sent = transport.requests();
        assert_eq!(sent[0].model, "Llama-test");
        assert_eq!(
            sent[0].messages[0].content,
            MessageContent::Text("What is shown?".into())
        );
    }

    #[tokio::test]
    async fn auth_error_falls_back_to_mock() {
        let transport = ScriptedTransport::new(vec![Err(GatewayError::from_status(401, ""))]);
        let gateway = ChatGateway::with_transport(transport, "m");

        let messages = conversation();
        let reply = gateway.send(&messages).await.unwrap();
        assert_eq!(reply, MockResponder.respond(&messages));
    }

    #[tokio::test]
    async fn every_soft_failure_falls_back() {
        for err in [
            GatewayError::from_status(400, ""),
            GatewayError::from_status(429, ""),
            GatewayError::from_status(502, ""),
            GatewayError::NetworkUnreachable("connection refused".into()),
        ] {
            let gateway = ChatGateway::with_transport(ScriptedTransport::new(vec![Err(err)]), "m");
            let messages = conversation();
            assert_eq!(gateway.send(&messages).await.unwrap(), MockResponder.respond(&messages));
        }
    }

    #[tokio::test]
    async fn server_error_propagates() {
        let transport = ScriptedTransport::new(vec![Err(GatewayError::from_status(
            500,
            r#"{"error": {"message": "internal"}}"#,
        ))]);
        let gateway = ChatGateway::with_transport(transport, "m");

        let err = gateway.send(&conversation()).await.unwrap_err();
        assert_eq!(err.status(), Some(500));
        assert_eq!(err.api_message(), Some("internal"));
    }

    #[tokio::test]
    async fn missing_envelope_field_is_malformed() {
        let transport = ScriptedTransport::new(vec![Ok(json!({"choices": []}))]);
        let gateway = ChatGateway::with_transport(transport, "m");

        let err = gateway.send(&conversation()).await.unwrap_err();
        assert!(matches!(err, GatewayError::MalformedUpstreamResponse(_)));
    }

    #[tokio::test]
    async fn without_fallback_surfaces_soft_failures() {
        let transport = ScriptedTransport::new(vec![Err(GatewayError::from_status(401, ""))]);
        let gateway = ChatGateway::with_transport(transport, "m");

        let err = gateway.send_without_fallback(&conversation()).await.unwrap_err();
        assert!(matches!(err, GatewayError::AuthError { .. }));
    }
}
