//! In-memory transport for exercising the gateway without a network.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use serde_json::{Value, json};

use super::{ChatRequest, ChatTransport, GatewayError};

type Handler = dyn Fn(&ChatRequest) -> Result<Value, GatewayError> + Send + Sync;

/// Replays queued results (or asks a handler), recording every request.
#[derive(Clone)]
pub struct ScriptedTransport {
    script: Arc<Mutex<VecDeque<Result<Value, GatewayError>>>>,
    handler: Option<Arc<Handler>>,
    requests: Arc<Mutex<Vec<ChatRequest>>>,
}

impl ScriptedTransport {
    pub fn new(script: Vec<Result<Value, GatewayError>>) -> Self {
        Self {
            script: Arc::new(Mutex::new(script.into())),
            handler: None,
            requests: Arc::default(),
        }
    }

    pub fn with_handler<F>(handler: F) -> Self
    where
        F: Fn(&ChatRequest) -> Result<Value, GatewayError> + Send + Sync + 'static,
    {
        Self {
            script: Arc::default(),
            handler: Some(Arc::new(handler)),
            requests: Arc::default(),
        }
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ChatTransport for ScriptedTransport {
    async fn post_chat(&self, request: &ChatRequest) -> Result<Value, GatewayError> {
        self.requests.lock().unwrap().push(request.clone());
        if let Some(ref handler) = self.handler {
            return handler(request);
        }
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(GatewayError::Transport("script exhausted".into())))
    }
}

/// A well-formed success envelope.
pub fn completion(text: &str) -> Value {
    json!({ "completion_message": { "content": { "text": text } } })
}

/// Text of the first system message of a request.
pub fn system_text(request: &ChatRequest) -> String {
    request
        .messages
        .iter()
        .find(|m| m.role == crate::model::Role::System)
        .map(|m| m.content.flatten())
        .unwrap_or_default()
}
