use std::time::Duration;
use thiserror::Error;

/// Why a call to the chat-completion endpoint did not produce a reply.
///
/// The first five variants are soft failures: [`super::ChatGateway::send`]
/// answers them with the mock responder instead of returning them.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Llama API unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("Llama API rejected credentials (401){}", detail(.message))]
    AuthError { message: Option<String> },

    #[error("Llama API rate limited (429){}", detail(.message))]
    RateLimited { message: Option<String> },

    #[error("Llama API upstream unavailable (502){}", detail(.message))]
    UpstreamUnavailable { message: Option<String> },

    #[error("Llama API bad request (400){}", detail(.message))]
    BadRequest { message: Option<String> },

    #[error("Malformed Llama API response: {0}")]
    MalformedUpstreamResponse(String),

    #[error("Llama API request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Llama API error ({status}): {body}")]
    Api {
        status: u16,
        message: Option<String>,
        body: String,
    },

    #[error("Llama API request failed: {0}")]
    Transport(String),
}

fn detail(message: &Option<String>) -> String {
    match message {
        Some(m) => format!(": {m}"),
        None => String::new(),
    }
}

impl GatewayError {
    /// Classify a non-success HTTP response.
    ///
    /// `body` is kept verbatim; a structured `{"error": {"message": ...}}`
    /// payload is lifted into `message`.
    pub fn from_status(status: u16, body: &str) -> Self {
        let message = api_error_message(body);
        match status {
            400 => Self::BadRequest { message },
            401 => Self::AuthError { message },
            429 => Self::RateLimited { message },
            502 => Self::UpstreamUnavailable { message },
            _ => Self::Api {
                status,
                message,
                body: body.to_string(),
            },
        }
    }

    /// Whether the gateway should substitute a mock reply for this error.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::NetworkUnreachable(_)
                | Self::AuthError { .. }
                | Self::RateLimited { .. }
                | Self::UpstreamUnavailable { .. }
                | Self::BadRequest { .. }
        )
    }

    /// Structured error message returned by the API, if any.
    pub fn api_message(&self) -> Option<&str> {
        match self {
            Self::AuthError { message }
            | Self::RateLimited { message }
            | Self::UpstreamUnavailable { message }
            | Self::BadRequest { message }
            | Self::Api { message, .. } => message.as_deref(),
            _ => None,
        }
    }

    /// HTTP status, when the failure came from a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::AuthError { .. } => Some(401),
            Self::RateLimited { .. } => Some(429),
            Self::UpstreamUnavailable { .. } => Some(502),
            Self::BadRequest { .. } => Some(400),
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Short class name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NetworkUnreachable(_) => "NetworkUnreachable",
            Self::AuthError { .. } => "AuthError",
            Self::RateLimited { .. } => "RateLimited",
            Self::UpstreamUnavailable { .. } => "UpstreamUnavailable",
            Self::BadRequest { .. } => "BadRequest",
            Self::MalformedUpstreamResponse(_) => "MalformedUpstreamResponse",
            Self::Timeout(_) => "Timeout",
            Self::Api { .. } => "ApiError",
            Self::Transport(_) => "Transport",
        }
    }
}

fn api_error_message(body: &str) -> Option<String> {
    let json: serde_json::Value = serde_json::from_str(body).ok()?;
    json["error"]["message"].as_str().map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_classification() {
        assert!(matches!(GatewayError::from_status(400, ""), GatewayError::BadRequest { .. }));
        assert!(matches!(GatewayError::from_status(401, ""), GatewayError::AuthError { .. }));
        assert!(matches!(GatewayError::from_status(429, ""), GatewayError::RateLimited { .. }));
        assert!(matches!(
            GatewayError::from_status(502, ""),
            GatewayError::UpstreamUnavailable { .. }
        ));
        assert!(matches!(
            GatewayError::from_status(500, "oops"),
            GatewayError::Api { status: 500, .. }
        ));
    }

    #[test]
    fn recoverable_set() {
        assert!(GatewayError::NetworkUnreachable("dns".into()).is_recoverable());
        assert!(GatewayError::from_status(401, "").is_recoverable());
        assert!(GatewayError::from_status(429, "").is_recoverable());
        assert!(GatewayError::from_status(502, "").is_recoverable());
        assert!(GatewayError::from_status(400, "").is_recoverable());

        assert!(!GatewayError::from_status(500, "").is_recoverable());
        assert!(!GatewayError::from_status(503, "").is_recoverable());
        assert!(!GatewayError::MalformedUpstreamResponse("x".into()).is_recoverable());
        assert!(!GatewayError::Timeout(Duration::from_secs(1)).is_recoverable());
    }

    #[test]
    fn api_message_extracted_from_body() {
        let err = GatewayError::from_status(500, r#"{"error": {"message": "model overloaded"}}"#);
        assert_eq!(err.api_message(), Some("model overloaded"));
        assert_eq!(err.status(), Some(500));
    }

    #[test]
    fn api_message_absent_for_plain_body() {
        let err = GatewayError::from_status(503, "Service Unavailable");
        assert_eq!(err.api_message(), None);
        assert_eq!(err.to_string(), "Llama API error (503): Service Unavailable");
    }

    #[test]
    fn display_includes_detail() {
        let err = GatewayError::from_status(401, r#"{"error": {"message": "bad key"}}"#);
        assert_eq!(err.to_string(), "Llama API rejected credentials (401): bad key");
        let err = GatewayError::from_status(429, "");
        assert_eq!(err.to_string(), "Llama API rate limited (429)");
    }
}
