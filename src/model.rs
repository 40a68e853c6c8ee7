use serde::{Deserialize, Serialize};
use std::fmt;

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One part of a structured (vision-style) message body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageUrl {
    pub url: String,
}

/// Message body: either plain text or a list of content parts.
///
/// The chat-completion endpoint only accepts text, so structured content is
/// flattened with [`MessageContent::flatten`] before it leaves the process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

impl MessageContent {
    /// Collapse to plain text. Text parts are joined with a single space,
    /// non-text parts are dropped.
    pub fn flatten(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Parts(parts) => parts
                .iter()
                .filter_map(|part| match part {
                    ContentPart::Text { text } => Some(text.as_str()),
                    ContentPart::ImageUrl { .. } => None,
                })
                .collect::<Vec<_>>()
                .join(" ")
                .trim()
                .to_string(),
        }
    }

    /// Borrow the content if it is already plain text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Parts(_) => None,
        }
    }
}

/// A role-tagged chat message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: MessageContent,
}

impl Message {
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: MessageContent::Text(text.into()),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: MessageContent::Text(text.into()),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: MessageContent::Text(text.into()),
        }
    }

    /// A user message carrying structured content parts.
    pub fn user_parts(parts: Vec<ContentPart>) -> Self {
        Self {
            role: Role::User,
            content: MessageContent::Parts(parts),
        }
    }

    /// Same role, content flattened to plain text.
    pub fn flattened(&self) -> Self {
        Self {
            role: self.role,
            content: MessageContent::Text(self.content.flatten()),
        }
    }
}

/// A comment on a post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub username: String,
    pub text: String,
    pub timestamp: String,
}

/// A feed post as provided by the post data source.
///
/// Field names serialize in camelCase (`userAvatar`, `imageUrl`) to match the
/// feed's JSON shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: String,
    pub username: String,
    pub user_avatar: String,
    pub image_url: String,
    pub caption: String,
    pub likes: u64,
    pub timestamp: String,
    #[serde(default)]
    pub comments: Vec<Comment>,
}

impl Post {
    /// Caption words starting with `#`, space-separated.
    pub fn hashtags(&self) -> String {
        self.caption
            .split(' ')
            .filter(|word| word.starts_with('#'))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Comments rendered as `user: text`, separated by ` | `.
    pub fn comment_digest(&self) -> String {
        self.comments
            .iter()
            .map(|c| format!("{}: {}", c.username, c.text))
            .collect::<Vec<_>>()
            .join(" | ")
    }
}

/// A post paired with its AI-derived image description. Search-only.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedPost {
    pub post: Post,
    pub image_description: String,
}

/// Which capabilities of the chat backend are currently usable.
///
/// Produced fresh by every [`crate::ai::ChatGateway::probe`] call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilityReport {
    pub chat_endpoint: bool,
    pub vision_endpoint: bool,
    pub simulated_vision_capability: bool,
    pub context_extraction_active: bool,
    pub supported_features: Vec<String>,
    pub error: Option<String>,
}

impl fmt::Display for CapabilityReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mark = |ok: bool, bad: &'static str| if ok { "✅ Working" } else { bad };

        writeln!(f, "AI Analysis Capabilities:")?;
        writeln!(f)?;
        writeln!(f, "- Text Chat API: {}", mark(self.chat_endpoint, "❌ Not Working"))?;
        writeln!(f, "- Vision API: {}", mark(self.vision_endpoint, "❌ Not Available"))?;
        writeln!(
            f,
            "- Context Extraction: {}",
            mark(self.context_extraction_active, "❌ Not Working")
        )?;

        if !self.supported_features.is_empty() {
            writeln!(f)?;
            writeln!(f, "Supported Features:")?;
            for feature in &self.supported_features {
                writeln!(f, "- {feature}")?;
            }
        }

        if let Some(ref err) = self.error {
            writeln!(f)?;
            writeln!(f, "Error: {err}")?;
        }

        Ok(())
    }
}
