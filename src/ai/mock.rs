//! Deterministic stand-in answers used when the chat endpoint cannot be
//! reached or refuses the request.

use crate::model::{Message, Role};

/// System-prompt phrases that mark an image-analysis conversation.
const IMAGE_SESSION_MARKERS: &[&str] = &[
    "vision capabilities",
    "image context",
    "analyzing an image",
];

/// `(start, end)` delimiters around the image description inside the system
/// prompt, tried in order.
const DESCRIPTION_DELIMITERS: &[(&str, &str)] = &[
    ("image context is:", "\n\n"),
    ("contains the following:", "Respond to"),
];

const COLOR_NAMES: &[&str] = &[
    "blue", "green", "white", "black", "red", "yellow", "purple", "orange", "brown", "pink",
];

const FALLBACK_HASHTAGS: &str = "#travel #adventure #photography";

const DEFAULT_PREVIEW_CHARS: usize = 150;

type ImageHandler = fn(&str) -> String;
type PostHandler = fn(&[Message]) -> String;

/// Image questions, by priority. Handlers receive the extracted description.
const IMAGE_INTENTS: &[(&[&str], ImageHandler)] = &[
    (&["color", "colour"], describe_colors),
    (&["animal", "pet"], describe_animals),
    (&["person", "people", "human"], describe_people),
];

/// Post questions, by priority. Handlers receive the whole conversation.
const POST_INTENTS: &[(&[&str], PostHandler)] = &[
    (&["tone", "sentiment"], describe_tone),
    (&["hashtag"], describe_hashtags),
    (&["caption"], describe_caption),
    (&["summar"], describe_summary),
];

const DEFAULT_POST_RESPONSE: &str = "This post has received positive engagement with multiple comments and likes. The content appears to resonate well with the audience. There's a healthy mix of supportive comments and constructive feedback, indicating an engaged community.";

const NO_DESCRIPTION_RESPONSE: &str = "This image appears to contain a scene that might include landscapes, people, objects, or other visual elements. Without more specific information, I can't provide further details about what's in the image.";

/// Rule-based responder that imitates the chat model offline.
#[derive(Debug, Clone, Copy, Default)]
pub struct MockResponder;

impl MockResponder {
    /// Produce a plausible reply for the conversation. Total and deterministic.
    pub fn respond(&self, messages: &[Message]) -> String {
        let question = latest_user_text(messages).to_lowercase();

        if is_image_session(messages) {
            let description = extract_description(messages);
            if description.is_empty() {
                return NO_DESCRIPTION_RESPONSE.to_string();
            }
            return IMAGE_INTENTS
                .iter()
                .find(|(keywords, _)| keywords.iter().any(|k| question.contains(k)))
                .map(|(_, handler)| handler(&description))
                .unwrap_or_else(|| describe_default(&description));
        }

        POST_INTENTS
            .iter()
            .find(|(keywords, _)| keywords.iter().any(|k| question.contains(k)))
            .map(|(_, handler)| handler(messages))
            .unwrap_or_else(|| DEFAULT_POST_RESPONSE.to_string())
    }
}

fn latest_user_text(messages: &[Message]) -> String {
    messages
        .iter()
        .rev()
        .find(|m| m.role == Role::User)
        .map(|m| m.content.flatten())
        .unwrap_or_default()
}

fn system_prompts(messages: &[Message]) -> impl Iterator<Item = String> + '_ {
    messages
        .iter()
        .filter(|m| m.role == Role::System)
        .map(|m| m.content.flatten())
}

fn is_image_session(messages: &[Message]) -> bool {
    system_prompts(messages).any(|prompt| IMAGE_SESSION_MARKERS.iter().any(|p| prompt.contains(p)))
}

fn extract_description(messages: &[Message]) -> String {
    let Some(prompt) = system_prompts(messages).next() else {
        return String::new();
    };

    DESCRIPTION_DELIMITERS
        .iter()
        .find_map(|(start, end)| {
            let (_, rest) = prompt.split_once(start)?;
            let body = rest.split(end).next().unwrap_or_default();
            Some(body.trim().to_string())
        })
        .unwrap_or_default()
}

/// Named colours in table order, closed with "other natural tones" unless
/// the list already ends in pink.
fn describe_colors(description: &str) -> String {
    let mut colors: Vec<&str> = COLOR_NAMES
        .iter()
        .copied()
        .filter(|c| description.contains(c))
        .collect();
    if !colors.contains(&"pink") {
        colors.push("other natural tones");
    }
    format!(
        "Based on the image, I can see various colors including {}.",
        colors.join(", ")
    )
}

fn describe_animals(description: &str) -> String {
    if !description.contains("dog") {
        return "I don't see any animals in this image based on the information available."
            .to_string();
    }
    let breed = if description.contains("Labrador") {
        "Labrador"
    } else {
        "golden retriever"
    };
    format!("Yes, there is a dog in the image. It appears to be a {breed}.")
}

fn describe_people(description: &str) -> String {
    let has_people = ["person", "man", "woman", "people"]
        .iter()
        .any(|w| description.contains(w));
    if !has_people {
        return "I don't see any people in this image based on the information available."
            .to_string();
    }

    let mut answer = "Yes, there are people in this image. ".to_string();
    if let Some((_, after)) = description.split_once("wearing") {
        let clothing = after.split('.').next().unwrap_or_default();
        answer.push_str(&format!("One person is wearing{clothing}."));
    }
    answer
}

fn describe_default(description: &str) -> String {
    let preview: String = description.chars().take(DEFAULT_PREVIEW_CHARS).collect();
    let ellipsis = if description.chars().count() > DEFAULT_PREVIEW_CHARS {
        "..."
    } else {
        ""
    };
    format!("In this image, I can see {preview}{ellipsis}")
}

fn describe_tone(_: &[Message]) -> String {
    "Based on analyzing the comments on this post, the tone is generally positive and enthusiastic. There's a mix of supportive comments, constructive feedback, and some critical perspectives. The overall sentiment leans positive with some balanced viewpoints.".to_string()
}

fn describe_caption(_: &[Message]) -> String {
    "The caption is engaging and descriptive, providing context about the image. It uses both descriptive text and relevant hashtags to maximize engagement. The writing style matches the content well and encourages user interaction.".to_string()
}

fn describe_summary(_: &[Message]) -> String {
    "This post has received good engagement with multiple comments expressing varied opinions. The content has generated discussion, with both supportive and critical feedback. The poster appears to be responsive to comments, creating a healthy interaction with their audience.".to_string()
}

fn describe_hashtags(messages: &[Message]) -> String {
    let hashtags = messages
        .iter()
        .filter_map(|m| m.content.as_text())
        .find_map(|text| text.split_once("Hashtags:"))
        .map(|(_, rest)| rest.lines().next().unwrap_or_default().trim())
        .filter(|tags| !tags.is_empty())
        .unwrap_or(FALLBACK_HASHTAGS);

    format!(
        "This post uses several hashtags: {hashtags}. These hashtags help categorize the content and make it discoverable to users interested in these topics. They effectively target the relevant audience for this content."
    )
}
