use std::sync::Arc;

use super::{ChatGateway, GatewayError, describe_image_url};
use crate::model::{ContentPart, Message, Post, Role};

/// Prefix of answers that carry a structured error from the API.
pub const API_ERROR_PREFIX: &str = "Error from Llama API:";

/// Final answer when both image-analysis strategies fail.
pub const IMAGE_ANALYSIS_APOLOGY: &str = "I'm currently having trouble analyzing this image. The Llama API is configured as a text-only model without vision capabilities. We're using our best effort to simulate image analysis based on context from the image URL.";

const POST_ANALYSIS_APOLOGY: &str =
    "Sorry, I encountered an error while analyzing. Please try again later.";

const CHAT_APOLOGY: &str =
    "I apologize, but I encountered an error while processing your request.";

const ASSISTANT_PERSONA: &str = "You are a helpful Instagram assistant. You can analyze posts, captions, and comments. You can provide insights about tone, sentiment, and content of posts.";

const CHAT_GREETING: &str = "I can help analyze this post! You can ask me about the tone of the comments, hashtags, sentiment, or any other questions about the post content.";

const DEFAULT_VISION_QUESTION: &str = "What can you see in this image?";
const DEFAULT_CONTEXT_QUESTION: &str = "What is in this image? Describe it in detail.";

/// Answers questions about images and posts using the text-only chat model.
///
/// Every public method resolves to a string; failures become an API error
/// string or an apology.
#[derive(Clone)]
pub struct ImageAnalyzer {
    gateway: Arc<ChatGateway>,
}

impl ImageAnalyzer {
    pub fn new(gateway: Arc<ChatGateway>) -> Self {
        Self { gateway }
    }

    pub fn gateway(&self) -> &ChatGateway {
        &self.gateway
    }

    /// Answer `question` about the image at `image_url`.
    ///
    /// Tries the simulated-vision prompt first, then the context-assisted
    /// prompt, each exactly once.
    pub async fn analyze(&self, image_url: &str, question: &str) -> String {
        log::info!("Analyzing image: {image_url}");
        let context = describe_image_url(image_url);

        let vision_err = match self.gateway.send(&vision_prompt(&context, question)).await {
            Ok(answer) => return answer,
            Err(e) => e,
        };
        log::warn!(
            "Simulated vision analysis failed ({}): {vision_err}; retrying with context prompt",
            vision_err.kind()
        );

        match self.gateway.send(&context_prompt(&context, question)).await {
            Ok(answer) => answer,
            Err(e) => {
                log::error!("Image analysis failed ({}): {e}", e.kind());
                failure_answer(&e, IMAGE_ANALYSIS_APOLOGY)
            }
        }
    }

    /// Answer `query` about a post's caption, hashtags, comments and likes.
    pub async fn analyze_post(&self, post: &Post, query: &str) -> String {
        log::info!("Analyzing post {}", post.id);
        let messages = vec![
            Message::system(ASSISTANT_PERSONA),
            Message::user(format!(
                "The user is asking about this Instagram post:\n{}",
                post_context(post)
            )),
            Message::user(query),
        ];

        match self.gateway.send(&messages).await {
            Ok(answer) => answer,
            Err(e) => {
                log::error!("Post analysis failed ({}): {e}", e.kind());
                failure_answer(&e, POST_ANALYSIS_APOLOGY)
            }
        }
    }
}

fn failure_answer(err: &GatewayError, apology: &str) -> String {
    match err.api_message() {
        Some(message) => format!("{API_ERROR_PREFIX} {message}"),
        None => apology.to_string(),
    }
}

fn vision_prompt(context: &str, question: &str) -> Vec<Message> {
    let question = if question.trim().is_empty() {
        DEFAULT_VISION_QUESTION
    } else {
        question
    };
    vec![
        Message::system(format!(
            "You are a multimodal AI with vision capabilities.\n\
             You are analyzing an image that contains the following:\n\n\
             {context}\n\n\
             Respond to the user's question about this image as if you directly analyzed the image pixels. \
             Be detailed and specific in your analysis. If the question asks about something not visible \
             in the description provided, politely explain that you can't see that aspect in the image."
        )),
        Message::user_parts(vec![ContentPart::Text {
            text: question.to_string(),
        }]),
    ]
}

fn context_prompt(context: &str, question: &str) -> Vec<Message> {
    let question = if question.trim().is_empty() {
        DEFAULT_CONTEXT_QUESTION
    } else {
        question
    };
    vec![
        Message::system(format!(
            "You are a vision-capable assistant that can analyze images. For this specific image, I'll provide context about what it contains.\n\n\
             The image context is: {context}\n\n\
             Please answer questions about this image as if you could see it, based on the context provided. \
             If you can't answer something specific that would require seeing details not in the context, \
             indicate that those specific details aren't available in the context provided."
        )),
        Message::user(question),
    ]
}

/// Caption, username, hashtags, comments and likes, one per line.
fn post_context(post: &Post) -> String {
    format!(
        "Caption: {}\nUsername: {}\nHashtags: {}\nComments: {}\nLikes: {}",
        post.caption,
        post.username,
        post.hashtags(),
        post.comment_digest(),
        post.likes
    )
}

/// A chat about one post.
///
/// Every request carries the persona, the post context and all questions
/// asked so far; earlier assistant replies stay in the transcript but are
/// not resent.
pub struct PostChat {
    post: Post,
    transcript: Vec<Message>,
}

impl PostChat {
    pub fn new(post: Post) -> Self {
        Self {
            post,
            transcript: vec![Message::system(ASSISTANT_PERSONA), Message::assistant(CHAT_GREETING)],
        }
    }

    pub fn post(&self) -> &Post {
        &self.post
    }

    /// Everything said so far, including the greeting.
    pub fn transcript(&self) -> &[Message] {
        &self.transcript
    }

    /// Ask a question. Blank questions are ignored and return `None`.
    pub async fn ask(&mut self, gateway: &ChatGateway, question: &str) -> Option<String> {
        if question.trim().is_empty() {
            return None;
        }

        self.transcript.push(Message::user(question));

        let mut request = vec![
            Message::system(ASSISTANT_PERSONA),
            Message::user(format!(
                "I'm looking at this Instagram post:\n{}",
                post_context(&self.post)
            )),
        ];
        request.extend(self.transcript.iter().filter(|m| m.role == Role::User).cloned());

        let reply = match gateway.send(&request).await {
            Ok(reply) => reply,
            Err(e) => {
                log::error!("Post chat failed ({}): {e}", e.kind());
                format!("{CHAT_APOLOGY} {}", chat_failure_hint(&e))
            }
        };

        self.transcript.push(Message::assistant(reply.clone()));
        Some(reply)
    }
}

/// What the user is told after the chat apology, by failure class.
fn chat_failure_hint(err: &GatewayError) -> String {
    let hint = match err.status() {
        Some(401) => {
            "There seems to be an authentication issue with the AI service. \
             Please check your API key."
        }
        Some(429) => {
            "The AI service is currently receiving too many requests. Please try again later."
        }
        Some(502) => {
            "Could not connect to the Llama API server. \
             The service might be down or the endpoint URL may be incorrect."
        }
        Some(status) => {
            return format!(
                "There was an issue with the AI service (Error {status}). Please try again later."
            );
        }
        None => match err {
            GatewayError::NetworkUnreachable(_)
            | GatewayError::Timeout(_)
            | GatewayError::Transport(_) => {
                "Could not reach the AI service. Please check your internet connection."
            }
            _ => "Something unexpected happened. Please try again.",
        },
    };
    hint.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::testing::{ScriptedTransport, completion, system_text};
    use crate::ai::MockResponder;
    use crate::model::{Comment, MessageContent};

    fn analyzer(transport: ScriptedTransport) -> ImageAnalyzer {
        ImageAnalyzer::new(Arc::new(ChatGateway::with_transport(transport, "m")))
    }

    fn sample_post() -> Post {
        Post {
            id: "4".into(),
            username: "coffee_lover".into(),
            user_avatar: "https://example.com/a.png".into(),
            image_url: "https://picsum.photos/id/42/800/800".into(),
            caption: "Morning ritual #coffee #latteart".into(),
            likes: 87,
            timestamp: "3h".into(),
            comments: vec![Comment {
                id: "c1".into(),
                username: "barista".into(),
                text: "Beautiful pour".into(),
                timestamp: "2h".into(),
            }],
        }
    }

    #[tokio::test]
    async fn vision_path_embeds_context() {
        let transport = ScriptedTransport::new(vec![Ok(completion("A puppy."))]);
        let answer = analyzer(transport.clone())
            .analyze("https://picsum.photos/id/237/800/800", "What is it?")
            .await;

        assert_eq!(answer, "A puppy.");
        let sent = transport.requests();
        assert_eq!(sent.len(), 1);
        let system = system_text(&sent[0]);
        assert!(system.contains("vision capabilities"));
        assert!(system.contains("Labrador"));
        assert_eq!(sent[0].messages[1].content, MessageContent::Text("What is it?".into()));
    }

    #[tokio::test]
    async fn falls_back_to_context_prompt() {
        let transport = ScriptedTransport::new(vec![
            Ok(serde_json::json!({})),
            Ok(completion("From context.")),
        ]);
        let answer = analyzer(transport.clone())
            .analyze("https://picsum.photos/id/25/800/800", "")
            .await;

        assert_eq!(answer, "From context.");
        let sent = transport.requests();
        assert_eq!(sent.len(), 2);
        assert!(system_text(&sent[1]).contains("The image context is: A beautifully plated pasta"));
        assert_eq!(
            sent[1].messages[1].content,
            MessageContent::Text(DEFAULT_CONTEXT_QUESTION.into())
        );
    }

    #[tokio::test]
    async fn total_failure_returns_apology() {
        let transport = ScriptedTransport::new(vec![
            Err(GatewayError::Transport("reset".into())),
            Err(GatewayError::Timeout(std::time::Duration::from_secs(20))),
        ]);
        let answer = analyzer(transport.clone()).analyze("https://x/y.jpg", "q").await;
        assert_eq!(answer, IMAGE_ANALYSIS_APOLOGY);
        assert_eq!(transport.calls(), 2);
    }

    #[tokio::test]
    async fn structured_api_error_is_reported() {
        let transport = ScriptedTransport::new(vec![
            Err(GatewayError::from_status(500, "oops")),
            Err(GatewayError::from_status(503, r#"{"error": {"message": "try later"}}"#)),
        ]);
        let answer = analyzer(transport).analyze("https://x/y.jpg", "q").await;
        assert_eq!(answer, "Error from Llama API: try later");
    }

    #[tokio::test]
    async fn offline_answer_comes_from_mock() {
        let transport =
            ScriptedTransport::new(vec![Err(GatewayError::NetworkUnreachable("refused".into()))]);
        let answer = analyzer(transport)
            .analyze("https://picsum.photos/id/237/800/800", "Is there a pet?")
            .await;
        assert_eq!(answer, "Yes, there is a dog in the image. It appears to be a Labrador.");
    }

    #[tokio::test]
    async fn post_prompt_carries_post_fields() {
        let transport = ScriptedTransport::new(vec![Ok(completion("Positive."))]);
        let answer = analyzer(transport.clone())
            .analyze_post(&sample_post(), "What is the tone?")
            .await;

        assert_eq!(answer, "Positive.");
        let sent = &transport.requests()[0];
        let context = sent.messages[1].content.flatten();
        assert!(context.contains("Caption: Morning ritual #coffee #latteart"));
        assert!(context.contains("Hashtags: #coffee #latteart"));
        assert!(context.contains("Comments: barista: Beautiful pour"));
        assert!(context.contains("Likes: 87"));
        assert_eq!(sent.messages[2].content.flatten(), "What is the tone?");
    }

    #[tokio::test]
    async fn post_hashtag_question_offline() {
        let transport = ScriptedTransport::new(vec![Err(GatewayError::from_status(401, ""))]);
        let answer = analyzer(transport)
            .analyze_post(&sample_post(), "Which hashtags are used?")
            .await;
        assert!(answer.starts_with("This post uses several hashtags: #coffee #latteart."));
    }

    #[tokio::test]
    async fn post_summary_question_offline() {
        let transport = ScriptedTransport::new(vec![Err(GatewayError::from_status(401, ""))]);
        let answer = analyzer(transport).analyze_post(&sample_post(), "Summarize this").await;
        assert!(answer.starts_with("This post has received good engagement"));
    }

    #[tokio::test]
    async fn post_failure_returns_apology() {
        let transport = ScriptedTransport::new(vec![Err(GatewayError::Transport("x".into()))]);
        let answer = analyzer(transport).analyze_post(&sample_post(), "q").await;
        assert_eq!(answer, POST_ANALYSIS_APOLOGY);
    }

    #[tokio::test]
    async fn chat_resends_only_user_turns() {
        let transport = ScriptedTransport::new(vec![Ok(completion("one")), Ok(completion("two"))]);
        let gateway = ChatGateway::with_transport(transport.clone(), "m");
        let mut chat = PostChat::new(sample_post());

        assert_eq!(chat.ask(&gateway, "first?").await.as_deref(), Some("one"));
        assert_eq!(chat.ask(&gateway, "second?").await.as_deref(), Some("two"));

        let second = &transport.requests()[1];
        let roles: Vec<Role> = second.messages.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::System, Role::User, Role::User, Role::User]);
        assert_eq!(second.messages[2].content.flatten(), "first?");
        assert_eq!(second.messages[3].content.flatten(), "second?");

        // greeting, system, two questions, two answers
        assert_eq!(chat.transcript().len(), 6);
    }

    #[tokio::test]
    async fn chat_ignores_blank_question() {
        let transport = ScriptedTransport::new(vec![]);
        let gateway = ChatGateway::with_transport(transport.clone(), "m");
        let mut chat = PostChat::new(sample_post());
        assert_eq!(chat.ask(&gateway, "   ").await, None);
        assert_eq!(transport.calls(), 0);
    }

    async fn chat_reply_after(err: GatewayError) -> String {
        let gateway = ChatGateway::with_transport(ScriptedTransport::new(vec![Err(err)]), "m");
        let mut chat = PostChat::new(sample_post());
        chat.ask(&gateway, "hi").await.unwrap()
    }

    #[tokio::test]
    async fn chat_server_error_names_the_status() {
        let reply = chat_reply_after(GatewayError::from_status(500, "oops")).await;
        assert_eq!(
            reply,
            format!(
                "{CHAT_APOLOGY} There was an issue with the AI service (Error 500). Please try again later."
            )
        );
    }

    #[tokio::test]
    async fn chat_timeout_suggests_connectivity() {
        let reply =
            chat_reply_after(GatewayError::Timeout(std::time::Duration::from_secs(20))).await;
        assert_eq!(
            reply,
            format!(
                "{CHAT_APOLOGY} Could not reach the AI service. Please check your internet connection."
            )
        );
        let reply = chat_reply_after(GatewayError::Transport("reset".into())).await;
        assert!(reply.ends_with("Please check your internet connection."));
    }

    #[tokio::test]
    async fn chat_malformed_reply_is_unexpected() {
        let reply =
            chat_reply_after(GatewayError::MalformedUpstreamResponse("no text".into())).await;
        assert_eq!(
            reply,
            format!("{CHAT_APOLOGY} Something unexpected happened. Please try again.")
        );
    }

    #[test]
    fn chat_hints_for_soft_failure_statuses() {
        let hint = chat_failure_hint(&GatewayError::from_status(401, ""));
        assert!(hint.contains("check your API key"));
        let hint = chat_failure_hint(&GatewayError::from_status(429, ""));
        assert!(hint.contains("too many requests"));
        let hint = chat_failure_hint(&GatewayError::from_status(502, ""));
        assert!(hint.contains("endpoint URL may be incorrect"));
    }

    #[tokio::test]
    async fn chat_offline_uses_mock() {
        let transport = ScriptedTransport::new(vec![Err(GatewayError::from_status(502, ""))]);
        let gateway = ChatGateway::with_transport(transport, "m");
        let mut chat = PostChat::new(sample_post());
        let reply = chat.ask(&gateway, "summarize").await.unwrap();
        assert_eq!(
            reply,
            MockResponder.respond(&[Message::user("summarize")])
        );
    }
}
