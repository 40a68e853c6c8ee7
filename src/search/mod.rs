//! Natural-language search over a post collection.
//!
//! [`SearchOrchestrator::search`] enriches every post with a model-written
//! image description, asks the model to rank the posts against the query,
//! and falls back to [`keyword_search`] whenever ranking yields nothing.

mod queue;
mod ranking;

pub use queue::RateLimitedQueue;
pub use ranking::{ResponseParseError, parse_ranked_ids};

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::ai::{API_ERROR_PREFIX, ImageAnalyzer};
use crate::config::SearchConfig;
use crate::model::{EnrichedPost, Message, Post};

/// Analysis answers containing any of these are not real descriptions.
const UNUSABLE_MARKERS: &[&str] = &[API_ERROR_PREFIX, "having trouble", "I don't have the ability"];

const RANKING_INSTRUCTIONS: &str = "You are a search assistant for an Instagram-like app.\n\
You'll be given a set of posts with captions, comments, and image descriptions.\n\
Your task is to determine which posts match the natural language query and rank them by relevance.\n\
Consider both the text content AND the image descriptions when matching.\n\
Respond with ONLY post IDs in JSON format like [\"1\", \"3\"] - no other text.\n\
Put the most relevant matches first.";

/// One search session.
///
/// Descriptions that the model produced are cached by post id for the
/// lifetime of the orchestrator, so repeated searches over the same feed
/// only analyse new posts.
pub struct SearchOrchestrator {
    analyzer: ImageAnalyzer,
    config: SearchConfig,
    queue: RateLimitedQueue,
    descriptions: Mutex<HashMap<String, String>>,
}

impl SearchOrchestrator {
    pub fn new(analyzer: ImageAnalyzer, config: SearchConfig) -> Self {
        let queue = RateLimitedQueue::new(config.analysis_delay());
        Self {
            analyzer,
            config,
            queue,
            descriptions: Mutex::new(HashMap::new()),
        }
    }

    /// Posts matching `query`, most relevant first.
    ///
    /// A blank query returns `posts` unchanged. The result is always a
    /// subset of `posts`.
    pub async fn search(&self, query: &str, posts: &[Post]) -> Vec<Post> {
        if query.trim().is_empty() {
            return posts.to_vec();
        }

        let enriched = self.enrich(posts).await;

        log::info!("Sending semantic search request for {query:?} over {} posts", posts.len());
        let reply = match self.analyzer.gateway().send(&ranking_prompt(query, &enriched)).await {
            Ok(reply) => reply,
            Err(e) => {
                log::warn!(
                    "Ranking request failed ({}): {e}; falling back to keyword search",
                    e.kind()
                );
                return keyword_search(query, posts);
            }
        };

        let ids = match parse_ranked_ids(&reply) {
            Ok(ids) => ids,
            Err(e) => {
                log::warn!("{e}; falling back to keyword search");
                return keyword_search(query, posts);
            }
        };

        let results = resolve(&ids, &enriched);
        if results.is_empty() {
            log::info!("No AI matches for {query:?}, falling back to keyword search");
            return keyword_search(query, posts);
        }
        results
    }

    /// Description cached for a post by an earlier search, if any.
    pub fn cached_description(&self, post_id: &str) -> Option<String> {
        self.cache().get(post_id).cloned()
    }

    pub fn clear_cache(&self) {
        self.cache().clear();
    }

    /// Pair every post with an image description, analysing uncached posts
    /// one at a time through the queue.
    async fn enrich(&self, posts: &[Post]) -> Vec<EnrichedPost> {
        let pending: Vec<&Post> = {
            let cache = self.cache();
            posts.iter().filter(|p| !cache.contains_key(&p.id)).collect()
        };
        log::info!(
            "Generating image descriptions for {} of {} posts",
            pending.len(),
            posts.len()
        );

        let fresh: HashMap<&str, String> = self
            .queue
            .run(pending, |post| async move { (post.id.as_str(), self.describe(post).await) })
            .await
            .into_iter()
            .collect();

        let cache = self.cache();
        posts
            .iter()
            .map(|post| {
                let image_description = fresh
                    .get(post.id.as_str())
                    .or_else(|| cache.get(&post.id))
                    .cloned()
                    .unwrap_or_else(|| caption_description(post));
                EnrichedPost {
                    post: post.clone(),
                    image_description,
                }
            })
            .collect()
    }

    async fn describe(&self, post: &Post) -> String {
        log::info!("Analyzing image for post {}: {}", post.id, post.image_url);
        let answer = self
            .analyzer
            .analyze(&post.image_url, &self.config.description_prompt)
            .await;

        if answer.trim().is_empty() || UNUSABLE_MARKERS.iter().any(|m| answer.contains(m)) {
            log::warn!("Could not get a proper description for post {}, using caption", post.id);
            return caption_description(post);
        }

        log::debug!("Description for post {}: {}", post.id, answer);
        self.cache().insert(post.id.clone(), answer.clone());
        answer
    }

    fn cache(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.descriptions.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn caption_description(post: &Post) -> String {
    format!("Image related to: {}", post.caption)
}

fn ranking_prompt(query: &str, posts: &[EnrichedPost]) -> Vec<Message> {
    let listing = posts
        .iter()
        .map(|e| {
            format!(
                "Post ID: {}\nUsername: {}\nCaption: {}\nHashtags: {}\nComments: {}\nImage Description: {}\n",
                e.post.id,
                e.post.username,
                e.post.caption,
                e.post.hashtags(),
                e.post.comment_digest(),
                e.image_description
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    vec![
        Message::system(RANKING_INSTRUCTIONS),
        Message::user(format!(
            "Here are the posts to search through:\n\n{listing}\n\
             Search query: \"{query}\"\n\n\
             Return only matching post IDs in a JSON array, ranked by relevance. \
             If no posts match, return empty array."
        )),
    ]
}

/// Map ranked ids back to posts, keeping the model's order. Unknown and
/// repeated ids are dropped.
fn resolve(ids: &[String], enriched: &[EnrichedPost]) -> Vec<Post> {
    let mut seen = HashSet::new();
    ids.iter()
        .filter(|id| seen.insert(id.as_str()))
        .filter_map(|id| enriched.iter().find(|e| &e.post.id == id))
        .map(|e| e.post.clone())
        .collect()
}

/// Case-insensitive substring match on caption, username, and comment text
/// or author. Keeps the input order.
pub fn keyword_search(query: &str, posts: &[Post]) -> Vec<Post> {
    let needle = query.to_lowercase();
    let hit = |s: &str| s.to_lowercase().contains(&needle);

    posts
        .iter()
        .filter(|post| {
            hit(&post.caption)
                || hit(&post.username)
                || post.comments.iter().any(|c| hit(&c.text) || hit(&c.username))
        })
        .cloned()
        .collect()
}

/// The first `count` posts of the feed.
///
/// There is no view history yet; the head of the feed stands in for it.
pub fn recently_viewed(posts: &[Post], count: usize) -> Vec<Post> {
    posts.iter().take(count).cloned().collect()
}
