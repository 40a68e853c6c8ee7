//! # llama-feed
//!
//! API orchestration for a social feed backed by a text-only Llama
//! chat-completion endpoint: simulated image understanding from URL
//! heuristics, a deterministic mock responder when the endpoint is
//! unavailable, and natural-language post search with keyword fallback.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use llama_feed::ai::{ChatGateway, ImageAnalyzer};
//! use llama_feed::config::Config;
//! use llama_feed::data::{Feed, PostSource};
//! use llama_feed::search::SearchOrchestrator;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     // config.json next to the binary, then LLAMA_API_URL / LLAMA_API_KEY / LLAMA_MODEL
//!     let config = Config::load(None)?;
//!
//!     let gateway = Arc::new(ChatGateway::new(&config.llama)?);
//!     let analyzer = ImageAnalyzer::new(gateway.clone());
//!
//!     // Ask about an image
//!     let answer = analyzer
//!         .analyze("https://picsum.photos/id/237/800/800", "What animal is this?")
//!         .await;
//!     println!("{answer}");
//!
//!     // Search the sample feed
//!     let feed = Feed::sample();
//!     let search = SearchOrchestrator::new(analyzer, config.search.clone());
//!     for post in search.search("cozy places to relax", feed.posts()).await {
//!         println!("{}: {}", post.username, post.caption);
//!     }
//!
//!     // Which capabilities are live?
//!     println!("{}", gateway.probe().await);
//!     Ok(())
//! }
//! ```
//!
//! ## Failure behaviour
//!
//! Callers always get a string or a post list back. Unreachable endpoints,
//! rejected credentials, rate limiting and bad gateways are answered by
//! [`ai::MockResponder`]; other failures become an apology or an
//! `Error from Llama API: ...` string, and search degrades to
//! [`search::keyword_search`].
//!
//! ## Modules
//!
//! - [`ai`]: chat gateway, mock responder, URL heuristics, image/post analysis, capability probe
//! - [`config`]: configuration types, loading/saving and environment overrides
//! - [`data`]: post sources and the sample feed
//! - [`model`]: messages, posts and reports
//! - [`search`]: semantic search, keyword search, recently viewed

pub mod ai;
pub mod config;
pub mod data;
pub mod model;
pub mod search;
