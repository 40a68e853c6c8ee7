//! Where posts come from.
//!
//! The core only needs read access to an ordered post collection. [`Feed`]
//! holds either the built-in sample feed or posts loaded from a JSON file.

use anyhow::{Context, Result};
use std::path::Path;

use crate::model::{Comment, Post};

/// Read access to an ordered post collection.
pub trait PostSource {
    fn posts(&self) -> &[Post];

    fn find(&self, id: &str) -> Option<&Post> {
        self.posts().iter().find(|p| p.id == id)
    }
}

/// An in-memory feed.
#[derive(Debug, Clone, Default)]
pub struct Feed {
    posts: Vec<Post>,
}

impl PostSource for Feed {
    fn posts(&self) -> &[Post] {
        &self.posts
    }
}

impl Feed {
    pub fn new(posts: Vec<Post>) -> Self {
        Self { posts }
    }

    /// Load from a JSON file when a path is given, otherwise the sample feed.
    pub fn open(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Ok(Self::new(load_posts(p)?)),
            None => Ok(Self::sample()),
        }
    }

    /// A small demo feed whose images have known descriptions.
    pub fn sample() -> Self {
        Self::new(vec![
            sample_post(
                "1",
                "travel_addict",
                1015,
                "Chasing waterfalls in the mountains #travel #nature #adventure",
                1243,
                "2h",
                &[
                    ("hikingfan", "Where is this? Looks amazing!"),
                    ("wanderer", "Adding this to my bucket list"),
                ],
            ),
            sample_post(
                "2",
                "chef_maria",
                25,
                "Homemade pasta night with fresh basil #food #pasta #homecooking",
                856,
                "4h",
                &[("foodie_joe", "Recipe please!"), ("nonna_rosa", "Just like in Italy")],
            ),
            sample_post(
                "3",
                "puppy_diaries",
                237,
                "Meet our new family member! #puppy #labrador #doglover",
                3201,
                "6h",
                &[("dogmom", "So cute!!"), ("vet_sam", "Healthy looking pup, congrats")],
            ),
            sample_post(
                "4",
                "coffee_lover",
                42,
                "Morning ritual with the perfect latte art #coffee #latteart #cafe",
                642,
                "8h",
                &[("barista_ben", "Beautiful pour"), ("sleepy_sue", "I need this right now")],
            ),
            sample_post(
                "5",
                "city_walker",
                29,
                "Exploring downtown on a sunny afternoon #city #streetphotography",
                418,
                "12h",
                &[("urbanist", "Love the architecture here")],
            ),
            sample_post(
                "6",
                "fit_life",
                48,
                "New home gym is finally ready #fitness #workout #motivation",
                975,
                "1d",
                &[("gym_rat", "Goals!"), ("yogi_em", "Where did you get those mats?")],
            ),
            sample_post(
                "7",
                "bookworm",
                24,
                "Rainy day reading corner #books #reading #cozy",
                533,
                "2d",
                &[("pageturner", "What are you reading?")],
            ),
            sample_post(
                "8",
                "beat_maker",
                1082,
                "Studio session vibes #music #producer #guitar",
                764,
                "3d",
                &[("drummer_dan", "Let's jam soon")],
            ),
        ])
    }
}

/// Read a JSON array of posts.
pub fn load_posts(path: &Path) -> Result<Vec<Post>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read posts file {}", path.display()))?;
    let posts: Vec<Post> = serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse posts file {}", path.display()))?;
    log::info!("Loaded {} posts from {}", posts.len(), path.display());
    Ok(posts)
}

fn sample_post(
    id: &str,
    username: &str,
    picsum_id: u32,
    caption: &str,
    likes: u64,
    timestamp: &str,
    comments: &[(&str, &str)],
) -> Post {
    Post {
        id: id.to_string(),
        username: username.to_string(),
        user_avatar: format!("https://i.pravatar.cc/150?u={username}"),
        image_url: format!("https://picsum.photos/id/{picsum_id}/800/800"),
        caption: caption.to_string(),
        likes,
        timestamp: timestamp.to_string(),
        comments: comments
            .iter()
            .enumerate()
            .map(|(i, (user, text))| Comment {
                id: format!("{id}-{}", i + 1),
                username: user.to_string(),
                text: text.to_string(),
                timestamp: timestamp.to_string(),
            })
            .collect(),
    }
}
