//! Synthetic image descriptions derived from an image URL.
//!
//! The chat backend is text-only, so every "vision" answer is grounded in the
//! text produced here. Lookups are ordered: Lorem Picsum photo ids, then known
//! Unsplash photo ids, then keywords from the filename.

use url::Url;

/// Returned when the URL cannot be parsed.
pub const UNDETERMINED_DESCRIPTION: &str =
    "An image whose details cannot be determined without direct vision capabilities.";

/// Returned when nothing at all can be inferred from the URL.
pub const GENERIC_DESCRIPTION: &str = "An image shared on social media. Without direct vision capabilities, I can only make limited inferences about the image content.";

/// Lorem Picsum photo id → description.
const PICSUM_DESCRIPTIONS: &[(&str, &str)] = &[
    (
        "1015",
        "A stunning landscape showing a waterfall flowing down rocky mountains into a serene lake. There are green pine trees surrounding the scene and majestic mountains in the background with a clear blue sky.",
    ),
    (
        "1082",
        "A vintage wooden desk with musical instruments and equipment, including sheet music, a guitar, and audio production tools. The scene has a warm, artistic vibe with rich wood tones and creative energy.",
    ),
    (
        "1084",
        "A futuristic digital art piece with bright blue and purple neon glows against a dark background. The image has a sci-fi aesthetic with abstract technology-inspired patterns that evoke the feeling of artificial intelligence or advanced computing.",
    ),
    (
        "10",
        "A breathtaking mountain landscape with snow-capped peaks rising above lush green forests. There's a clear blue sky and the scene captures the majestic beauty of untouched nature.",
    ),
    (
        "25",
        "A beautifully plated pasta dish with fresh ingredients. The homemade pasta is served with a rich sauce, fresh herbs garnish, and grated cheese on top. The presentation is elegant and appetizing on a stylish plate.",
    ),
    (
        "29",
        "A busy urban street scene with a person wearing a blue t-shirt and sunglasses walking among the city buildings. The architecture features both modern and classic elements with various shops and businesses visible.",
    ),
    (
        "237",
        "An adorable black Labrador puppy sitting on a wooden floor and looking attentively at the camera. The dog has a shiny coat, expressive eyes, and a curious, friendly expression.",
    ),
    (
        "42",
        "A perfectly crafted coffee in a white ceramic cup with intricate latte art on the foam. The cup sits on a wooden table in what appears to be a cozy café setting with warm lighting.",
    ),
    (
        "48",
        "A modern fitness space with exercise equipment. There are weights, yoga mats, and training gear visible, suggesting an active lifestyle and workout routine. The space has good lighting and appears clean and well-organized.",
    ),
    (
        "24",
        "A cozy reading corner with bookshelves filled with books. There's a comfortable chair, good lighting, and a calm atmosphere perfect for reading and relaxation.",
    ),
];

/// URL substring → description, checked in order.
const URL_PATTERNS: &[(&str, &str)] = &[
    (
        "photo-1583172556690",
        "A beautiful sunset at the beach with orange and purple colors in the sky. The sun is setting over the ocean horizon, creating a golden reflection on the water. There are silhouettes of a few people walking along the shoreline.",
    ),
    (
        "photo-1618588507085",
        "A stunning mountain landscape with peaks covered in snow. There are green trees in the foreground and a clear blue sky. The scene shows a hiking trail winding through the landscape.",
    ),
    (
        "photo-1476224203421",
        "A plate of freshly made pasta with tomato sauce. The pasta appears to be homemade and is garnished with basil leaves and grated parmesan cheese. There's also a small bowl of olive oil visible in the corner of the image.",
    ),
    (
        "photo-1602002418082",
        "A young man walking on a city street wearing a bright blue t-shirt and dark sunglasses. He has short brown hair and appears to be walking confidently. The background shows urban architecture with buildings and some street signs.",
    ),
    (
        "photo-1543466835",
        "A golden retriever dog with light brown fur sitting in a park. The dog has a friendly expression and its tongue is slightly out. The background shows green grass and some trees, suggesting it's a nice day at a park or garden.",
    ),
    (
        "photo-1495474472287",
        "A white coffee cup containing a latte with artistic foam art on top. The cup is placed on a wooden table. There's also a small plate with what appears to be a pastry or cookie beside the cup. The setting looks like a cozy cafe.",
    ),
    (
        "photo-1517836357463",
        "A woman in blue workout clothes (blue leggings and a matching top) in what appears to be a home gym or exercise space. She seems to be in the middle of a workout routine, possibly yoga or strength training. There's exercise equipment visible in the background.",
    ),
    (
        "photo-1512820790803",
        "A person sitting in a comfortable chair reading a book. There's a bookshelf filled with books in the background. There's also a small table nearby with what appears to be a cup of tea or coffee. The setting has a cozy, relaxed atmosphere.",
    ),
];

/// Describe an image from its URL alone. Never fails.
///
/// # Example
///
/// ```rust
/// use llama_feed::ai::describe_image_url;
///
/// let text = describe_image_url("https://picsum.photos/id/237/800/800");
/// assert!(text.contains("Labrador"));
/// ```
pub fn describe_image_url(image_url: &str) -> String {
    let url = match Url::parse(image_url) {
        Ok(url) => url,
        Err(e) => {
            log::debug!("Could not parse image URL {image_url:?}: {e}");
            return UNDETERMINED_DESCRIPTION.to_string();
        }
    };

    let host = url.host_str().unwrap_or_default();
    let segments: Vec<&str> = url
        .path_segments()
        .map(|s| s.collect())
        .unwrap_or_default();

    if host.contains("picsum.photos") {
        if let Some(id) = picsum_photo_id(&segments) {
            log::debug!("Detected Picsum photo ID: {id}");
            return picsum_description(id);
        }
    }

    if let Some((_, description)) = URL_PATTERNS
        .iter()
        .find(|(pattern, _)| image_url.contains(pattern))
    {
        return description.to_string();
    }

    let keywords = url_keywords(image_url, &segments);

    if host.contains("unsplash") {
        return format!(
            "An image from Unsplash, likely a high-quality stock photo. The image might be related to these concepts extracted from the URL: {}",
            keywords.join(", ")
        );
    }

    if !keywords.is_empty() {
        return format!(
            "An image that may be related to these concepts based on the URL: {}",
            keywords.join(", ")
        );
    }

    GENERIC_DESCRIPTION.to_string()
}

/// The numeric segment following `id` in a Picsum path (`/id/237/800/800`).
fn picsum_photo_id<'a>(segments: &[&'a str]) -> Option<&'a str> {
    let idx = segments.iter().position(|s| *s == "id")?;
    let id = *segments.get(idx + 1)?;
    (!id.is_empty() && id.chars().all(|c| c.is_ascii_digit())).then_some(id)
}

fn picsum_description(id: &str) -> String {
    PICSUM_DESCRIPTIONS
        .iter()
        .find(|(known, _)| *known == id)
        .map(|(_, description)| description.to_string())
        .unwrap_or_else(|| {
            format!(
                "A high-quality stock photo from Lorem Picsum with ID {id}. The image likely contains landscapes, people, objects, or abstract concepts commonly found in photography libraries."
            )
        })
}

/// Keywords from an Unsplash photo slug and the filename stem.
fn url_keywords(image_url: &str, segments: &[&str]) -> Vec<String> {
    let mut keywords = Vec::new();

    if image_url.contains("unsplash.com/photos/") && segments.len() >= 2 {
        let photo_id = segments[segments.len() - 2];
        if !photo_id.is_empty() {
            keywords.push(photo_id.to_string());
        }
    }

    if let Some(filename) = segments.last().filter(|f| !f.is_empty()) {
        let stem = filename.split('.').next().unwrap_or_default();
        keywords.extend(
            stem.split(['-', '_'])
                .filter(|k| !k.is_empty())
                .map(String::from),
        );
    }

    keywords
}
