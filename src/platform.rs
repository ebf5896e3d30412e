use std::sync::LazyLock;

use regex::Regex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    TikTok,
    Instagram,
    Facebook,
    Unknown,
}

/// Host fragments checked in order; first hit wins.
const HOST_FRAGMENTS: [(Platform, &[&str]); 3] = [
    (Platform::TikTok, &["tiktok.com"]),
    (Platform::Instagram, &["instagram.com"]),
    (Platform::Facebook, &["facebook.com", "fb.watch"]),
];

static SHORTCODE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i:instagram\.com)/p/([A-Za-z0-9_-]+)",
        r"(?i:instagram\.com)/reel/([A-Za-z0-9_-]+)",
        r"(?i:instagram\.com)/tv/([A-Za-z0-9_-]+)",
    ]
    .iter()
    .filter_map(|pattern| Regex::new(pattern).ok())
    .collect()
});

impl Platform {
    /// Classifies a pasted link by host fragment. Never fails.
    pub fn classify(input: &str) -> Self {
        let lower = input.to_ascii_lowercase();
        HOST_FRAGMENTS
            .iter()
            .find(|(_, fragments)| fragments.iter().any(|fragment| lower.contains(fragment)))
            .map(|(platform, _)| *platform)
            .unwrap_or(Platform::Unknown)
    }

    /// Human readable name shown next to a result.
    pub fn label(self) -> Option<&'static str> {
        match self {
            Platform::TikTok => Some("TikTok"),
            Platform::Instagram => Some("Instagram"),
            Platform::Facebook => Some("Facebook"),
            Platform::Unknown => None,
        }
    }
}

/// Pulls the post shortcode out of an Instagram `/p/`, `/reel/` or `/tv/` link.
pub fn instagram_shortcode(input: &str) -> Option<&str> {
    SHORTCODE_PATTERNS.iter().find_map(|pattern| {
        pattern
            .captures(input)
            .and_then(|captures| captures.get(1))
            .map(|code| code.as_str())
    })
}
