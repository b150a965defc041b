//! Normalized content records and excerpt sanitization.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

/// Matches anything tag-shaped: `<p>`, `</a>`, `<img src="..." />`.
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").unwrap());

/// Matches bracketed shortcodes such as `[caption id="1"]` or `[&hellip;]`.
static SHORTCODE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[[^\]]*\]").unwrap());

/// Which kind of node the backend returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ContentKind {
    /// A blog post: carries excerpt, dates, author and featured image.
    Post,
    /// A static page: id, title and content only.
    Page,
}

impl ContentKind {
    /// The backend's `__typename` for this kind.
    pub fn typename(&self) -> &'static str {
        match self {
            Self::Post => "Post",
            Self::Page => "Page",
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.typename())
    }
}

/// A featured image with alt text already resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeaturedImage {
    /// Absolute image URL.
    pub source_url: String,
    /// Alt text; the node title when the backend has none.
    pub alt_text: String,
}

/// One post or page, normalized from the backend response.
///
/// Fields a kind does not carry are `None`, never placeholder values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContentNode {
    /// Backend node identifier.
    pub id: String,
    /// Post or page.
    pub kind: ContentKind,
    /// Title as stored by the backend.
    pub title: String,
    /// Raw excerpt, possibly containing markup.
    pub excerpt: Option<String>,
    /// Body HTML.
    pub content: Option<String>,
    /// Canonical link on the content site.
    pub link: Option<String>,
    /// Publish time (GMT) as reported by the backend.
    pub date_gmt: Option<String>,
    /// Last modification time (GMT) as reported by the backend.
    pub modified_gmt: Option<String>,
    /// Featured image.
    pub featured_image: Option<FeaturedImage>,
    /// Author display name.
    pub author_name: Option<String>,
}

impl ContentNode {
    /// Excerpt with markup and shortcodes removed, or `""` if there is none.
    pub fn description(&self) -> String {
        self.excerpt.as_deref().map(strip_tags).unwrap_or_default()
    }
}

/// Strip tag-like substrings and bracketed shortcodes from an excerpt.
pub fn strip_tags(input: &str) -> String {
    if input.is_empty() {
        return String::new();
    }
    let without_tags = TAG_RE.replace_all(input, "");
    let without_shortcodes = SHORTCODE_RE.replace_all(&without_tags, "");
    without_shortcodes.trim().to_string()
}
