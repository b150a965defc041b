//! HTML rendering for post and page previews.
//!
//! All rendering uses [maud](https://maud.lambda.xyz/) for compile-time HTML
//! generation with automatic escaping. The one exception is the content body,
//! which the backend already delivers as HTML and is injected unescaped.

pub mod components;

use maud::{Markup, PreEscaped, html};
use postpath_core::{ContentNode, append_path};
use url::Url;

use components::{OpenGraphData, is_safe_url, iso_gmt, page_shell, site_name};

/// Render a resolved node into a complete preview page.
///
/// `path` and `host` come from the request and form the canonical URL.
/// `refresh_base`, when set, adds a meta refresh to the same path there.
pub fn render_preview(
    node: &ContentNode,
    path: &str,
    host: &str,
    refresh_base: Option<&Url>,
) -> Markup {
    let canonical = format!("https://{host}/{path}");
    let description = node.description();
    let refresh_url = refresh_base.map(|base| append_path(base, path).to_string());

    let image = node
        .featured_image
        .as_ref()
        .filter(|img| is_safe_url(&img.source_url));

    let og = OpenGraphData {
        title: &node.title,
        description: &description,
        url: &canonical,
        site_name: site_name(host),
        image: image.map(|img| img.source_url.as_str()),
        image_alt: image.map(|img| img.alt_text.as_str()),
        published_time: node.date_gmt.as_deref().map(iso_gmt),
        modified_time: node.modified_gmt.as_deref().map(iso_gmt),
        author: node.author_name.as_deref(),
        refresh_url: refresh_url.as_deref(),
    };

    let body = html! {
        article {
            h1 class="article-title" { (node.title) }
            @if let Some(author) = &node.author_name {
                p class="article-byline" { "By " (author) }
            }
            @if let Some(img) = image {
                img class="article-image" src=(img.source_url) alt=(img.alt_text) loading="lazy";
            }
            @if let Some(content) = &node.content {
                div class="article-content" { (PreEscaped(content)) }
            }
        }
    };

    page_shell(&og, body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use postpath_core::{ContentKind, FeaturedImage};

    fn post() -> ContentNode {
        ContentNode {
            id: "cG9zdDox".to_string(),
            kind: ContentKind::Post,
            title: "Hello".to_string(),
            excerpt: Some("<p>An <em>intro</em> [gallery ids=\"1\"]</p>".to_string()),
            content: Some("<p>Body <strong>text</strong></p>".to_string()),
            link: Some("https://cms.example.com/my-post/".to_string()),
            date_gmt: Some("2024-05-01T10:00:00".to_string()),
            modified_gmt: Some("2024-05-02T11:30:00".to_string()),
            featured_image: Some(FeaturedImage {
                source_url: "https://cdn.example.com/hero.jpg".to_string(),
                alt_text: "Hello".to_string(),
            }),
            author_name: Some("Ada".to_string()),
        }
    }

    #[test]
    fn renders_open_graph_tags() {
        let html = render_preview(&post(), "my-post", "news.example.com", None).into_string();

        assert!(html.contains("<title>Hello</title>"));
        assert!(html.contains(r#"<meta property="og:title" content="Hello">"#));
        assert!(html.contains(r#"<meta property="og:description" content="An intro">"#));
        assert!(html.contains(
            r#"<meta property="og:url" content="https://news.example.com/my-post">"#
        ));
        assert!(html.contains(r#"<link rel="canonical" href="https://news.example.com/my-post">"#));
        assert!(html.contains(r#"<meta property="og:site_name" content="news">"#));
        assert!(html.contains(r#"<meta property="og:locale" content="en_US">"#));
        assert!(html.contains(
            r#"<meta property="og:image" content="https://cdn.example.com/hero.jpg">"#
        ));
        assert!(html.contains(r#"<meta property="og:image:alt" content="Hello">"#));
        assert!(html.contains(
            r#"<meta property="article:published_time" content="2024-05-01T10:00:00Z">"#
        ));
        assert!(html.contains(
            r#"<meta property="article:modified_time" content="2024-05-02T11:30:00Z">"#
        ));
        assert!(html.contains(r#"<meta name="twitter:card" content="summary_large_image">"#));
        assert!(html.contains(r#"<meta name="author" content="Ada">"#));
    }

    #[test]
    fn body_html_is_injected_raw() {
        let html = render_preview(&post(), "my-post", "news.example.com", None).into_string();
        assert!(html.contains("<p>Body <strong>text</strong></p>"));
    }

    #[test]
    fn title_is_escaped() {
        let mut node = post();
        node.title = "<script>x</script>".to_string();
        let html = render_preview(&node, "p", "example.com", None).into_string();

        assert!(!html.contains("<script>x</script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn refresh_points_at_same_path() {
        let base = Url::parse("https://www.example.com/").unwrap();
        let html =
            render_preview(&post(), "news/my-post", "example.com", Some(&base)).into_string();

        assert!(html.contains(
            r#"<meta http-equiv="refresh" content="0.5; url=https://www.example.com/news/my-post">"#
        ));
    }

    #[test]
    fn page_without_optional_fields() {
        let node = ContentNode {
            id: "cGFnZToy".to_string(),
            kind: ContentKind::Page,
            title: "About".to_string(),
            excerpt: None,
            content: Some("<p>About us</p>".to_string()),
            link: None,
            date_gmt: None,
            modified_gmt: None,
            featured_image: None,
            author_name: None,
        };
        let html = render_preview(&node, "about", "example.com", None).into_string();

        assert!(html.contains(r#"<meta property="og:description" content="">"#));
        assert!(html.contains(r#"<meta name="twitter:card" content="summary">"#));
        assert!(!html.contains("og:image"));
        assert!(!html.contains("article:published_time"));
    }

    #[test]
    fn long_excerpt_is_not_shortened() {
        let mut node = post();
        let excerpt = "word ".repeat(80);
        node.excerpt = Some(format!("<p>{excerpt}</p>"));
        let html = render_preview(&node, "p", "example.com", None).into_string();

        let expected = excerpt.trim();
        assert!(expected.len() > 300);
        assert!(html.contains(&format!(r#"<meta name="description" content="{expected}">"#)));
        assert!(html.contains(&format!(r#"<meta property="og:description" content="{expected}">"#)));
        assert!(html.contains(&format!(r#"<meta name="twitter:description" content="{expected}">"#)));
    }

    #[test]
    fn unsafe_image_url_is_dropped() {
        let mut node = post();
        node.featured_image = Some(FeaturedImage {
            source_url: "javascript:alert(1)".to_string(),
            alt_text: "x".to_string(),
        });
        let html = render_preview(&node, "p", "example.com", None).into_string();
        assert!(!html.contains("og:image"));
        assert!(!html.contains("javascript:"));
    }
}
