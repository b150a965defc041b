//! Shared HTML components for preview pages.
//!
//! These are maud functions that return `Markup` fragments for composition
//! into full pages.

use maud::{Markup, PreEscaped, html};

/// Inline CSS for preview pages.
///
/// The page is mostly read by crawlers; humans who land on it see a plain,
/// readable article.
pub const PAGE_CSS: &str = r#"
*{margin:0;padding:0;box-sizing:border-box}
:root{--bg:#fafafa;--fg:#111;--fg2:#555;--fg3:#999;--accent:#2563eb;--border:rgba(0,0,0,.1);--mono:"SF Mono",SFMono-Regular,ui-monospace,Menlo,monospace}
body{font-family:Inter,-apple-system,BlinkMacSystemFont,"Segoe UI",Roboto,sans-serif;line-height:1.6;color:var(--fg);background:var(--bg);min-height:100vh;display:flex;flex-direction:column;align-items:center;padding:1.5rem 1rem}
main{max-width:680px;width:100%;flex:1}
a{color:var(--accent);text-decoration:none}
a:hover{text-decoration:underline}
img{max-width:100%;height:auto}

.article-title{font-size:1.75rem;font-weight:700;margin-bottom:.5rem;line-height:1.3;letter-spacing:-.01em}
.article-byline{color:var(--fg3);font-size:.9rem;margin-bottom:1rem}
.article-image{width:100%;max-height:360px;object-fit:cover;border-radius:8px;margin-bottom:1rem}
.article-content{font-size:1.05rem;line-height:1.75;color:var(--fg);margin:1rem 0}
.article-content h1,.article-content h2,.article-content h3,.article-content h4{font-weight:700;margin:1.5rem 0 .75rem;letter-spacing:-.01em}
.article-content p{margin:.75rem 0}
.article-content ul,.article-content ol{margin:.75rem 0;padding-left:1.5rem}
.article-content blockquote{border-left:3px solid var(--border);padding:.5rem 0 .5rem 1rem;margin:.75rem 0;color:var(--fg2)}
.article-content pre{background:var(--bg);border:1px solid var(--border);border-radius:6px;padding:.75rem 1rem;overflow-x:auto;margin:.75rem 0;font-size:.85rem}
.article-content code{font-family:var(--mono);font-size:.88em}
.article-content img{border-radius:6px;margin:.75rem 0}
.article-content figure{margin:.75rem 0}

@media(prefers-color-scheme:dark){
:root{--bg:#0a0a0f;--fg:#e5e5e5;--fg2:#a0a0a0;--fg3:#666;--accent:#60a5fa;--border:rgba(255,255,255,.12)}
}
"#;

/// Inline CSS for error pages.
pub const ERROR_CSS: &str = r#"
*{margin:0;padding:0;box-sizing:border-box}
body{font-family:-apple-system,BlinkMacSystemFont,"Segoe UI",Roboto,sans-serif;display:flex;justify-content:center;align-items:center;min-height:100vh;background:#fafafa;color:#1a1a2e;padding:1rem}
.error-page{text-align:center;max-width:400px}
.error-page h1{font-size:1.5rem;margin-bottom:.75rem}
.error-page p{color:#666;margin-bottom:1rem;line-height:1.5}
@media(prefers-color-scheme:dark){
body{background:#0f0f17;color:#e0e0e8}
.error-page p{color:#aaa}
}
"#;

/// Content-Security-Policy header value.
///
/// No scripts at all. Inline styles and HTTPS images only, since the body is
/// backend-supplied HTML.
pub const CSP_HEADER: &str = "default-src 'none'; style-src 'unsafe-inline'; img-src https: data:; media-src https:; form-action 'none'; frame-ancestors 'none'";

/// Open Graph metadata for a page.
#[derive(Debug, Default)]
pub struct OpenGraphData<'a> {
    /// OG title.
    pub title: &'a str,
    /// OG description, already stripped of markup.
    pub description: &'a str,
    /// Canonical URL of the preview page.
    pub url: &'a str,
    /// `og:site_name`.
    pub site_name: &'a str,
    /// OG image URL.
    pub image: Option<&'a str>,
    /// Alt text for `image`.
    pub image_alt: Option<&'a str>,
    /// `article:published_time`, ISO 8601.
    pub published_time: Option<String>,
    /// `article:modified_time`, ISO 8601.
    pub modified_time: Option<String>,
    /// Author display name.
    pub author: Option<&'a str>,
    /// Meta-refresh target, if the page should forward humans.
    pub refresh_url: Option<&'a str>,
}

impl OpenGraphData<'_> {
    /// Twitter card type: large image when there is one.
    pub fn twitter_card_type(&self) -> &'static str {
        if self.image.is_some() {
            "summary_large_image"
        } else {
            "summary"
        }
    }
}

/// Render the full HTML page shell with `<head>`, OG tags, and body content.
pub fn page_shell(og: &OpenGraphData<'_>, body_content: Markup) -> Markup {
    html! {
        (maud::DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { (og.title) }
                meta name="description" content=(og.description);
                link rel="canonical" href=(og.url);
                @if let Some(author) = og.author {
                    meta name="author" content=(author);
                }
                @if let Some(refresh) = og.refresh_url {
                    meta http-equiv="refresh" content={ "0.5; url=" (refresh) };
                }

                // Open Graph
                meta property="og:locale" content="en_US";
                meta property="og:type" content="article";
                meta property="og:title" content=(og.title);
                meta property="og:description" content=(og.description);
                meta property="og:url" content=(og.url);
                meta property="og:site_name" content=(og.site_name);
                @if let Some(image) = og.image {
                    meta property="og:image" content=(image);
                    @if let Some(alt) = og.image_alt {
                        meta property="og:image:alt" content=(alt);
                    }
                }
                @if let Some(published) = &og.published_time {
                    meta property="article:published_time" content=(published);
                }
                @if let Some(modified) = &og.modified_time {
                    meta property="article:modified_time" content=(modified);
                }

                // Twitter Card
                meta name="twitter:card" content=(og.twitter_card_type());
                meta name="twitter:title" content=(og.title);
                meta name="twitter:description" content=(og.description);
                @if let Some(image) = og.image {
                    meta name="twitter:image" content=(image);
                }

                style { (PreEscaped(PAGE_CSS)) }
            }
            body {
                main { (body_content) }
            }
        }
    }
}

/// Check if a URL is safe to use in `src` or `href` attributes.
pub fn is_safe_url(url: &str) -> bool {
    url.starts_with("https://") || url.starts_with("http://")
}

/// Site name derived from a request host: `blog.example.com:8080` -> `blog`.
///
/// Bracketed IPv6 hosts keep their address: `[::1]:3000` -> `[::1]`.
pub fn site_name(host: &str) -> &str {
    if host.starts_with('[') {
        return host.find(']').map_or(host, |end| &host[..=end]);
    }
    let without_port = host.split(':').next().unwrap_or(host);
    without_port.split('.').next().unwrap_or(without_port)
}

/// Normalize a backend GMT timestamp to ISO 8601 with a `Z` suffix.
///
/// Backends report `date_gmt` without a zone designator. Values that already
/// carry one are passed through.
pub fn iso_gmt(raw: &str) -> String {
    let raw = raw.trim();
    let has_zone = raw.ends_with('Z')
        || raw
            .rsplit_once('T')
            .is_some_and(|(_, time)| time.contains('+') || time.contains('-'));

    if has_zone {
        raw.to_string()
    } else {
        format!("{raw}Z")
    }
}
