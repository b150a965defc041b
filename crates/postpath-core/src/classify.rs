//! Request classification: render a preview or redirect.
//!
//! Two policies exist and exactly one is active per process:
//!
//! - [`ClassifierPolicy::Referrer`]: requests arriving from a flagged social
//!   referrer, or carrying the tracking marker, are redirected to the content
//!   site. Everything else renders.
//! - [`ClassifierPolicy::UserAgent`]: known link-preview crawlers render.
//!   Everything else is redirected to the configured redirect base.
//!
//! The two disagree on what a crawler sees, so they are never combined.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use crate::error::{Error, Result};
use crate::request::RequestContext;

/// User-agent tokens of link-preview fetchers and search crawlers.
static CRAWLER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)facebookexternalhit|facebot|twitterbot|linkedinbot|slackbot|discordbot|telegrambot|whatsapp|pinterest|redditbot|embedly|skypeuripreview|googlebot|bingbot|applebot|iframely|vkshare|quora link preview|outbrain|w3c_validator|tumblr",
    )
    .expect("crawler pattern is valid")
});

/// Paths browsers probe on their own; these never name content.
const RESERVED_ASSETS: &[&str] = &[
    "favicon.ico",
    "apple-touch-icon.png",
    "apple-touch-icon-precomposed.png",
];

/// Which classification policy is active.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ClassifierPolicy {
    /// Redirect flagged referrers and tracked links, render everything else.
    #[default]
    Referrer,
    /// Render for crawlers, redirect everyone else.
    ///
    /// Reserved asset paths such as `/favicon.ico` are answered not-found
    /// under both policies, before the user-agent is looked at, so browsers
    /// probing for icons are not redirected.
    UserAgent,
}

impl FromStr for ClassifierPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "referrer" | "referer" => Ok(Self::Referrer),
            "user-agent" | "user_agent" | "useragent" => Ok(Self::UserAgent),
            other => Err(format!(
                "unknown classifier policy '{other}' (expected 'referrer' or 'user-agent')"
            )),
        }
    }
}

impl fmt::Display for ClassifierPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Referrer => f.write_str("referrer"),
            Self::UserAgent => f.write_str("user-agent"),
        }
    }
}

/// Settings the classifier needs, taken from process configuration.
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    /// Active policy.
    pub policy: ClassifierPolicy,
    /// Backend GraphQL endpoint. The referrer policy redirects to the site it
    /// belongs to.
    pub endpoint: Option<Url>,
    /// Redirect target for non-crawlers under the user-agent policy.
    pub redirect_base: Option<Url>,
    /// Referrer substrings that trigger a redirect under the referrer policy.
    pub flagged_referrers: Vec<String>,
    /// Query parameter whose presence triggers a redirect under the referrer
    /// policy.
    pub tracking_param: String,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            policy: ClassifierPolicy::Referrer,
            endpoint: None,
            redirect_base: None,
            flagged_referrers: vec!["facebook.com".to_string()],
            tracking_param: "fbclid".to_string(),
        }
    }
}

/// How a request is being served.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMode {
    /// A preview page is rendered.
    CrawlerPreview,
    /// Flagged referrer or tracking marker; sent to the content site.
    FlaggedRedirect,
    /// Ordinary visitor; sent to the redirect base.
    HumanRedirect,
}

impl RequestMode {
    /// Short label used in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CrawlerPreview => "crawler-preview",
            Self::FlaggedRedirect => "flagged-redirect",
            Self::HumanRedirect => "human-redirect",
        }
    }
}

/// Outcome of classifying one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassificationResult {
    /// Send the client elsewhere.
    Redirect {
        /// Absolute destination URL.
        destination: Url,
        /// 301 when true, 302 otherwise.
        permanent: bool,
    },
    /// The path can never name content.
    NotFound,
    /// Fetch and render the content at `path`.
    Render {
        /// Joined request path, without surrounding slashes.
        path: String,
    },
}

/// Stateless request classifier.
#[derive(Debug, Clone)]
pub struct Classifier {
    policy: ClassifierPolicy,
    content_base: Option<Url>,
    redirect_base: Option<Url>,
    flagged_referrers: Vec<String>,
    tracking_param: String,
}

impl Classifier {
    /// Build a classifier, deriving the content-site base from the endpoint.
    pub fn new(config: ClassifierConfig) -> Self {
        Self {
            policy: config.policy,
            content_base: config.endpoint.as_ref().map(content_site_base),
            redirect_base: config.redirect_base,
            flagged_referrers: config
                .flagged_referrers
                .into_iter()
                .map(|r| r.trim().to_ascii_lowercase())
                .filter(|r| !r.is_empty())
                .collect(),
            tracking_param: config.tracking_param,
        }
    }

    /// Active policy.
    pub fn policy(&self) -> ClassifierPolicy {
        self.policy
    }

    /// Decide how the request is served, without building a destination.
    pub fn mode(&self, ctx: &RequestContext) -> RequestMode {
        match self.policy {
            ClassifierPolicy::Referrer => {
                if self.is_flagged_referrer(ctx.referrer.as_deref())
                    || ctx.query.contains(&self.tracking_param)
                {
                    RequestMode::FlaggedRedirect
                } else {
                    RequestMode::CrawlerPreview
                }
            }
            ClassifierPolicy::UserAgent => {
                if is_crawler(ctx.user_agent.as_deref().unwrap_or_default()) {
                    RequestMode::CrawlerPreview
                } else {
                    RequestMode::HumanRedirect
                }
            }
        }
    }

    /// Classify a request.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidPath`] if the path is empty.
    /// - [`Error::ConfigurationMissing`] if a redirect is due but its base is
    ///   not configured.
    pub fn classify(&self, ctx: &RequestContext) -> Result<ClassificationResult> {
        let path = ctx.joined_path()?;

        if is_reserved_asset(&path) {
            return Ok(ClassificationResult::NotFound);
        }

        let result = match self.mode(ctx) {
            RequestMode::CrawlerPreview => ClassificationResult::Render { path },
            RequestMode::FlaggedRedirect => {
                let base = self
                    .content_base
                    .as_ref()
                    .ok_or(Error::ConfigurationMissing("GRAPHQL_ENDPOINT"))?;
                ClassificationResult::Redirect {
                    destination: append_path(base, &path),
                    permanent: false,
                }
            }
            RequestMode::HumanRedirect => {
                let base = self
                    .redirect_base
                    .as_ref()
                    .ok_or(Error::ConfigurationMissing("PREVIEW_REDIRECT_BASE"))?;
                ClassificationResult::Redirect {
                    destination: append_path(base, &path),
                    permanent: false,
                }
            }
        };

        Ok(result)
    }

    fn is_flagged_referrer(&self, referrer: Option<&str>) -> bool {
        let Some(referrer) = referrer else {
            return false;
        };
        let referrer = referrer.to_ascii_lowercase();
        self.flagged_referrers
            .iter()
            .any(|flagged| referrer.contains(flagged.as_str()))
    }
}

/// True if the user-agent belongs to a known crawler or link previewer.
pub fn is_crawler(user_agent: &str) -> bool {
    CRAWLER_RE.is_match(user_agent)
}

fn is_reserved_asset(path: &str) -> bool {
    let path = path.trim_matches('/');
    RESERVED_ASSETS.contains(&path) || path.starts_with(".well-known/") || path == ".well-known"
}

/// The public site a GraphQL endpoint belongs to: the endpoint with a
/// trailing `graphql` path segment removed, always ending in `/`.
pub fn content_site_base(endpoint: &Url) -> Url {
    let mut segments: Vec<&str> = endpoint
        .path_segments()
        .map(|s| s.filter(|seg| !seg.is_empty()).collect())
        .unwrap_or_default();

    if segments
        .last()
        .is_some_and(|last| last.eq_ignore_ascii_case("graphql"))
    {
        segments.pop();
    }

    let mut base = endpoint.clone();
    base.set_query(None);
    base.set_fragment(None);
    if segments.is_empty() {
        base.set_path("/");
    } else {
        base.set_path(&format!("/{}/", segments.join("/")));
    }
    base
}

/// Append a request path to a base URL, percent-encoding what a URL path
/// cannot carry and keeping `/` separators.
pub fn append_path(base: &Url, path: &str) -> Url {
    let mut url = base.clone();
    let prefix = base.path().trim_end_matches('/');
    url.set_path(&format!("{prefix}/{}", path.trim_start_matches('/')));
    url
}
