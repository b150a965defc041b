//! Content resolution against the GraphQL backend.
//!
//! One path in, at most one [`ContentNode`] out, with exactly one outbound
//! request in between. The transport is whatever implements [`QueryClient`].

use std::fmt;
use std::str::FromStr;
use std::time::Instant;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::content::{ContentKind, ContentNode, FeaturedImage};
use crate::error::{Error, QueryError, Result};
use crate::metrics;

/// Look a node up by URI; the backend reports its concrete type.
const NODE_BY_URI_QUERY: &str = r#"query NodeByUri($uri: String!) {
  nodeByUri(uri: $uri) {
    __typename
    ... on Post {
      id
      excerpt
      title
      link
      dateGmt
      modifiedGmt
      content
      author { node { name } }
      featuredImage { node { sourceUrl altText } }
    }
    ... on Page {
      id
      title
      content
    }
  }
}"#;

/// Look a post up by URI through the typed `post` field.
const POST_BY_URI_QUERY: &str = r#"query PostByUri($uri: ID!) {
  post(id: $uri, idType: URI) {
    __typename
    id
    excerpt
    title
    link
    dateGmt
    modifiedGmt
    content
    author { node { name } }
    featuredImage { node { sourceUrl altText } }
  }
}"#;

/// A GraphQL request body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphQlRequest {
    /// Query document.
    pub query: &'static str,
    /// Variables bound into the query.
    pub variables: serde_json::Value,
}

/// Executes GraphQL requests against the content backend.
///
/// Implementations perform exactly one round trip per call and return the
/// response's `data` object. Retries, if any, are not their business.
#[async_trait]
pub trait QueryClient: Send + Sync {
    /// Execute `request` and return the `data` member of the response.
    async fn execute(
        &self,
        request: &GraphQlRequest,
    ) -> std::result::Result<serde_json::Value, QueryError>;
}

/// Which lookup the backend supports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum QueryForm {
    /// `nodeByUri(uri:)`, resolving posts and pages.
    #[default]
    NodeByUri,
    /// `post(id:, idType: URI)`, resolving posts only.
    PostByUri,
}

impl FromStr for QueryForm {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "node-by-uri" | "node_by_uri" | "nodebyuri" => Ok(Self::NodeByUri),
            "post-by-uri" | "post_by_uri" | "postbyuri" => Ok(Self::PostByUri),
            other => Err(format!(
                "unknown query form '{other}' (expected 'node-by-uri' or 'post-by-uri')"
            )),
        }
    }
}

impl fmt::Display for QueryForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NodeByUri => f.write_str("node-by-uri"),
            Self::PostByUri => f.write_str("post-by-uri"),
        }
    }
}

/// The URI the backend indexes content under: `/a/b/c/` for `a/b/c`.
pub fn content_uri(path: &str) -> String {
    format!("/{}/", path.trim_matches('/'))
}

/// Fetches and normalizes one content node per call.
#[derive(Debug, Clone, Copy, Default)]
pub struct Resolver {
    form: QueryForm,
}

impl Resolver {
    /// Create a resolver for the given backend query form.
    pub fn new(form: QueryForm) -> Self {
        Self { form }
    }

    /// Active query form.
    pub fn form(&self) -> QueryForm {
        self.form
    }

    /// Build the request that looks up `path`.
    pub fn request_for(&self, path: &str) -> GraphQlRequest {
        let query = match self.form {
            QueryForm::NodeByUri => NODE_BY_URI_QUERY,
            QueryForm::PostByUri => POST_BY_URI_QUERY,
        };
        GraphQlRequest {
            query,
            variables: json!({ "uri": content_uri(path) }),
        }
    }

    /// Resolve `path` to a content node.
    ///
    /// Returns `Ok(None)` when the backend has no node at that URI, or only a
    /// node of a type that cannot be previewed.
    ///
    /// # Errors
    ///
    /// - [`Error::BackendUnavailable`] if the request failed.
    /// - [`Error::MalformedResponse`] if the payload had an unexpected shape.
    pub async fn resolve(
        &self,
        path: &str,
        client: &dyn QueryClient,
    ) -> Result<Option<ContentNode>> {
        let request = self.request_for(path);

        let started = Instant::now();
        let response = client.execute(&request).await;
        metrics::record_backend_request(started.elapsed(), response.is_ok());

        let data = response?;

        let raw = match self.form {
            QueryForm::NodeByUri => serde_json::from_value::<NodeByUriData>(data)?.node_by_uri,
            QueryForm::PostByUri => serde_json::from_value::<PostByUriData>(data)?.post,
        };

        let Some(raw) = raw else {
            return Ok(None);
        };

        let default_kind = match self.form {
            QueryForm::NodeByUri => None,
            QueryForm::PostByUri => Some(ContentKind::Post),
        };

        raw.normalize(default_kind)
    }
}

// =============================================================================
// Wire format
// =============================================================================

#[derive(Debug, Deserialize)]
struct NodeByUriData {
    #[serde(rename = "nodeByUri")]
    node_by_uri: Option<RawNode>,
}

#[derive(Debug, Deserialize)]
struct PostByUriData {
    post: Option<RawNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawNode {
    #[serde(rename = "__typename")]
    typename: Option<String>,
    id: Option<String>,
    title: Option<String>,
    excerpt: Option<String>,
    content: Option<String>,
    link: Option<String>,
    date_gmt: Option<String>,
    modified_gmt: Option<String>,
    author: Option<Edge<RawAuthor>>,
    featured_image: Option<Edge<RawImage>>,
}

#[derive(Debug, Deserialize)]
struct Edge<T> {
    node: Option<T>,
}

#[derive(Debug, Deserialize)]
struct RawAuthor {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawImage {
    source_url: Option<String>,
    alt_text: Option<String>,
}

impl RawNode {
    /// Map the backend node onto [`ContentNode`].
    ///
    /// `default_kind` applies when the payload carries no `__typename`.
    fn normalize(self, default_kind: Option<ContentKind>) -> Result<Option<ContentNode>> {
        let kind = match self.typename.as_deref() {
            Some("Post") => ContentKind::Post,
            Some("Page") => ContentKind::Page,
            Some(other) => {
                tracing::debug!(typename = %other, "backend node type cannot be previewed");
                return Ok(None);
            }
            None => match default_kind {
                Some(kind) => kind,
                None => {
                    return Err(Error::MalformedResponse(
                        "node is missing __typename".to_string(),
                    ));
                }
            },
        };

        let id = non_empty(self.id)
            .ok_or_else(|| Error::MalformedResponse("node is missing id".to_string()))?;
        let title = self.title.unwrap_or_default();
        let content = non_empty(self.content);

        if kind == ContentKind::Page {
            return Ok(Some(ContentNode {
                id,
                kind,
                title,
                excerpt: None,
                content,
                link: None,
                date_gmt: None,
                modified_gmt: None,
                featured_image: None,
                author_name: None,
            }));
        }

        let featured_image = self
            .featured_image
            .and_then(|edge| edge.node)
            .and_then(|image| {
                let source_url = non_empty(image.source_url)?;
                let alt_text = non_empty(image.alt_text).unwrap_or_else(|| title.clone());
                Some(FeaturedImage {
                    source_url,
                    alt_text,
                })
            });

        let author_name = self
            .author
            .and_then(|edge| edge.node)
            .and_then(|author| non_empty(author.name));

        Ok(Some(ContentNode {
            id,
            kind,
            excerpt: non_empty(self.excerpt),
            content,
            link: non_empty(self.link),
            date_gmt: non_empty(self.date_gmt),
            modified_gmt: non_empty(self.modified_gmt),
            featured_image,
            author_name,
            title,
        }))
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
