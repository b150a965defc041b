//! The per-request decision: classify, then resolve only if rendering.

use url::Url;

use crate::classify::{ClassificationResult, Classifier};
use crate::content::ContentNode;
use crate::error::Error;
use crate::metrics;
use crate::request::RequestContext;
use crate::resolve::{QueryClient, Resolver};

/// Why a request ended up as not-found.
///
/// Internal only: logged and counted, never shown to the visitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotFoundReason {
    /// The request did not name a path.
    InvalidPath,
    /// The path is a browser asset probe, not content.
    ReservedPath,
    /// The endpoint, redirect base or client is not configured.
    ConfigurationMissing,
    /// The backend has no node at this URI.
    NoSuchContent,
    /// The backend failed or answered with garbage.
    BackendUnavailable,
}

impl NotFoundReason {
    /// Metric/log label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidPath => "invalid_path",
            Self::ReservedPath => "reserved_path",
            Self::ConfigurationMissing => "configuration_missing",
            Self::NoSuchContent => "no_such_content",
            Self::BackendUnavailable => "backend_unavailable",
        }
    }
}

impl From<&Error> for NotFoundReason {
    fn from(err: &Error) -> Self {
        match err {
            Error::InvalidPath => Self::InvalidPath,
            Error::ConfigurationMissing(_) => Self::ConfigurationMissing,
            Error::BackendUnavailable(_) | Error::MalformedResponse(_) => Self::BackendUnavailable,
        }
    }
}

/// What the HTTP layer should send back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedResponse {
    /// Redirect to `destination`.
    Redirect {
        /// Absolute destination URL.
        destination: Url,
        /// 301 when true, 302 otherwise.
        permanent: bool,
    },
    /// Render a preview page for `node`.
    Render {
        /// The resolved content.
        node: ContentNode,
        /// Joined request path, used for canonical URLs.
        path: String,
        /// Request host, used for canonical URLs and the site name.
        host: String,
    },
    /// Answer 404.
    NotFound {
        /// Internal reason.
        reason: NotFoundReason,
    },
}

impl ResolvedResponse {
    /// Metric/log label for the outcome.
    pub fn outcome(&self) -> &'static str {
        match self {
            Self::Redirect { .. } => "redirect",
            Self::Render { .. } => "render",
            Self::NotFound { .. } => "not_found",
        }
    }
}

/// Classifier and resolver bundled behind one entry point.
///
/// Holds no mutable state; share it behind an `Arc`.
#[derive(Debug, Clone)]
pub struct Engine {
    classifier: Classifier,
    resolver: Resolver,
}

impl Engine {
    /// Create an engine.
    pub fn new(classifier: Classifier, resolver: Resolver) -> Self {
        Self {
            classifier,
            resolver,
        }
    }

    /// The request classifier.
    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    /// The content resolver.
    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    /// Decide the response for one request.
    ///
    /// `client` is `None` when no backend endpoint is configured. It is only
    /// touched for render decisions, and at most once.
    pub async fn decide(
        &self,
        ctx: &RequestContext,
        client: Option<&dyn QueryClient>,
    ) -> ResolvedResponse {
        let response = self.decide_inner(ctx, client).await;

        metrics::record_decision(response.outcome());
        match &response {
            ResolvedResponse::Redirect {
                destination,
                permanent,
            } => {
                tracing::debug!(
                    mode = self.classifier.mode(ctx).as_str(),
                    destination = %destination,
                    permanent,
                    "redirecting"
                );
            }
            ResolvedResponse::Render { node, path, .. } => {
                tracing::debug!(path = %path, kind = %node.kind, id = %node.id, "rendering preview");
            }
            ResolvedResponse::NotFound { reason } => {
                metrics::record_not_found(reason.as_str());
            }
        }

        response
    }

    async fn decide_inner(
        &self,
        ctx: &RequestContext,
        client: Option<&dyn QueryClient>,
    ) -> ResolvedResponse {
        let classification = match self.classifier.classify(ctx) {
            Ok(classification) => classification,
            Err(err) => return not_found_from(&err, ctx),
        };

        let path = match classification {
            ClassificationResult::Redirect {
                destination,
                permanent,
            } => {
                return ResolvedResponse::Redirect {
                    destination,
                    permanent,
                };
            }
            ClassificationResult::NotFound => {
                tracing::debug!(path = ?ctx.path_segments, "reserved path");
                return ResolvedResponse::NotFound {
                    reason: NotFoundReason::ReservedPath,
                };
            }
            ClassificationResult::Render { path } => path,
        };

        let Some(client) = client else {
            return not_found_from(&Error::ConfigurationMissing("GRAPHQL_ENDPOINT"), ctx);
        };

        match self.resolver.resolve(&path, client).await {
            Ok(Some(node)) => ResolvedResponse::Render {
                node,
                path,
                host: ctx.host.clone(),
            },
            Ok(None) => {
                tracing::debug!(path = %path, "no content at path");
                ResolvedResponse::NotFound {
                    reason: NotFoundReason::NoSuchContent,
                }
            }
            Err(err) => not_found_from(&err, ctx),
        }
    }
}

fn not_found_from(err: &Error, ctx: &RequestContext) -> ResolvedResponse {
    let reason = NotFoundReason::from(err);
    match reason {
        NotFoundReason::BackendUnavailable | NotFoundReason::ConfigurationMissing => {
            tracing::warn!(error = %err, path = ?ctx.path_segments, "serving not found");
        }
        _ => {
            tracing::debug!(error = %err, path = ?ctx.path_segments, "serving not found");
        }
    }
    ResolvedResponse::NotFound { reason }
}
