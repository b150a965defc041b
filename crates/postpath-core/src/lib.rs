//! Request classification and content resolution for postpath.
//!
//! This crate provides:
//! - A [`Classifier`] that decides whether a request gets a preview page or a
//!   redirect, from its referrer, user-agent, query string and path
//! - A [`Resolver`] that looks one post or page up in a GraphQL content
//!   backend through an injected [`QueryClient`]
//! - An [`Engine`] composing the two into a single infallible
//!   [`ResolvedResponse`] per request
//! - Prometheus metrics helpers
//!
//! Nothing here performs HTTP itself; the `postpath-preview` crate supplies
//! the server and the backend client.

mod classify;
mod content;
mod engine;
mod error;
pub mod metrics;
mod request;
mod resolve;

pub use classify::{
    ClassificationResult, Classifier, ClassifierConfig, ClassifierPolicy, RequestMode,
    append_path, content_site_base, is_crawler,
};
pub use content::{ContentKind, ContentNode, FeaturedImage, strip_tags};
pub use engine::{Engine, NotFoundReason, ResolvedResponse};
pub use error::{Error, QueryError, Result};
pub use request::{QueryParams, RequestContext, join_path, split_path};
pub use resolve::{GraphQlRequest, QueryClient, QueryForm, Resolver, content_uri};
