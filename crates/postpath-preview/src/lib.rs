//! postpath preview - link-preview server in front of a headless CMS.
//!
//! Every content path is answered one of three ways depending on who asks:
//!
//! - **Redirect** visitors arriving from flagged referrers, or carrying the
//!   tracking marker, to the content site itself
//! - **Render** a static HTML page with Open Graph tags for everyone else,
//!   crawlers in particular, after one GraphQL lookup
//! - **404** when there is no such content or the backend cannot be reached
//!
//! # URL Pattern
//!
//! ```text
//! GET /{*postpath}
//! ```
//!
//! # Security
//!
//! - Every dynamic value except the backend-supplied body is HTML-escaped by maud
//! - Image URLs are validated (HTTPS/HTTP only) before use in attributes
//! - Strict Content-Security-Policy: no JavaScript execution

pub mod config;
pub mod error;
pub mod graphql;
pub mod render;
pub mod routes;
pub mod state;

pub use config::Config;
pub use routes::router;
pub use state::AppState;
