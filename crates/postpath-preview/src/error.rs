//! Error types for the preview service.
//!
//! Errors are rendered as simple HTML error pages rather than JSON, since
//! visitors and crawlers both expect HTML here.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use maud::{DOCTYPE, html};

/// Preview service error type.
#[derive(Debug, thiserror::Error)]
pub enum PreviewError {
    /// The request path could not be decoded.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// No preview exists for this path. The payload is for logs only.
    #[error("not found: {0}")]
    NotFound(String),

    /// Internal server error (response construction, etc.).
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for PreviewError {
    fn into_response(self) -> Response {
        let (status, title, message) = match &self {
            Self::BadRequest(msg) => {
                tracing::debug!(error = %msg, "bad request");
                (
                    StatusCode::BAD_REQUEST,
                    "Bad Request",
                    "The requested address could not be understood.",
                )
            }
            Self::NotFound(reason) => {
                tracing::debug!(reason = %reason, "not found");
                (
                    StatusCode::NOT_FOUND,
                    "Not Found",
                    "The page you are looking for does not exist.",
                )
            }
            Self::Internal(err) => {
                tracing::error!(error = %err, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Error",
                    "An internal error occurred. Please try again later.",
                )
            }
        };

        let markup = html! {
            (DOCTYPE)
            html lang="en" {
                head {
                    meta charset="utf-8";
                    meta name="viewport" content="width=device-width, initial-scale=1";
                    title { (title) }
                    meta name="robots" content="noindex";
                    style { (maud::PreEscaped(crate::render::components::ERROR_CSS)) }
                }
                body {
                    main class="error-page" {
                        h1 { (title) }
                        p { (message) }
                    }
                }
            }
        };

        (status, markup).into_response()
    }
}
