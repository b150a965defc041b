//! Error types for the decision engine.

use thiserror::Error;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while classifying a request or resolving its content.
///
/// None of these reach the HTTP layer directly: [`crate::Engine::decide`]
/// collapses every variant into a `NotFound` decision.
#[derive(Error, Debug)]
pub enum Error {
    /// The requested path was missing or joined to an empty string.
    #[error("invalid path: the request did not name any content")]
    InvalidPath,

    /// A value needed to serve this request was not configured.
    #[error("configuration missing: {0}")]
    ConfigurationMissing(&'static str),

    /// The backend could not be reached or answered with an error.
    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),

    /// The backend answered, but the payload did not have the expected shape.
    #[error("malformed backend response: {0}")]
    MalformedResponse(String),
}

/// Errors a [`crate::QueryClient`] implementation reports for one request.
#[derive(Error, Debug)]
pub enum QueryError {
    /// The request never produced an HTTP response (DNS, connect, timeout).
    #[error("transport error: {0}")]
    Transport(String),

    /// The backend answered with a non-success HTTP status.
    #[error("backend returned HTTP {status}")]
    Status {
        /// HTTP status code returned by the backend.
        status: u16,
    },

    /// The backend answered with a GraphQL `errors` array.
    #[error("graphql errors: {}", .0.join("; "))]
    GraphQl(Vec<String>),

    /// The response body could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),
}

impl From<QueryError> for Error {
    fn from(err: QueryError) -> Self {
        match err {
            QueryError::Decode(msg) => Self::MalformedResponse(msg),
            other => Self::BackendUnavailable(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::MalformedResponse(err.to_string())
    }
}
