//! Per-request input to the decision engine.

use std::collections::BTreeMap;

use crate::error::{Error, Result};

/// Query-string parameters, keeping every value of repeated keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams(BTreeMap<String, Vec<String>>);

impl QueryParams {
    /// Build from decoded `(name, value)` pairs in request order.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut map: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (k, v) in pairs {
            map.entry(k.into()).or_default().push(v.into());
        }
        Self(map)
    }

    /// True if the parameter appears at all, even as `?name` or `?name=`.
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// First value of a parameter.
    pub fn first(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(|v| v.first()).map(String::as_str)
    }

    /// All values of a parameter, in request order.
    pub fn all(&self, name: &str) -> &[String] {
        self.0.get(name).map(Vec::as_slice).unwrap_or_default()
    }
}

/// Request metadata the engine decides on.
///
/// Built once per request by the HTTP layer and never mutated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    /// `Referer` header value.
    pub referrer: Option<String>,
    /// `User-Agent` header value.
    pub user_agent: Option<String>,
    /// Decoded query-string parameters.
    pub query: QueryParams,
    /// Requested path, one entry per segment.
    pub path_segments: Vec<String>,
    /// `Host` header value, used for canonical URLs and the site name.
    pub host: String,
}

impl RequestContext {
    /// Join the path segments with `/`.
    ///
    /// Fails with [`Error::InvalidPath`] when there are no segments or the
    /// joined path is nothing but slashes.
    pub fn joined_path(&self) -> Result<String> {
        join_path(&self.path_segments)
    }
}

/// Join path segments with `/`, rejecting paths that name nothing.
pub fn join_path<S: AsRef<str>>(segments: &[S]) -> Result<String> {
    let joined = segments
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join("/");

    if joined.trim_matches('/').trim().is_empty() {
        return Err(Error::InvalidPath);
    }

    Ok(joined)
}

/// Split a raw wildcard path (`a/b/c`) into segments.
///
/// Leading and trailing slashes are dropped so `/a/b/` and `a/b` yield the
/// same segments; interior segments are kept verbatim.
pub fn split_path(raw: &str) -> Vec<String> {
    let trimmed = raw.trim_matches('/');
    if trimmed.is_empty() {
        return Vec::new();
    }
    trimmed.split('/').map(str::to_string).collect()
}
