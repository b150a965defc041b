//! Main preview route handler.
//!
//! Handles `GET /{*postpath}` (and `GET /`): builds a [`RequestContext`],
//! asks the engine for a decision and turns it into a redirect, a rendered
//! page, or a 404.

use axum::extract::rejection::PathRejection;
use axum::extract::{Path, RawQuery, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use postpath_core::{QueryParams, RequestContext, ResolvedResponse, split_path};

use crate::error::PreviewError;
use crate::render;
use crate::state::AppState;

/// Handle a preview request for an arbitrary content path.
pub async fn preview_handler(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
    uri: Uri,
) -> Result<Response, PreviewError> {
    let Path(path) = path.map_err(|e| PreviewError::BadRequest(e.body_text()))?;
    let ctx = request_context(split_path(&path), query.as_deref(), &headers, &uri);
    respond(&state, &ctx).await
}

/// Handle `GET /`, which has no content path.
pub async fn root_handler(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
    uri: Uri,
) -> Result<Response, PreviewError> {
    let ctx = request_context(Vec::new(), query.as_deref(), &headers, &uri);
    respond(&state, &ctx).await
}

async fn respond(state: &AppState, ctx: &RequestContext) -> Result<Response, PreviewError> {
    match state.engine.decide(ctx, state.client.as_deref()).await {
        ResolvedResponse::Redirect {
            destination,
            permanent,
        } => redirect_response(destination.as_str(), permanent),
        ResolvedResponse::Render { node, path, host } => {
            let markup = render::render_preview(
                &node,
                &path,
                &host,
                state.config.refresh_base.as_ref(),
            );
            Ok(build_response(&markup.into_string()))
        }
        ResolvedResponse::NotFound { reason } => {
            Err(PreviewError::NotFound(reason.as_str().to_string()))
        }
    }
}

/// Collect the request metadata the engine decides on.
fn request_context(
    path_segments: Vec<String>,
    query: Option<&str>,
    headers: &HeaderMap,
    uri: &Uri,
) -> RequestContext {
    let header_str = |name: header::HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };

    let host = header_str(header::HOST)
        .or_else(|| uri.authority().map(|a| a.to_string()))
        .unwrap_or_else(|| "localhost".to_string());

    let query = query
        .map(|q| QueryParams::from_pairs(url::form_urlencoded::parse(q.as_bytes())))
        .unwrap_or_default();

    RequestContext {
        referrer: header_str(header::REFERER),
        user_agent: header_str(header::USER_AGENT),
        query,
        path_segments,
        host,
    }
}

/// Build a redirect. Never cacheable, since the same URL renders for crawlers.
fn redirect_response(location: &str, permanent: bool) -> Result<Response, PreviewError> {
    let status = if permanent {
        StatusCode::MOVED_PERMANENTLY
    } else {
        StatusCode::FOUND
    };
    let location = HeaderValue::from_str(location)
        .map_err(|e| PreviewError::Internal(anyhow::anyhow!("invalid redirect location: {e}")))?;

    Ok((
        status,
        [
            (header::LOCATION, location),
            (header::CACHE_CONTROL, HeaderValue::from_static("no-store")),
        ],
    )
        .into_response())
}

/// Build an HTTP response with HTML content and security/cache headers.
fn build_response(html: &str) -> Response {
    let mut headers = HeaderMap::new();

    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/html; charset=utf-8"),
    );

    // Security headers
    headers.insert(
        header::CONTENT_SECURITY_POLICY,
        HeaderValue::from_static(render::components::CSP_HEADER),
    );
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );

    // ETag (xxHash of content)
    let hash = xxhash_rust::xxh3::xxh3_64(html.as_bytes());
    let etag = format!("\"{}\"", hex_fmt::HexFmt(&hash.to_be_bytes()));
    if let Ok(val) = HeaderValue::from_str(&etag) {
        headers.insert(header::ETAG, val);
    }

    // Crawlers and visitors get different answers for the same URL.
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));

    (StatusCode::OK, headers, html.to_string()).into_response()
}
