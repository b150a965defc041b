//! Route definitions for the preview service.
//!
//! ## Routes
//!
//! - `GET /` - Empty content path (always 404)
//! - `GET /health` - Health check (JSON)
//! - `GET /robots.txt` - Crawler instructions
//! - `GET /{*postpath}` - Preview page or redirect

mod health;
mod preview;

use axum::Router;
use axum::response::IntoResponse;
use axum::routing::get;

use crate::state::AppState;

/// Build the complete preview service router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(preview::root_handler))
        .route("/health", get(health::health_check))
        .route("/robots.txt", get(robots_txt))
        .route("/{*postpath}", get(preview::preview_handler))
        .with_state(state)
}

/// Serve robots.txt allowing all crawlers.
///
/// Link previews depend on crawlers fetching these pages.
async fn robots_txt() -> impl IntoResponse {
    (
        [("content-type", "text/plain; charset=utf-8")],
        "User-agent: *\nAllow: /\n",
    )
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use postpath_core::{ClassifierPolicy, GraphQlRequest, QueryClient, QueryError};
    use serde_json::json;
    use tower::ServiceExt;
    use url::Url;

    use super::*;
    use crate::config::Config;

    /// Serves a fixed node for `/my-post/` and nothing for anything else.
    #[derive(Default)]
    struct FixtureClient {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl QueryClient for FixtureClient {
        async fn execute(
            &self,
            request: &GraphQlRequest,
        ) -> Result<serde_json::Value, QueryError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if request.variables["uri"] == "/my-post/" {
                Ok(json!({
                    "nodeByUri": {
                        "__typename": "Post",
                        "id": "cG9zdDox",
                        "title": "Hello",
                        "excerpt": "<p>Intro</p>",
                        "content": "<p>Body</p>",
                        "dateGmt": "2024-05-01T10:00:00",
                        "featuredImage": { "node": { "sourceUrl": "https://cdn.example.com/a.jpg", "altText": "" } }
                    }
                }))
            } else {
                Ok(json!({ "nodeByUri": null }))
            }
        }
    }

    fn app() -> (Router, Arc<FixtureClient>) {
        let config = Config {
            graphql_endpoint: Some(Url::parse("https://cms.example.com/graphql").unwrap()),
            ..Config::default()
        };
        let client = Arc::new(FixtureClient::default());
        let state = AppState::with_client(config, Some(client.clone() as Arc<dyn QueryClient>));
        (router(state), client)
    }

    fn user_agent_app() -> (Router, Arc<FixtureClient>) {
        let config = Config {
            graphql_endpoint: Some(Url::parse("https://cms.example.com/graphql").unwrap()),
            classifier_policy: ClassifierPolicy::UserAgent,
            redirect_base: Some(Url::parse("https://life.example.net").unwrap()),
            ..Config::default()
        };
        let client = Arc::new(FixtureClient::default());
        let state = AppState::with_client(config, Some(client.clone() as Arc<dyn QueryClient>));
        (router(state), client)
    }

    fn get_request(uri: &str, headers: &[(header::HeaderName, &str)]) -> Request<Body> {
        let mut builder = Request::builder().uri(uri).header(header::HOST, "news.example.com");
        for (name, value) in headers {
            builder = builder.header(name.clone(), *value);
        }
        builder.body(Body::empty()).unwrap()
    }

    async fn body_string(response: axum::response::Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn facebook_referrer_is_redirected_without_backend_call() {
        let (app, client) = app();
        let response = app
            .oneshot(get_request(
                "/my-post",
                &[(header::REFERER, "https://www.facebook.com/some/feed")],
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FOUND);
        let location = response.headers()[header::LOCATION].to_str().unwrap();
        assert!(location.contains("my-post"));
        assert!(location.starts_with("https://cms.example.com/"));
        assert_ne!(location, "https://news.example.com/my-post");
        assert_eq!(response.headers()[header::CACHE_CONTROL], "no-store");
        assert_eq!(client.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn tracking_marker_is_redirected() {
        let (app, _client) = app();
        let response = app
            .oneshot(get_request("/my-post?fbclid=IwAR0abc", &[]))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FOUND);
    }

    #[tokio::test]
    async fn crawler_gets_rendered_preview() {
        let (app, client) = app();
        let response = app
            .oneshot(get_request(
                "/my-post",
                &[(header::USER_AGENT, "facebookexternalhit/1.1")],
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/html; charset=utf-8"
        );
        assert!(response.headers().contains_key(header::ETAG));
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);

        let html = body_string(response).await;
        assert!(html.contains(r#"<meta property="og:title" content="Hello">"#));
        assert!(html.contains(r#"<meta property="og:image:alt" content="Hello">"#));
        assert!(html.contains(r#"<link rel="canonical" href="https://news.example.com/my-post">"#));
        assert!(html.contains("<p>Body</p>"));
    }

    #[tokio::test]
    async fn user_agent_policy_redirects_browsers() {
        let (app, client) = user_agent_app();
        let response = app
            .oneshot(get_request(
                "/my-post",
                &[(header::USER_AGENT, "Mozilla/5.0 (X11; Linux x86_64) Firefox/128.0")],
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(
            response.headers()[header::LOCATION],
            "https://life.example.net/my-post"
        );
        assert_eq!(client.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn user_agent_policy_renders_for_crawlers() {
        let (app, client) = user_agent_app();
        let response = app
            .oneshot(get_request(
                "/my-post",
                &[(header::USER_AGENT, "facebookexternalhit/1.1")],
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);
        let html = body_string(response).await;
        assert!(html.contains(r#"<meta property="og:title" content="Hello">"#));
    }

    #[tokio::test]
    async fn missing_content_is_404() {
        let (app, client) = app();
        let response = app
            .oneshot(get_request("/missing-page", &[]))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn root_is_404_without_backend_call() {
        let (app, client) = app();
        let response = app.oneshot(get_request("/", &[])).await.unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(client.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn favicon_is_404_without_backend_call() {
        let (app, client) = app();
        let response = app
            .oneshot(get_request("/favicon.ico", &[]))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(client.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unconfigured_backend_is_404() {
        let state = AppState::with_client(Config::default(), None);
        let response = router(state)
            .oneshot(get_request("/my-post", &[]))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn robots_allows_everything() {
        let (app, _client) = app();
        let response = app.oneshot(get_request("/robots.txt", &[])).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "User-agent: *\nAllow: /\n");
    }

    #[tokio::test]
    async fn health_reports_backend() {
        let (app, _client) = app();
        let response = app.oneshot(get_request("/health", &[])).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "postpath-preview");
        assert_eq!(body["backend_configured"], true);
    }
}
