//! Test helpers serving HTML fixtures over a mock HTTP server

use crate::config::{parse_config, Config};
use crate::session::{
    BrowsingSession, ContextHandle, ElementHandle, HtmlSession, Navigation, SessionResult,
};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Wraps a body fragment into a full document
pub fn html_page(body: &str) -> String {
    format!("<html><head><title>test</title></head><body>{}</body></html>", body)
}

/// An HTML response
pub fn html_response(html: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(html.as_bytes().to_vec(), "text/html; charset=utf-8")
}

/// Starts a server answering GET `path` with the paired document
pub async fn serve(pages: &[(&str, &str)]) -> MockServer {
    let server = MockServer::start().await;
    for (page_path, html) in pages {
        mount(&server, page_path, html).await;
    }
    server
}

/// Answers GET `page_path` with `html`
pub async fn mount(server: &MockServer, page_path: &str, html: &str) {
    Mock::given(method("GET"))
        .and(path(page_path))
        .respond_with(html_response(html))
        .mount(server)
        .await;
}

/// Answers GET `page_path?page={page}` with `html`
pub async fn mount_search_page(server: &MockServer, page_path: &str, page: u32, html: &str) {
    Mock::given(method("GET"))
        .and(path(page_path))
        .and(query_param("page", page.to_string()))
        .respond_with(html_response(html))
        .mount(server)
        .await;
}

/// A valid configuration pointing at `base_url`, with short timeouts and ids
/// for the fixture categories; `extra` is appended as further TOML sections
pub fn test_config(base_url: &str, extra: &str) -> Arc<Config> {
    let toml = format!(
        r#"
[site]
base-url = "{}/"

[user-agent]
crawler-name = "TestHarvester"
crawler-version = "1.0"
contact-url = "https://example.com/about"
contact-email = "admin@example.com"

[session]
navigation-timeout-ms = 2000
ready-timeout-ms = 500

[category-ids]
alati-i-orudja = 10
elektricni-alati = 11
automobili = 2013
audi = 2014

{}
"#,
        base_url, extra
    );
    Arc::new(parse_config(&toml).unwrap())
}

/// An `HtmlSession` whose pages take `delay` to show their ready marker
pub struct SlowReadySession {
    pub inner: HtmlSession,
    pub delay: Duration,
}

impl SlowReadySession {
    pub fn new(delay: Duration) -> Self {
        Self {
            inner: HtmlSession::new(reqwest::Client::new()),
            delay,
        }
    }
}

#[async_trait]
impl BrowsingSession for SlowReadySession {
    async fn navigate(&self, ctx: ContextHandle, url: &str) -> SessionResult<Navigation> {
        self.inner.navigate(ctx, url).await
    }

    async fn wait_for_ready(
        &self,
        ctx: ContextHandle,
        marker: &str,
        timeout: Duration,
    ) -> SessionResult<()> {
        tokio::time::sleep(self.delay).await;
        self.inner.wait_for_ready(ctx, marker, timeout).await
    }

    async fn query_all(
        &self,
        ctx: ContextHandle,
        scope: Option<ElementHandle>,
        selector: &str,
    ) -> SessionResult<Vec<ElementHandle>> {
        self.inner.query_all(ctx, scope, selector).await
    }

    async fn query_one(
        &self,
        ctx: ContextHandle,
        scope: Option<ElementHandle>,
        selector: &str,
    ) -> SessionResult<Option<ElementHandle>> {
        self.inner.query_one(ctx, scope, selector).await
    }

    async fn extract_text(
        &self,
        ctx: ContextHandle,
        element: ElementHandle,
    ) -> SessionResult<Option<String>> {
        self.inner.extract_text(ctx, element).await
    }

    async fn extract_attribute(
        &self,
        ctx: ContextHandle,
        element: ElementHandle,
        name: &str,
    ) -> SessionResult<Option<String>> {
        self.inner.extract_attribute(ctx, element, name).await
    }

    async fn open_isolated_context(&self) -> SessionResult<ContextHandle> {
        self.inner.open_isolated_context().await
    }

    async fn close_context(&self, ctx: ContextHandle) -> SessionResult<()> {
        self.inner.close_context(ctx).await
    }
}
