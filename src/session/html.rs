//! HTTP-backed browsing session
//!
//! Each context holds the last document fetched into it, parsed once when it
//! arrives. Matched elements are recorded as child-index paths from the
//! document root under session-unique ids, so a handle never outlives the
//! document it was found in. Every context has its own lock; work in one
//! context never waits on another.

use crate::config::UserAgentConfig;
use crate::session::{
    BrowsingSession, ContextHandle, ElementHandle, Navigation, SessionError, SessionResult,
};
use async_trait::async_trait;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// Builds an HTTP client identifying the harvester
///
/// # Example
///
/// ```no_run
/// use kp_harvest::config::UserAgentConfig;
/// use kp_harvest::session::build_http_client;
/// use std::time::Duration;
///
/// let config = UserAgentConfig {
///     crawler_name: "KpHarvest".to_string(),
///     crawler_version: "1.0".to_string(),
///     contact_url: "https://example.com/about".to_string(),
///     contact_email: "admin@example.com".to_string(),
/// };
///
/// let client = build_http_client(&config, Duration::from_secs(120)).unwrap();
/// ```
pub fn build_http_client(
    config: &UserAgentConfig,
    timeout: Duration,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Document currently loaded in a context
struct LoadedPage {
    document: Html,
    /// Element id to child indexes from the document root
    elements: HashMap<u64, Vec<usize>>,
}

impl LoadedPage {
    fn element(&self, handle: ElementHandle) -> SessionResult<ElementRef<'_>> {
        self.elements
            .get(&handle.0)
            .and_then(|path| element_at(&self.document, path))
            .ok_or(SessionError::StaleElement(handle))
    }
}

#[derive(Default)]
struct ContextState {
    page: Option<LoadedPage>,
}

type SharedState = Arc<Mutex<ContextState>>;

/// Browsing session over plain HTTP and static HTML
pub struct HtmlSession {
    client: Client,
    next_context: AtomicU64,
    next_element: AtomicU64,
    contexts: Mutex<HashMap<ContextHandle, SharedState>>,
}

impl HtmlSession {
    /// Creates a session that fetches documents with `client`
    pub fn new(client: Client) -> Self {
        Self {
            client,
            next_context: AtomicU64::new(1),
            next_element: AtomicU64::new(0),
            contexts: Mutex::new(HashMap::new()),
        }
    }

    /// Creates a session with a client built from the user agent configuration
    pub fn from_config(
        user_agent: &UserAgentConfig,
        navigation_timeout: Duration,
    ) -> crate::Result<Self> {
        Ok(Self::new(build_http_client(user_agent, navigation_timeout)?))
    }

    /// Number of contexts currently open
    pub fn open_contexts(&self) -> usize {
        lock(&self.contexts).len()
    }

    /// State of one context; the context map is released before returning
    fn state(&self, ctx: ContextHandle) -> SessionResult<SharedState> {
        lock(&self.contexts)
            .get(&ctx)
            .cloned()
            .ok_or(SessionError::UnknownContext(ctx))
    }

    fn store_page(&self, ctx: ContextHandle, body: &str) -> SessionResult<()> {
        let document = Html::parse_document(body);
        let state = self.state(ctx)?;
        lock(&state).page = Some(LoadedPage {
            document,
            elements: HashMap::new(),
        });
        Ok(())
    }

    /// Runs `selector` over the document (or below `scope`) and registers the matches
    fn select(
        &self,
        ctx: ContextHandle,
        scope: Option<ElementHandle>,
        selector: &str,
        limit: Option<usize>,
    ) -> SessionResult<Vec<ElementHandle>> {
        let parsed = Selector::parse(selector)
            .map_err(|_| SessionError::InvalidSelector(selector.to_string()))?;
        let limit = limit.unwrap_or(usize::MAX);

        let shared = self.state(ctx)?;
        let mut state = lock(&shared);
        let page = state.page.as_mut().ok_or(SessionError::NoDocument(ctx))?;

        let paths: Vec<Vec<usize>> = match scope {
            None => page
                .document
                .select(&parsed)
                .take(limit)
                .map(node_path)
                .collect(),
            Some(handle) => {
                let scope_element = page.element(handle)?;
                scope_element
                    .select(&parsed)
                    .filter(|element| element.id() != scope_element.id())
                    .take(limit)
                    .map(node_path)
                    .collect()
            }
        };

        let handles = paths
            .into_iter()
            .map(|path| {
                let id = self.next_element.fetch_add(1, Ordering::Relaxed);
                page.elements.insert(id, path);
                ElementHandle(id)
            })
            .collect();
        Ok(handles)
    }

    /// Reads something from one registered element
    fn read<T>(
        &self,
        ctx: ContextHandle,
        element: ElementHandle,
        f: impl FnOnce(ElementRef<'_>) -> T,
    ) -> SessionResult<T> {
        let shared = self.state(ctx)?;
        let state = lock(&shared);
        let page = state.page.as_ref().ok_or(SessionError::NoDocument(ctx))?;
        let found = page.element(element)?;
        Ok(f(found))
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    // A poisoned lock only means a reader panicked; parsed documents are
    // never left half-written
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Child-index path from the document root to `element`
fn node_path(element: ElementRef<'_>) -> Vec<usize> {
    let mut path = Vec::new();
    let mut node = *element;
    while let Some(parent) = node.parent() {
        path.push(node.prev_siblings().count());
        node = parent;
    }
    path.reverse();
    path
}

/// Follows a path produced by [`node_path`]
fn element_at<'a>(document: &'a Html, path: &[usize]) -> Option<ElementRef<'a>> {
    let mut node = document.tree.root();
    for &index in path {
        node = node.children().nth(index)?;
    }
    ElementRef::wrap(node)
}

#[async_trait]
impl BrowsingSession for HtmlSession {
    async fn navigate(&self, ctx: ContextHandle, url: &str) -> SessionResult<Navigation> {
        self.state(ctx)?;

        tracing::debug!("Navigating {:?} to {}", ctx, url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| SessionError::Http {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        let final_url = response.url().to_string();
        if !status.is_success() {
            return Err(SessionError::Status {
                url: final_url,
                status: status.as_u16(),
            });
        }

        // A missing Content-Type is tolerated; an explicit non-HTML one is not
        if let Some(content_type) = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
        {
            if !content_type.contains("html") {
                return Err(SessionError::ContentMismatch {
                    url: final_url,
                    content_type: content_type.to_string(),
                });
            }
        }

        let body = response.text().await.map_err(|source| SessionError::Http {
            url: final_url.clone(),
            source,
        })?;
        self.store_page(ctx, &body)?;

        Ok(Navigation {
            final_url,
            status: status.as_u16(),
        })
    }

    async fn wait_for_ready(
        &self,
        ctx: ContextHandle,
        marker: &str,
        _timeout: Duration,
    ) -> SessionResult<()> {
        // Static documents never change after loading, so the marker is
        // either there now or never
        if self.select(ctx, None, marker, Some(1))?.is_empty() {
            Err(SessionError::NotReady {
                marker: marker.to_string(),
            })
        } else {
            Ok(())
        }
    }

    async fn query_all(
        &self,
        ctx: ContextHandle,
        scope: Option<ElementHandle>,
        selector: &str,
    ) -> SessionResult<Vec<ElementHandle>> {
        self.select(ctx, scope, selector, None)
    }

    async fn query_one(
        &self,
        ctx: ContextHandle,
        scope: Option<ElementHandle>,
        selector: &str,
    ) -> SessionResult<Option<ElementHandle>> {
        Ok(self.select(ctx, scope, selector, Some(1))?.into_iter().next())
    }

    async fn extract_text(
        &self,
        ctx: ContextHandle,
        element: ElementHandle,
    ) -> SessionResult<Option<String>> {
        self.read(ctx, element, |found| Some(found.text().collect::<String>()))
    }

    async fn extract_attribute(
        &self,
        ctx: ContextHandle,
        element: ElementHandle,
        name: &str,
    ) -> SessionResult<Option<String>> {
        self.read(ctx, element, |found| {
            found.value().attr(name).map(|value| value.to_string())
        })
    }

    async fn open_isolated_context(&self) -> SessionResult<ContextHandle> {
        let ctx = ContextHandle(self.next_context.fetch_add(1, Ordering::Relaxed));
        lock(&self.contexts).insert(ctx, SharedState::default());
        tracing::trace!("Opened {:?}", ctx);
        Ok(ctx)
    }

    async fn close_context(&self, ctx: ContextHandle) -> SessionResult<()> {
        lock(&self.contexts)
            .remove(&ctx)
            .map(|_| tracing::trace!("Closed {:?}", ctx))
            .ok_or(SessionError::UnknownContext(ctx))
    }
}
