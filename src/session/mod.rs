//! Browsing session abstraction
//!
//! The engine never owns a browser. It issues calls against a
//! [`BrowsingSession`] and names the navigable view it means with an explicit
//! [`ContextHandle`]. One context has one cursor, so calls against the same
//! context must be sequential; parallel work checks isolated contexts out of
//! a [`ContextPool`].
//!
//! # Components
//!
//! - `BrowsingSession`: the consumed interface (navigate, wait, query, extract)
//! - `HtmlSession`: HTTP-fetched documents queried with CSS selectors
//! - `ContextPool`: bounded checkout/checkin of isolated contexts

mod html;
mod pool;
#[cfg(test)]
pub(crate) mod testing;

pub use html::{build_http_client, HtmlSession};
pub use pool::{ContextPool, PooledContext};

use crate::config::SessionConfig;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// A navigable, isolated view onto remote documents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextHandle(pub u64);

/// An element found in the document currently loaded in a context
///
/// Handles are invalidated by the next navigation of their context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementHandle(pub u64);

/// Outcome of a successful navigation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    /// Address after redirects; relative links resolve against it
    pub final_url: String,
    /// HTTP status code
    pub status: u16,
}

/// Errors reported by a browsing session
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Expected HTML from {url}, got {content_type}")]
    ContentMismatch { url: String, content_type: String },

    #[error("Marker '{marker}' not present")]
    NotReady { marker: String },

    #[error("Invalid selector '{0}'")]
    InvalidSelector(String),

    #[error("Unknown context {0:?}")]
    UnknownContext(ContextHandle),

    #[error("Context {0:?} has no document loaded")]
    NoDocument(ContextHandle),

    #[error("Element {0:?} does not belong to the current document")]
    StaleElement(ElementHandle),

    #[error("Context pool is closed")]
    PoolClosed,
}

/// Result type alias for session operations
pub type SessionResult<T> = std::result::Result<T, SessionError>;

/// The browsing-session collaborator
///
/// Implementations must keep contexts isolated from each other: a navigation
/// in one context never changes what another context observes.
#[async_trait]
pub trait BrowsingSession: Send + Sync {
    /// Loads `url` into the context, replacing its current document
    async fn navigate(&self, ctx: ContextHandle, url: &str) -> SessionResult<Navigation>;

    /// Resolves once an element matching `marker` is present
    async fn wait_for_ready(
        &self,
        ctx: ContextHandle,
        marker: &str,
        timeout: Duration,
    ) -> SessionResult<()>;

    /// All elements matching `selector`, in document order
    ///
    /// With a `scope`, only descendants of that element are searched.
    async fn query_all(
        &self,
        ctx: ContextHandle,
        scope: Option<ElementHandle>,
        selector: &str,
    ) -> SessionResult<Vec<ElementHandle>>;

    /// The first element matching `selector`, if any
    async fn query_one(
        &self,
        ctx: ContextHandle,
        scope: Option<ElementHandle>,
        selector: &str,
    ) -> SessionResult<Option<ElementHandle>>;

    /// Text content of an element
    async fn extract_text(
        &self,
        ctx: ContextHandle,
        element: ElementHandle,
    ) -> SessionResult<Option<String>>;

    /// Raw value of an attribute
    async fn extract_attribute(
        &self,
        ctx: ContextHandle,
        element: ElementHandle,
        name: &str,
    ) -> SessionResult<Option<String>>;

    /// Opens a fresh context with no shared navigation cursor
    async fn open_isolated_context(&self) -> SessionResult<ContextHandle>;

    /// Closes a context and frees everything it holds
    async fn close_context(&self, ctx: ContextHandle) -> SessionResult<()>;
}

/// Why a page could not be brought to its expected state
#[derive(Debug, Error)]
pub enum ReachError {
    #[error("navigation timed out after {0:?}")]
    NavigationTimeout(Duration),

    #[error("page did not become ready within {0:?}")]
    ReadyTimeout(Duration),

    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Navigates and waits for `marker`, each step bounded by its configured timeout
///
/// The caller decides which error the failure becomes (category navigation
/// and search pages report it as a navigation error, detail pages as an
/// unavailable detail).
pub async fn reach(
    session: &dyn BrowsingSession,
    ctx: ContextHandle,
    url: &str,
    marker: &str,
    timeouts: &SessionConfig,
) -> Result<Navigation, ReachError> {
    let navigation_timeout = timeouts.navigation_timeout();
    let navigation = tokio::time::timeout(navigation_timeout, session.navigate(ctx, url))
        .await
        .map_err(|_| ReachError::NavigationTimeout(navigation_timeout))??;

    let ready_timeout = timeouts.ready_timeout();
    tokio::time::timeout(
        ready_timeout,
        session.wait_for_ready(ctx, marker, ready_timeout),
    )
    .await
    .map_err(|_| ReachError::ReadyTimeout(ready_timeout))??;

    tracing::debug!("Reached {} (HTTP {})", navigation.final_url, navigation.status);
    Ok(navigation)
}
