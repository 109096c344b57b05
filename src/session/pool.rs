//! Bounded pool of isolated browsing contexts
//!
//! Enrichment work runs in parallel only through this pool: each task checks
//! out a fresh context, uses it exclusively, and the context is closed when
//! the lease ends. A semaphore caps how many contexts are open at once.

use crate::session::{BrowsingSession, ContextHandle, SessionError};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Pool of isolated contexts with a fixed upper bound
pub struct ContextPool {
    session: Arc<dyn BrowsingSession>,
    permits: Arc<Semaphore>,
    size: usize,
}

impl ContextPool {
    /// Creates a pool allowing at most `size` open contexts (at least one)
    pub fn new(session: Arc<dyn BrowsingSession>, size: usize) -> Self {
        let size = size.max(1);
        Self {
            session,
            permits: Arc::new(Semaphore::new(size)),
            size,
        }
    }

    /// Maximum number of simultaneously open contexts
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of contexts that could be checked out right now
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    /// Waits for a free slot and opens a fresh isolated context in it
    pub async fn checkout(&self) -> Result<PooledContext, SessionError> {
        let permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| SessionError::PoolClosed)?;
        let ctx = self.session.open_isolated_context().await?;
        tracing::trace!("Checked out {:?} ({} slots left)", ctx, self.available());

        Ok(PooledContext {
            session: Arc::clone(&self.session),
            ctx,
            permit: Some(permit),
            open: true,
        })
    }

    /// Runs `work` in its own context and closes the context afterwards,
    /// whether `work` succeeded or not
    pub async fn with_context<F, Fut, T, E>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce(ContextHandle) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: From<SessionError>,
    {
        let lease = self.checkout().await?;
        let result = work(lease.handle()).await;
        lease.release().await;
        result
    }
}

/// A checked-out context; closing it returns the slot to the pool
///
/// Call [`PooledContext::release`] to close it. A lease dropped without
/// release (a cancelled task) closes its context on the runtime in the
/// background and frees the slot once that close finishes.
pub struct PooledContext {
    session: Arc<dyn BrowsingSession>,
    ctx: ContextHandle,
    permit: Option<OwnedSemaphorePermit>,
    open: bool,
}

impl PooledContext {
    /// The context this lease grants exclusive use of
    pub fn handle(&self) -> ContextHandle {
        self.ctx
    }

    /// Closes the context and frees the slot
    pub async fn release(mut self) {
        self.open = false;
        if let Err(e) = self.session.close_context(self.ctx).await {
            tracing::warn!("Failed to close {:?}: {}", self.ctx, e);
        }
        self.permit.take();
    }
}

impl Drop for PooledContext {
    fn drop(&mut self) {
        if !self.open {
            return;
        }

        let session = Arc::clone(&self.session);
        let ctx = self.ctx;
        let permit = self.permit.take();
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(async move {
                    if let Err(e) = session.close_context(ctx).await {
                        tracing::warn!("Failed to close abandoned {:?}: {}", ctx, e);
                    }
                    drop(permit);
                });
            }
            Err(_) => tracing::warn!("{:?} dropped outside a runtime and left open", ctx),
        }
    }
}
