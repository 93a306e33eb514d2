//! Browsing-session contract the engine drives workers through.
//!
//! The engine depends on exactly this capability set plus per-call timeouts;
//! it never touches a browser library directly. The production implementation
//! lives in `entidades-browser`; tests script in-memory fakes.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;

/// Outcome of a bounded wait for a selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectorOutcome {
    Found,
    TimedOut,
}

/// One exclusive browsing session.
///
/// A session belongs to a single worker for its whole lifetime and is closed
/// exactly once, by that worker.
#[async_trait]
pub trait Session: Send {
    /// Navigate to `url`, failing if the load does not start within `timeout`.
    async fn navigate(&mut self, url: &str, timeout: Duration) -> Result<()>;

    /// Wait for the current document to finish loading.
    async fn await_network_idle(&mut self, timeout: Duration) -> Result<()>;

    /// Wait up to `timeout` for `selector` to appear. A missing selector is
    /// an outcome, not an error.
    async fn await_selector(
        &mut self,
        selector: &str,
        timeout: Duration,
    ) -> Result<SelectorOutcome>;

    /// Click the first element matching `selector`.
    async fn click(&mut self, selector: &str) -> Result<()>;

    /// Snapshot of the rendered DOM, for the pure extraction functions.
    async fn document(&mut self) -> Result<String>;

    /// Tear the session down. Further calls are invalid.
    async fn close(&mut self) -> Result<()>;
}

/// Creates one exclusive [`Session`] per worker.
#[async_trait]
pub trait SessionFactory: Send + Sync + 'static {
    type Session: Session + 'static;

    async fn open(&self, worker_id: u32) -> Result<Self::Session>;
}
