//! Chromium-backed browsing sessions over the Chrome DevTools Protocol.
//!
//! Every worker gets its own Chromium process, so no cookie jar, page handle,
//! or navigation state is ever shared across the pool. All CDP calls run
//! under an explicit timeout.

use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::Page;
use chromiumoxide::browser::{Browser, BrowserConfig};
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::debug;

use entidades_shared::error::{EntidadesError, Result};
use entidades_shared::session::{SelectorOutcome, Session, SessionFactory};

/// How often a selector wait re-queries the DOM.
const SELECTOR_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Budget for a single click once its selector has been found.
const CLICK_TIMEOUT: Duration = Duration::from_secs(5);

/// Await `fut` for at most `duration`, mapping both failure shapes into the
/// shared error model.
async fn with_timeout<T, E, F>(duration: Duration, operation: &str, fut: F) -> Result<T>
where
    E: std::fmt::Display,
    F: Future<Output = std::result::Result<T, E>>,
{
    match tokio::time::timeout(duration, fut).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(EntidadesError::browser(err)),
        Err(_) => Err(EntidadesError::timeout(operation)),
    }
}

// ---------------------------------------------------------------------------
// ChromeFactory
// ---------------------------------------------------------------------------

/// Launches one Chromium per worker.
#[derive(Debug, Clone)]
pub struct ChromeFactory {
    headless: bool,
}

impl ChromeFactory {
    pub fn new(headless: bool) -> Self {
        Self { headless }
    }
}

#[async_trait]
impl SessionFactory for ChromeFactory {
    type Session = ChromeSession;

    async fn open(&self, worker_id: u32) -> Result<ChromeSession> {
        let mut builder = BrowserConfig::builder();
        if !self.headless {
            builder = builder.with_head();
        }
        let config = builder.build().map_err(EntidadesError::Browser)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(EntidadesError::browser)?;

        // The CDP event loop must be polled for the session to make progress.
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                let _ = event;
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(EntidadesError::browser)?;

        debug!(worker_id, "browser session ready");
        Ok(ChromeSession {
            browser,
            page: Some(page),
            handler: handler_task,
        })
    }
}

// ---------------------------------------------------------------------------
// ChromeSession
// ---------------------------------------------------------------------------

/// One Chromium process plus the single page it drives.
pub struct ChromeSession {
    browser: Browser,
    // `Page::close` consumes the page, so it lives behind an Option that
    // `close` takes out exactly once.
    page: Option<Page>,
    handler: JoinHandle<()>,
}

impl ChromeSession {
    fn page(&self) -> Result<&Page> {
        self.page
            .as_ref()
            .ok_or_else(|| EntidadesError::browser("session already closed"))
    }
}

#[async_trait]
impl Session for ChromeSession {
    async fn navigate(&mut self, url: &str, timeout: Duration) -> Result<()> {
        let page = self.page()?;
        with_timeout(timeout, "navigation", page.goto(url)).await?;
        Ok(())
    }

    async fn await_network_idle(&mut self, timeout: Duration) -> Result<()> {
        let page = self.page()?;
        with_timeout(timeout, "document load", page.wait_for_navigation()).await?;
        Ok(())
    }

    async fn await_selector(
        &mut self,
        selector: &str,
        timeout: Duration,
    ) -> Result<SelectorOutcome> {
        let page = self.page()?;
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if page.find_element(selector).await.is_ok() {
                return Ok(SelectorOutcome::Found);
            }
            if tokio::time::Instant::now() >= deadline {
                return Ok(SelectorOutcome::TimedOut);
            }
            tokio::time::sleep(SELECTOR_POLL_INTERVAL).await;
        }
    }

    async fn click(&mut self, selector: &str) -> Result<()> {
        let page = self.page()?;
        let element = with_timeout(CLICK_TIMEOUT, "click target", page.find_element(selector))
            .await?;
        with_timeout(CLICK_TIMEOUT, "click", element.click()).await?;
        Ok(())
    }

    async fn document(&mut self) -> Result<String> {
        self.page()?
            .content()
            .await
            .map_err(EntidadesError::browser)
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(page) = self.page.take() {
            if let Err(err) = page.close().await {
                debug!(error = %err, "page close failed");
            }
        }
        self.browser
            .close()
            .await
            .map_err(EntidadesError::browser)?;
        let _ = self.browser.wait().await;
        self.handler.abort();
        Ok(())
    }
}

impl Drop for ChromeSession {
    fn drop(&mut self) {
        // Stops the CDP event loop even if close was never reached.
        self.handler.abort();
    }
}
