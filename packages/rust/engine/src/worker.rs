//! Batch worker: one browsing session driven over one page range.

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use entidades_shared::config::RunConfig;
use entidades_shared::error::{EntidadesError, Result};
use entidades_shared::session::{SelectorOutcome, Session};
use entidades_shared::types::{DetailInfo, OutputRecord, WorkRange};

use crate::extract::{
    self, DETAIL_READY_SELECTOR, LISTING_READY_SELECTOR, OVERLAY_SELECTOR,
};
use crate::retry;

/// Result of the best-effort overlay dismissal.
///
/// Callers always ignore it; the enum exists so the benign-failure contract
/// is visible in the signature instead of buried in a swallowed error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayOutcome {
    Dismissed,
    Absent,
}

/// One worker's pass over its assigned page range.
///
/// The worker owns its session exclusively and closes it exactly once, on
/// exit from [`BatchWorker::run`]. Failures are contained at page and entity
/// granularity: a bad listing page is skipped, an unreachable entity gets the
/// error sentinel pair, and whatever was accumulated before a fault is
/// always returned.
pub struct BatchWorker<S: Session> {
    session: S,
    config: Arc<RunConfig>,
    range: WorkRange,
}

impl<S: Session> BatchWorker<S> {
    pub fn new(session: S, config: Arc<RunConfig>, range: WorkRange) -> Self {
        Self {
            session,
            config,
            range,
        }
    }

    /// Process the whole range, tear the session down, return the batch.
    #[instrument(skip_all, fields(worker = self.range.worker_id))]
    pub async fn run(mut self) -> Vec<OutputRecord> {
        let mut records = Vec::new();

        for page in self.range.pages() {
            if let Err(err) = self.process_page(page, &mut records).await {
                warn!(page, error = %err, "listing page skipped");
            }
        }

        if let Err(err) = self.session.close().await {
            warn!(error = %err, "session close failed");
        }

        info!(records = records.len(), "batch complete");
        records
    }

    /// Fetch one listing page and visit each of its entities.
    async fn process_page(&mut self, page: u32, records: &mut Vec<OutputRecord>) -> Result<()> {
        let url = self.config.listing_url(page);
        debug!(page, %url, "fetching listing page");

        self.session
            .navigate(&url, self.config.navigation_timeout)
            .await?;
        self.session
            .await_network_idle(self.config.ready_timeout)
            .await?;
        let _ = dismiss_overlay(&mut self.session, &self.config).await;

        match self
            .session
            .await_selector(LISTING_READY_SELECTOR, self.config.ready_timeout)
            .await?
        {
            SelectorOutcome::Found => {}
            SelectorOutcome::TimedOut => {
                return Err(EntidadesError::timeout(format!("listing rows on page {page}")));
            }
        }

        let html = self.session.document().await?;
        let stubs = extract::listing_entries(&html, &self.config.base_url);
        info!(page, entities = stubs.len(), "listing extracted");

        let max_attempts = self.config.max_attempts;
        let retry_delay = self.config.retry_delay;

        for stub in stubs {
            let mut attempt = DetailAttempt {
                session: &mut self.session,
                config: Arc::clone(&self.config),
                url: stub.url.clone(),
            };
            let detail = match retry::attempt(
                async move || attempt.run().await,
                max_attempts,
                retry_delay,
            )
            .await
            {
                Ok(detail) => detail,
                Err(err) => {
                    warn!(url = %stub.url, error = %err, "detail retries exhausted");
                    DetailInfo::fetch_failed()
                }
            };

            records.push(OutputRecord {
                entity: stub,
                detail,
            });

            tokio::time::sleep(self.config.throttle_delay).await;
        }

        Ok(())
    }

}

/// Owns the borrows a single detail-page retry needs, as one value the retry
/// closure can capture by move (a by-value capture keeps the closure's future
/// provably `Send` across the worker spawn; a captured `&mut` borrow does not).
struct DetailAttempt<'s, S> {
    session: &'s mut S,
    config: Arc<RunConfig>,
    url: String,
}

impl<S: Session> DetailAttempt<'_, S> {
    async fn run(&mut self) -> Result<DetailInfo> {
        visit_detail(self.session, &self.config, &self.url).await
    }
}

/// One self-contained detail-page attempt: navigate, settle, extract.
///
/// Every invocation starts from scratch so the retry loop stays
/// idempotent; nothing is resumed from a prior attempt.
async fn visit_detail<S: Session>(
    session: &mut S,
    config: &RunConfig,
    url: &str,
) -> Result<DetailInfo> {
    session.navigate(url, config.navigation_timeout).await?;
    session.await_network_idle(config.ready_timeout).await?;
    let _ = dismiss_overlay(session, config).await;

    match session
        .await_selector(DETAIL_READY_SELECTOR, config.ready_timeout)
        .await?
    {
        SelectorOutcome::Found => {}
        SelectorOutcome::TimedOut => {
            return Err(EntidadesError::timeout("detail info fragments"));
        }
    }

    let html = session.document().await?;
    Ok(extract::detail_info(&html))
}

/// Close the onboarding overlay if it is present.
///
/// Absence is the expected common case; every outcome is benign.
async fn dismiss_overlay<S: Session>(session: &mut S, config: &RunConfig) -> OverlayOutcome {
    match session
        .await_selector(OVERLAY_SELECTOR, config.overlay_timeout)
        .await
    {
        Ok(SelectorOutcome::Found) => match session.click(OVERLAY_SELECTOR).await {
            Ok(()) => OverlayOutcome::Dismissed,
            Err(_) => OverlayOutcome::Absent,
        },
        _ => OverlayOutcome::Absent,
    }
}
