//! Listing engine module
//!
//! Enumerates a paginated remote collection with a pool of concurrent
//! fetchers and streams the records back as they arrive.
//!
//! # Overview
//!
//! The engine module provides:
//! - `Lister` - Orchestrates one listing: discovery, fetcher pool, stream
//! - `ListingSettings` - Rate ceiling, stream capacity, page size, pool size
//! - `ListingStream` - The consumer's end, a stream of result envelopes
//!
//! # Flow
//!
//! ```text
//! get(cancel, filters)
//!   │
//!   ├─ page 1 ──► source ──► total count / end of data
//!   │
//!   ├─ spawn min(max_fetchers_count, remaining pages) workers
//!   │     loop: claim page ─► rate gate ─► source ─► stream
//!   │
//!   └─ all workers exited ──► stream closed
//! ```
//!
//! A failed page is reported once on the stream and is not retried; the
//! other workers carry on unless `fail_fast` is set. Cancellation ends the
//! workers silently.

mod stream;
mod types;
mod worker;

pub use stream::ListingStream;
pub use types::{ListingPhase, ListingSettings, ListingStats, ResultEnvelope};

use crate::error::Result;
use crate::pagination::PageSource;
use crate::rate_gate::{RateGate, Sleeper};
use crate::types::Filters;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};
use types::Progress;
use worker::{FetchOutcome, FetchWorker, Shared};

/// Concurrent, rate limited lister over one page source
pub struct Lister<S: PageSource> {
    settings: ListingSettings,
    source: Arc<S>,
    gate: Arc<RateGate>,
}

impl<S: PageSource> Lister<S> {
    /// Create a lister.
    ///
    /// Fails with a configuration error when any setting is not positive.
    pub fn new(settings: ListingSettings, source: S) -> Result<Self> {
        settings.validate()?;
        let gate = RateGate::new(settings.max_requests_per_second)?;
        Ok(Self {
            settings,
            source: Arc::new(source),
            gate: Arc::new(gate),
        })
    }

    /// Create a lister whose rate gate waits through `sleeper`
    pub fn with_sleeper(
        settings: ListingSettings,
        source: S,
        sleeper: Arc<dyn Sleeper>,
    ) -> Result<Self> {
        settings.validate()?;
        let gate = RateGate::with_sleeper(
            settings.max_requests_per_second,
            Duration::from_secs(1),
            sleeper,
        )?;
        Ok(Self {
            settings,
            source: Arc::new(source),
            gate: Arc::new(gate),
        })
    }

    /// Share a rate gate with other listers of the same account.
    ///
    /// The shared gate's own ceiling replaces `max_requests_per_second`.
    #[must_use]
    pub fn with_rate_gate(mut self, gate: Arc<RateGate>) -> Self {
        self.gate = gate;
        self
    }

    /// Listing settings
    pub fn settings(&self) -> &ListingSettings {
        &self.settings
    }

    /// Rate gate used by the fetchers
    pub fn rate_gate(&self) -> &Arc<RateGate> {
        &self.gate
    }

    /// Page source
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Start listing every record matching `filters`.
    ///
    /// Cancelling `cancel` stops the listing; the stream then closes once
    /// in-flight work has been abandoned. Must be called within a tokio runtime.
    pub fn get(&self, cancel: &CancellationToken, filters: Filters) -> ListingStream<S::Item> {
        self.start(cancel.child_token(), filters)
    }

    /// Start a listing that is cancelled after `timeout`
    pub fn get_with_timeout(
        &self,
        timeout: Duration,
        filters: Filters,
    ) -> ListingStream<S::Item> {
        let cancel = CancellationToken::new();
        let deadline = cancel.clone();
        tokio::spawn(async move {
            tokio::select! {
                () = tokio::time::sleep(timeout) => {
                    debug!(timeout_ms = timeout.as_millis() as u64, "Listing timed out");
                    deadline.cancel();
                }
                () = deadline.cancelled() => {}
            }
        });
        self.start(cancel, filters)
    }

    fn start(&self, cancel: CancellationToken, filters: Filters) -> ListingStream<S::Item> {
        let (tx, rx) = mpsc::channel(self.settings.stream_buffer_length);
        let progress = Arc::new(Progress::default());
        let shared = Arc::new(Shared::new(
            self.source.clone(),
            self.gate.clone(),
            filters,
            self.settings.clone(),
            cancel.clone(),
            progress.clone(),
        ));

        tokio::spawn(supervise(shared, tx));
        ListingStream::new(rx, progress, cancel)
    }
}

impl<S: PageSource> std::fmt::Debug for Lister<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lister")
            .field("settings", &self.settings)
            .field("gate", &self.gate)
            .finish_non_exhaustive()
    }
}

/// Drive one listing from discovery to close
async fn supervise<S: PageSource>(
    shared: Arc<Shared<S>>,
    tx: mpsc::Sender<ResultEnvelope<S::Item>>,
) {
    let start = Instant::now();
    shared.progress.advance(ListingPhase::Discovering);
    info!(
        page_size = shared.settings.max_items_per_request,
        max_fetchers = shared.settings.max_fetchers_count,
        max_rps = shared.gate.max_requests(),
        "Listing started"
    );

    if let Some(first) = shared.claim_page() {
        match shared.fetch(first).await {
            FetchOutcome::Fetched(page) => {
                let workers = shared.workers_needed(page.has_more);
                debug!(
                    workers,
                    total = page.total_count,
                    has_more = page.has_more,
                    "Discovery page fetched"
                );
                shared.progress.advance(ListingPhase::Streaming);

                let mut pool = JoinSet::new();
                for id in 0..workers {
                    pool.spawn(FetchWorker::new(id, shared.clone(), tx.clone()).run());
                }

                shared.emit_items(&tx, page.items).await;
                if !page.has_more {
                    shared.progress.advance(ListingPhase::Draining);
                }

                while let Some(joined) = pool.join_next().await {
                    shared.progress.advance(ListingPhase::Draining);
                    if let Err(e) = joined {
                        error!(error = %e, "Fetch worker aborted");
                    }
                }
            }
            FetchOutcome::Failed(e) => shared.emit_error(&tx, first, e).await,
            FetchOutcome::PastEnd | FetchOutcome::Cancelled => {}
        }
    }

    let stats = shared.progress.snapshot();
    shared.progress.advance(ListingPhase::Closed);
    // Last sender; dropping it closes the stream
    drop(tx);

    info!(
        pages = stats.pages_requested,
        items = stats.items_emitted,
        errors = stats.errors,
        cancelled = shared.cancel.is_cancelled(),
        duration_ms = start.elapsed().as_millis() as u64,
        "Listing closed"
    );
}

#[cfg(test)]
mod tests;
