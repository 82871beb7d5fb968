//! Fetch workers and the state they share

use super::types::{ListingPhase, ListingSettings, Progress, ResultEnvelope};
use crate::error::Error;
use crate::pagination::{Page, PageRequest, PageSource};
use crate::rate_gate::RateGate;
use crate::types::Filters;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Result of fetching one page
pub(crate) enum FetchOutcome<T> {
    /// The source returned a page
    Fetched(Page<T>),
    /// The source failed
    Failed(Error),
    /// The page lies past the end of the data and was not requested
    PastEnd,
    /// The listing was cancelled before or during the fetch
    Cancelled,
}

/// How far completed pages have shown the data to reach
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Frontier {
    /// Highest page known to be followed by another page
    confirmed: u32,
    /// First page that reported no more data, `u32::MAX` while unknown
    end: u32,
}

impl Default for Frontier {
    fn default() -> Self {
        Self {
            confirmed: 0,
            end: u32::MAX,
        }
    }
}

/// State shared by the supervisor and every fetch worker of one listing
pub(crate) struct Shared<S: PageSource> {
    pub(crate) source: Arc<S>,
    pub(crate) gate: Arc<RateGate>,
    pub(crate) filters: Filters,
    pub(crate) settings: ListingSettings,
    pub(crate) cancel: CancellationToken,
    pub(crate) progress: Arc<Progress>,
    /// Next unclaimed page number
    next_page: AtomicU32,
    /// Last page implied by a reported total count, 0 while unknown
    last_page: AtomicU32,
    /// What completed pages have revealed so far
    frontier: watch::Sender<Frontier>,
    /// Set once no further page may be claimed
    exhausted: AtomicBool,
}

impl<S: PageSource> Shared<S> {
    pub(crate) fn new(
        source: Arc<S>,
        gate: Arc<RateGate>,
        filters: Filters,
        settings: ListingSettings,
        cancel: CancellationToken,
        progress: Arc<Progress>,
    ) -> Self {
        Self {
            source,
            gate,
            filters,
            settings,
            cancel,
            progress,
            next_page: AtomicU32::new(1),
            last_page: AtomicU32::new(0),
            frontier: watch::channel(Frontier::default()).0,
            exhausted: AtomicBool::new(false),
        }
    }

    /// Claim the next page number, if any page is left.
    ///
    /// Every number is handed out at most once.
    pub(crate) fn claim_page(&self) -> Option<u32> {
        if self.exhausted.load(Ordering::Acquire) {
            return None;
        }

        let page = self.next_page.fetch_add(1, Ordering::AcqRel);
        if self.is_past_end(page) {
            self.exhausted.store(true, Ordering::Release);
            return None;
        }
        Some(page)
    }

    /// Whether `page` lies beyond the known end of the data
    fn is_past_end(&self, page: u32) -> bool {
        let last = self.last_page.load(Ordering::Acquire);
        (last != 0 && page > last) || page > self.frontier.borrow().end
    }

    /// Whether `page` can be requested or dropped given `frontier`.
    ///
    /// With a reported total every page up to the last one may go. Without
    /// one, a page waits until its predecessor came back full or the end
    /// showed up before it.
    fn is_settled(&self, frontier: &Frontier, page: u32) -> bool {
        self.last_page.load(Ordering::Acquire) != 0
            || page <= frontier.confirmed.saturating_add(1)
            || page > frontier.end
    }

    /// Wait until `page` may be requested.
    ///
    /// Returns false when the page lies past the end of the data or the
    /// listing was cancelled.
    async fn wait_turn(&self, page: u32) -> bool {
        let mut frontier = self.frontier.subscribe();
        let settled = tokio::select! {
            biased;
            () = self.cancel.cancelled() => false,
            settled = frontier.wait_for(|f| self.is_settled(f, page)) => settled.is_ok(),
        };
        settled && !self.is_past_end(page)
    }

    /// Number of workers worth starting after the first page
    pub(crate) fn workers_needed(&self, has_more: bool) -> u32 {
        if !has_more {
            return 0;
        }
        let max = self.settings.max_fetchers_count;
        match self.last_page.load(Ordering::Acquire) {
            0 => max,
            last => max.min(last.saturating_sub(1)),
        }
    }

    /// Wait for the page's turn and the rate gate, then fetch one page
    pub(crate) async fn fetch(&self, number: u32) -> FetchOutcome<S::Item> {
        if !self.wait_turn(number).await {
            return self.abandon(number);
        }
        if self.gate.acquire(&self.cancel).await.is_err() {
            return FetchOutcome::Cancelled;
        }
        // The end may have been found while this worker waited for quota
        if self.is_past_end(number) {
            return self.abandon(number);
        }

        self.progress.add_page_request();
        let request = PageRequest::new(number, self.settings.max_items_per_request);
        let result = tokio::select! {
            biased;
            () = self.cancel.cancelled() => return FetchOutcome::Cancelled,
            result = self.source.fetch(&self.cancel, &self.filters, request) => result,
        };

        match result {
            Ok(page) => {
                self.record_page(number, &page);
                FetchOutcome::Fetched(page)
            }
            Err(e) if e.is_cancelled() || self.cancel.is_cancelled() => FetchOutcome::Cancelled,
            Err(e) => {
                warn!(page = number, error = %e, "Page fetch failed");
                // A failed page says nothing about the end; let its successor run
                self.confirm(number);
                FetchOutcome::Failed(e)
            }
        }
    }

    fn abandon(&self, number: u32) -> FetchOutcome<S::Item> {
        if self.cancel.is_cancelled() {
            return FetchOutcome::Cancelled;
        }
        debug!(page = number, "Skipping page past the end of data");
        self.exhausted.store(true, Ordering::Release);
        FetchOutcome::PastEnd
    }

    fn confirm(&self, number: u32) {
        self.frontier.send_modify(|f| f.confirmed = f.confirmed.max(number));
    }

    fn record_page(&self, number: u32, page: &Page<S::Item>) {
        if let Some(last) = page.last_page_number(self.settings.max_items_per_request) {
            // The first reported total wins
            let _ = self
                .last_page
                .compare_exchange(0, last, Ordering::AcqRel, Ordering::Acquire);
        }
        if page.has_more {
            self.confirm(number);
        } else {
            debug!(page = number, "End of data reached");
            self.exhausted.store(true, Ordering::Release);
            self.frontier.send_modify(|f| f.end = f.end.min(number));
        }
    }

    /// Push the records of a page onto the stream, in page order.
    ///
    /// Returns false when the listing was cancelled or the consumer is gone.
    pub(crate) async fn emit_items(
        &self,
        tx: &mpsc::Sender<ResultEnvelope<S::Item>>,
        items: Vec<S::Item>,
    ) -> bool {
        for item in items {
            let sent = tokio::select! {
                biased;
                () = self.cancel.cancelled() => false,
                sent = tx.send(Ok(item)) => sent.is_ok(),
            };
            if !sent {
                return false;
            }
            self.progress.add_item();
        }
        true
    }

    /// Push a page error onto the stream
    pub(crate) async fn emit_error(
        &self,
        tx: &mpsc::Sender<ResultEnvelope<S::Item>>,
        page: u32,
        error: Error,
    ) {
        let sent = tokio::select! {
            biased;
            sent = tx.send(Err(Error::page_fetch(page, error))) => sent.is_ok(),
            () = self.cancel.cancelled() => false,
        };
        if sent {
            self.progress.add_error();
        }

        if self.settings.fail_fast {
            debug!(page, "Stopping listing after page error");
            self.exhausted.store(true, Ordering::Release);
            self.progress.advance(ListingPhase::Draining);
            self.cancel.cancel();
        }
    }
}

/// One member of the fetcher pool
pub(crate) struct FetchWorker<S: PageSource> {
    id: u32,
    shared: Arc<Shared<S>>,
    tx: mpsc::Sender<ResultEnvelope<S::Item>>,
}

impl<S: PageSource> FetchWorker<S> {
    pub(crate) fn new(
        id: u32,
        shared: Arc<Shared<S>>,
        tx: mpsc::Sender<ResultEnvelope<S::Item>>,
    ) -> Self {
        Self { id, shared, tx }
    }

    /// Claim and fetch pages until the data, the listing or this worker ends
    pub(crate) async fn run(self) {
        let mut pages = 0u32;

        loop {
            if self.shared.cancel.is_cancelled() {
                break;
            }
            let Some(number) = self.shared.claim_page() else {
                break;
            };

            match self.shared.fetch(number).await {
                FetchOutcome::Fetched(page) => {
                    pages += 1;
                    let has_more = page.has_more;
                    if !self.shared.emit_items(&self.tx, page.items).await || !has_more {
                        break;
                    }
                }
                FetchOutcome::Failed(error) => {
                    self.shared.emit_error(&self.tx, number, error).await;
                    break;
                }
                FetchOutcome::PastEnd | FetchOutcome::Cancelled => break,
            }
        }

        debug!(worker = self.id, pages, "Fetch worker exiting");
    }
}
