//! Consumer side of a listing

use super::types::{ListingPhase, ListingStats, Progress, ResultEnvelope};
use crate::error::{Error, Result};
use futures::Stream;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tokio_util::sync::{CancellationToken, DropGuard};

/// Receive-only stream of result envelopes produced by one listing.
///
/// Records arrive as soon as their page is fetched; pages complete in any
/// order, records of one page keep their remote order. The stream ends once
/// every fetcher has exited. Dropping it cancels the listing.
pub struct ListingStream<T> {
    rx: mpsc::Receiver<ResultEnvelope<T>>,
    progress: Arc<Progress>,
    cancel: CancellationToken,
    _guard: DropGuard,
}

impl<T> ListingStream<T> {
    pub(crate) fn new(
        rx: mpsc::Receiver<ResultEnvelope<T>>,
        progress: Arc<Progress>,
        cancel: CancellationToken,
    ) -> Self {
        let guard = cancel.clone().drop_guard();
        Self {
            rx,
            progress,
            cancel,
            _guard: guard,
        }
    }

    /// Receive the next envelope, `None` once the stream is closed
    pub async fn recv(&mut self) -> Option<ResultEnvelope<T>> {
        self.rx.recv().await
    }

    /// Current lifecycle phase of the listing
    pub fn phase(&self) -> ListingPhase {
        self.progress.phase()
    }

    /// Statistics so far
    pub fn stats(&self) -> ListingStats {
        self.progress.snapshot()
    }

    /// Stop the listing; the stream closes once the fetchers have exited
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Token governing this listing
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Collect every record, stopping at the first error.
    ///
    /// On error the listing is cancelled before returning.
    pub async fn collect_items(mut self) -> Result<Vec<T>> {
        let mut items = Vec::new();
        while let Some(envelope) = self.recv().await {
            match envelope {
                Ok(item) => items.push(item),
                Err(e) => {
                    self.cancel();
                    return Err(e);
                }
            }
        }
        Ok(items)
    }

    /// Drain the stream, keeping records and errors apart
    pub async fn collect_all(mut self) -> (Vec<T>, Vec<Error>) {
        let mut items = Vec::new();
        let mut errors = Vec::new();
        while let Some(envelope) = self.recv().await {
            match envelope {
                Ok(item) => items.push(item),
                Err(e) => errors.push(e),
            }
        }
        (items, errors)
    }
}

impl<T> Unpin for ListingStream<T> {}

impl<T> Stream for ListingStream<T> {
    type Item = ResultEnvelope<T>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().rx.poll_recv(cx)
    }
}

impl<T> std::fmt::Debug for ListingStream<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListingStream")
            .field("phase", &self.phase())
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}
