//! Engine types
//!
//! Settings, lifecycle phases and statistics of a listing.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};

/// Unit placed on the listing stream: one record or one page error
pub type ResultEnvelope<T> = std::result::Result<T, Error>;

/// Configuration of a listing, fixed when the lister is built
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingSettings {
    /// Request ceiling per rolling second, shared by all fetchers
    pub max_requests_per_second: u32,
    /// Capacity of the output stream
    pub stream_buffer_length: usize,
    /// Page size requested from the remote side
    pub max_items_per_request: u32,
    /// Size of the fetcher pool
    pub max_fetchers_count: u32,
    /// Stop the whole listing on the first page error
    pub fail_fast: bool,
}

impl Default for ListingSettings {
    fn default() -> Self {
        Self {
            max_requests_per_second: 5,
            stream_buffer_length: 10,
            max_items_per_request: 300,
            max_fetchers_count: 10,
            fail_fast: false,
        }
    }
}

impl ListingSettings {
    /// Create settings with the default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the request ceiling per second
    #[must_use]
    pub fn with_max_requests_per_second(mut self, max: u32) -> Self {
        self.max_requests_per_second = max;
        self
    }

    /// Set the output stream capacity
    #[must_use]
    pub fn with_stream_buffer_length(mut self, len: usize) -> Self {
        self.stream_buffer_length = len;
        self
    }

    /// Set the page size
    #[must_use]
    pub fn with_max_items_per_request(mut self, max: u32) -> Self {
        self.max_items_per_request = max;
        self
    }

    /// Set the fetcher pool size
    #[must_use]
    pub fn with_max_fetchers_count(mut self, max: u32) -> Self {
        self.max_fetchers_count = max;
        self
    }

    /// Set fail fast mode
    #[must_use]
    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    /// Check that every setting is positive
    pub fn validate(&self) -> Result<()> {
        if self.max_requests_per_second == 0 {
            return Err(Error::invalid_setting(
                "max_requests_per_second",
                "must be greater than 0",
            ));
        }
        if self.stream_buffer_length == 0 {
            return Err(Error::invalid_setting(
                "stream_buffer_length",
                "must be greater than 0",
            ));
        }
        if self.max_items_per_request == 0 {
            return Err(Error::invalid_setting(
                "max_items_per_request",
                "must be greater than 0",
            ));
        }
        if self.max_fetchers_count == 0 {
            return Err(Error::invalid_setting(
                "max_fetchers_count",
                "must be greater than 0",
            ));
        }
        Ok(())
    }
}

/// Lifecycle of one listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum ListingPhase {
    /// Not started yet
    Idle = 0,
    /// Fetching the first page
    Discovering = 1,
    /// Fetchers are running
    Streaming = 2,
    /// Fetchers are exiting
    Draining = 3,
    /// Stream closed; terminal
    Closed = 4,
}

impl ListingPhase {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Idle,
            1 => Self::Discovering,
            2 => Self::Streaming,
            3 => Self::Draining,
            _ => Self::Closed,
        }
    }

    /// Check if the listing reached its terminal phase
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }
}

/// Statistics of a listing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListingStats {
    /// Page fetches issued to the source
    pub pages_requested: u64,
    /// Records delivered to the stream
    pub items_emitted: u64,
    /// Page errors delivered to the stream
    pub errors: u64,
}

/// Progress shared between the fetchers and the consumer's stream
#[derive(Debug, Default)]
pub(crate) struct Progress {
    phase: AtomicU8,
    pages_requested: AtomicU64,
    items_emitted: AtomicU64,
    errors: AtomicU64,
}

impl Progress {
    /// Move forward to `phase`; phases never go back
    pub(crate) fn advance(&self, phase: ListingPhase) {
        self.phase.fetch_max(phase as u8, Ordering::AcqRel);
    }

    pub(crate) fn phase(&self) -> ListingPhase {
        ListingPhase::from_u8(self.phase.load(Ordering::Acquire))
    }

    pub(crate) fn add_page_request(&self) {
        self.pages_requested.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn add_item(&self) {
        self.items_emitted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn add_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> ListingStats {
        ListingStats {
            pages_requested: self.pages_requested.load(Ordering::Relaxed),
            items_emitted: self.items_emitted.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }
}
