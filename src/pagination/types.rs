//! Pagination types and traits
//!
//! Defines the page source contract shared by every listed resource.

use crate::error::Result;
use crate::types::{filters_to_params, Filters, StringMap};
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// One page to fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// 1-based page number
    pub number: u32,
    /// Requested number of records per page
    pub size: u32,
}

impl PageRequest {
    /// Create a page request
    pub fn new(number: u32, size: u32) -> Self {
        Self { number, size }
    }
}

/// Response of a page source to one page request
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    /// Records in remote order
    pub items: Vec<T>,
    /// Whether pages after this one may hold data
    pub has_more: bool,
    /// Total number of matching records, when the remote side reports it
    pub total_count: Option<u64>,
}

impl<T> Page<T> {
    /// Build a page, deriving `has_more` from the request.
    ///
    /// With a total count the page is followed by more data while
    /// `number * size < total`. Without one, a page shorter than requested
    /// ends the data. An empty page always ends the data.
    pub fn from_records(items: Vec<T>, request: PageRequest, total_count: Option<u64>) -> Self {
        let has_more = !items.is_empty()
            && match total_count {
                Some(total) => u64::from(request.number) * u64::from(request.size) < total,
                None => items.len() >= request.size as usize,
            };

        Self {
            items,
            has_more,
            total_count,
        }
    }

    /// Create the last page of a listing
    pub fn last(items: Vec<T>) -> Self {
        Self {
            items,
            has_more: false,
            total_count: None,
        }
    }

    /// Number of the last page implied by the total count
    pub fn last_page_number(&self, page_size: u32) -> Option<u32> {
        let total = self.total_count?;
        if page_size == 0 {
            return None;
        }
        let pages = total.div_ceil(u64::from(page_size)).max(1);
        Some(u32::try_from(pages).unwrap_or(u32::MAX))
    }

    /// Number of records in the page
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if the page holds no records
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Names of the pagination fields a resource uses
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageParams {
    /// Field carrying the page number
    pub page_param: String,
    /// Field carrying the page size
    pub page_size_param: String,
}

impl Default for PageParams {
    fn default() -> Self {
        Self::new("pageNo", "recordsOnPage")
    }
}

impl PageParams {
    /// Create pagination field names
    pub fn new(page_param: impl Into<String>, page_size_param: impl Into<String>) -> Self {
        Self {
            page_param: page_param.into(),
            page_size_param: page_size_param.into(),
        }
    }

    /// Build request parameters from the caller's filters.
    ///
    /// The filters are copied; pagination fields already present in them are
    /// overwritten by the requested page.
    pub fn apply(&self, filters: &Filters, request: PageRequest) -> StringMap {
        let mut params = filters_to_params(filters);
        params.insert(self.page_param.clone(), request.number.to_string());
        params.insert(self.page_size_param.clone(), request.size.to_string());
        params
    }
}

/// Resource specific pagination glue used by the lister
#[async_trait]
pub trait PageSource: Send + Sync + 'static {
    /// Record type of the listed resource
    type Item: Send + 'static;

    /// Fetch one page.
    ///
    /// Must not modify `filters`. `cancel` is the listing's token; a source
    /// that observes it should return [`crate::Error::Cancelled`].
    async fn fetch(
        &self,
        cancel: &CancellationToken,
        filters: &Filters,
        request: PageRequest,
    ) -> Result<Page<Self::Item>>;
}
