//! Page sources backed by the remote API

use super::types::{Page, PageParams, PageRequest, PageSource};
use crate::error::{Error, Result};
use crate::http::ApiClient;
use crate::models::{Product, ProductCategory, ProductGroup, ProductPriorityGroup, Warehouse};
use crate::types::Filters;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::marker::PhantomData;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Page source listing one remote resource.
///
/// The resource is identified by the remote request name; records are
/// decoded into `T`. The total count reported in the response status makes
/// the end of data exact.
pub struct ApiSource<T> {
    client: ApiClient,
    request: String,
    params: PageParams,
    _record: PhantomData<fn() -> T>,
}

impl<T> ApiSource<T> {
    /// Create a source for a remote request
    pub fn new(client: ApiClient, request: impl Into<String>) -> Self {
        Self {
            client,
            request: request.into(),
            params: PageParams::default(),
            _record: PhantomData,
        }
    }

    /// Use different pagination field names
    #[must_use]
    pub fn with_params(mut self, params: PageParams) -> Self {
        self.params = params;
        self
    }

    /// Remote request name
    pub fn request(&self) -> &str {
        &self.request
    }

    /// Pagination field names
    pub fn params(&self) -> &PageParams {
        &self.params
    }
}

impl ApiSource<Product> {
    /// Products (`getProducts`)
    pub fn products(client: ApiClient) -> Self {
        Self::new(client, "getProducts")
    }
}

impl ApiSource<ProductPriorityGroup> {
    /// Product priority groups (`getProductPriorityGroups`)
    pub fn priority_groups(client: ApiClient) -> Self {
        Self::new(client, "getProductPriorityGroups")
    }
}

impl ApiSource<ProductGroup> {
    /// Product groups (`getProductGroups`)
    pub fn product_groups(client: ApiClient) -> Self {
        Self::new(client, "getProductGroups")
    }
}

impl ApiSource<ProductCategory> {
    /// Product categories (`getProductCategories`)
    pub fn categories(client: ApiClient) -> Self {
        Self::new(client, "getProductCategories")
    }
}

impl ApiSource<Warehouse> {
    /// Warehouses (`getWarehouses`)
    pub fn warehouses(client: ApiClient) -> Self {
        Self::new(client, "getWarehouses")
    }
}

#[async_trait]
impl<T> PageSource for ApiSource<T>
where
    T: DeserializeOwned + Send + 'static,
{
    type Item = T;

    async fn fetch(
        &self,
        cancel: &CancellationToken,
        filters: &Filters,
        request: PageRequest,
    ) -> Result<Page<T>> {
        let params = self.params.apply(filters, request);

        let response = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(Error::Cancelled),
            response = self.client.call::<T>(&self.request, &params) => response?,
        };

        let total = response.records_total();
        debug!(
            request = %self.request,
            page = request.number,
            records = response.records.len(),
            total,
            "Fetched page"
        );
        Ok(Page::from_records(response.records, request, total))
    }
}

impl<T> std::fmt::Debug for ApiSource<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiSource")
            .field("request", &self.request)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}
