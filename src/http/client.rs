//! HTTP client for the remote retail API
//!
//! Provides a client that:
//! - Builds the per-account endpoint URL from the client code
//! - Adds session parameters to every call
//! - Decodes the response envelope and its status block

use super::types::ApiResponse;
use crate::auth::Session;
use crate::error::{Error, Result};
use crate::types::{filters_to_params, Filters, StringMap};
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

/// Configuration for the API client
#[derive(Debug, Clone)]
pub struct ApiClientConfig {
    /// Endpoint override (defaults to the per-account endpoint)
    pub base_url: Option<String>,
    /// Request timeout
    pub timeout: Duration,
    /// Default headers for all requests
    pub default_headers: HashMap<String, String>,
    /// User agent string
    pub user_agent: String,
}

impl Default for ApiClientConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout: Duration::from_secs(30),
            default_headers: HashMap::new(),
            user_agent: format!("retail-lister/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ApiClientConfig {
    /// Create a new config builder
    pub fn builder() -> ApiClientConfigBuilder {
        ApiClientConfigBuilder::default()
    }

    /// Endpoint URL for an account
    pub fn endpoint(&self, client_code: &str) -> String {
        match &self.base_url {
            Some(base) => base.clone(),
            None => format!("https://{client_code}.erply.com/api/"),
        }
    }

    /// Build the underlying reqwest client
    pub fn build_http(&self) -> Result<Client> {
        let client = Client::builder()
            .timeout(self.timeout)
            .user_agent(&self.user_agent)
            .build()?;
        Ok(client)
    }
}

/// Builder for API client config
#[derive(Default)]
pub struct ApiClientConfigBuilder {
    config: ApiClientConfig,
}

impl ApiClientConfigBuilder {
    /// Set the endpoint URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = Some(url.into());
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Add a default header
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.default_headers.insert(key.into(), value.into());
        self
    }

    /// Set user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    /// Build the config
    pub fn build(self) -> ApiClientConfig {
        self.config
    }
}

/// Session-bound client for the remote API
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    config: ApiClientConfig,
    session: Session,
}

impl ApiClient {
    /// Create a client for an established session
    pub fn new(config: ApiClientConfig, session: Session) -> Result<Self> {
        if session.client_code.is_empty() {
            return Err(Error::missing_field("client_code"));
        }
        if session.session_key.is_empty() {
            return Err(Error::missing_field("session_key"));
        }

        let client = config.build_http()?;
        Ok(Self {
            client,
            config,
            session,
        })
    }

    /// Session this client is bound to
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Client configuration
    pub fn config(&self) -> &ApiClientConfig {
        &self.config
    }

    /// Endpoint URL for this client's account
    pub fn endpoint(&self) -> String {
        self.config.endpoint(&self.session.client_code)
    }

    /// Call a remote request with string parameters
    pub async fn call<T: DeserializeOwned>(
        &self,
        request: &str,
        params: &StringMap,
    ) -> Result<ApiResponse<T>> {
        let mut form = params.clone();
        form.insert("sessionKey".to_string(), self.session.session_key.clone());
        post_form(
            &self.client,
            &self.config,
            &self.session.client_code,
            request,
            form,
        )
        .await
    }

    /// Call a remote request with caller filters
    pub async fn call_with_filters<T: DeserializeOwned>(
        &self,
        request: &str,
        filters: &Filters,
    ) -> Result<ApiResponse<T>> {
        self.call(request, &filters_to_params(filters)).await
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("config", &self.config)
            .field("client_code", &self.session.client_code)
            .finish_non_exhaustive()
    }
}

/// Post one form-encoded call and decode its envelope.
///
/// `request` and `clientCode` are added to `form`; a non-success HTTP status
/// or a failed status block becomes an error.
pub(crate) async fn post_form<T: DeserializeOwned>(
    client: &Client,
    config: &ApiClientConfig,
    client_code: &str,
    request: &str,
    mut form: StringMap,
) -> Result<ApiResponse<T>> {
    let url = config.endpoint(client_code);
    form.insert("request".to_string(), request.to_string());
    form.insert("clientCode".to_string(), client_code.to_string());

    let mut req = client.post(&url);
    for (key, value) in &config.default_headers {
        req = req.header(key.as_str(), value.as_str());
    }

    let response = req.form(&form).send().await?;
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(Error::http_status(status.as_u16(), body));
    }

    let body = response
        .text()
        .await
        .map_err(|e| Error::decode(format!("Failed to read response body: {e}")))?;
    let decoded: ApiResponse<T> = serde_json::from_str(&body)
        .map_err(|e| Error::decode(format!("Invalid response to '{request}': {e}")))?;
    decoded.status.ensure_ok()?;

    debug!(
        request,
        records = decoded.records.len(),
        total = decoded.status.records_total,
        "API call succeeded"
    );
    Ok(decoded)
}
