//! CLI runner - executes commands

use crate::auth::{verify_user, Session};
use crate::cli::commands::{Cli, Commands, OutputFormat, Resource};
use crate::config::ListerConfig;
use crate::engine::{Lister, ListingSettings, ListingStream};
use crate::error::{Error, Result, ResultExt};
use crate::http::ApiClient;
use crate::models::{Product, ProductCategory, ProductGroup, ProductPriorityGroup, Warehouse};
use crate::pagination::ApiSource;
use crate::types::{Filters, JsonValue};
use futures::StreamExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use std::io::Write;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Options of one `list` invocation
#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    /// Filters passed to the API
    pub filters: Filters,
    /// Unix timestamp sent as `changedSince`
    pub changed_since: Option<i64>,
    /// Request ceiling override
    pub max_rps: Option<u32>,
    /// Page size override
    pub page_size: Option<u32>,
    /// Pool size override
    pub fetchers: Option<u32>,
    /// Stream capacity override
    pub buffer: Option<usize>,
    /// Stop on the first page error
    pub fail_fast: bool,
    /// Deadline override, in seconds
    pub timeout: Option<u64>,
    /// Stop after this many records
    pub max_records: Option<usize>,
}

impl ListOptions {
    /// Apply the overrides to the configured settings
    pub fn settings(&self, base: &ListingSettings) -> ListingSettings {
        let mut settings = base.clone();
        if let Some(rps) = self.max_rps {
            settings.max_requests_per_second = rps;
        }
        if let Some(size) = self.page_size {
            settings.max_items_per_request = size;
        }
        if let Some(fetchers) = self.fetchers {
            settings.max_fetchers_count = fetchers;
        }
        if let Some(buffer) = self.buffer {
            settings.stream_buffer_length = buffer;
        }
        if self.fail_fast {
            settings.fail_fast = true;
        }
        settings
    }

    /// Filters including `changedSince`
    pub fn request_filters(&self) -> Filters {
        let mut filters = self.filters.clone();
        if let Some(since) = self.changed_since {
            filters.insert("changedSince".to_string(), JsonValue::from(since));
        }
        filters
    }
}

/// Outcome of writing a listing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListSummary {
    /// Records written
    pub records: usize,
    /// Page errors seen
    pub errors: usize,
}

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Login { username, password } => {
                self.login(username.as_deref(), password.as_deref()).await
            }
            Commands::List {
                resource,
                filters,
                changed_since,
                max_rps,
                page_size,
                fetchers,
                buffer,
                fail_fast,
                timeout,
                max_records,
            } => {
                let options = ListOptions {
                    filters: filters.iter().cloned().collect(),
                    changed_since: *changed_since,
                    max_rps: *max_rps,
                    page_size: *page_size,
                    fetchers: *fetchers,
                    buffer: *buffer,
                    fail_fast: *fail_fast,
                    timeout: *timeout,
                    max_records: *max_records,
                };
                let summary = self.list(*resource, &options).await?;
                if summary.errors > 0 {
                    return Err(Error::Other(format!(
                        "{} page(s) failed, {} record(s) listed",
                        summary.errors, summary.records
                    )));
                }
                Ok(())
            }
        }
    }

    /// Load the config file and apply command line overrides
    fn load_config(&self) -> Result<ListerConfig> {
        let mut config = match &self.cli.config {
            Some(path) => ListerConfig::load(path).context("Failed to load config")?,
            None => {
                let code = self.cli.client_code.clone().ok_or_else(|| {
                    Error::config("No config file given (use -C) and no --client-code")
                })?;
                ListerConfig::new(code)
            }
        };

        if let Some(code) = &self.cli.client_code {
            config.client_code.clone_from(code);
        }
        if let Some(key) = &self.cli.session_key {
            config.session_key = Some(key.clone());
        }
        if let Some(url) = &self.cli.base_url {
            config.base_url = Some(url.clone());
        }
        Ok(config)
    }

    /// Use the configured session key or log in with the configured credentials
    async fn session(&self, config: &ListerConfig) -> Result<Session> {
        if let Some(session) = config.session() {
            return Ok(session);
        }
        let credentials = config
            .credentials()
            .ok_or_else(|| Error::missing_field("session_key"))?;
        verify_user(&config.api_client_config(), &credentials)
            .await
            .with_context(|| format!("Failed to open a session for account {}", config.client_code))
    }

    /// Log in and print the session
    async fn login(&self, username: Option<&str>, password: Option<&str>) -> Result<()> {
        let mut config = self.load_config()?;
        if let Some(username) = username {
            config.username = Some(username.to_string());
        }
        if let Some(password) = password {
            config.password = Some(password.to_string());
        }

        let credentials = config
            .credentials()
            .ok_or_else(|| Error::missing_field("username"))?;
        let session = verify_user(&config.api_client_config(), &credentials).await?;

        self.output_message(
            &mut std::io::stdout(),
            &json!({
                "clientCode": session.client_code,
                "sessionKey": session.session_key,
                "sessionLength": session.session_length,
            }),
        )
    }

    /// List one resource to stdout
    async fn list(&self, resource: Resource, options: &ListOptions) -> Result<ListSummary> {
        let config = self.load_config()?;
        let settings = options.settings(&config.listing);
        let timeout = options
            .timeout
            .map(Duration::from_secs)
            .or_else(|| config.listing_timeout());

        let session = self.session(&config).await?;
        let client = ApiClient::new(config.api_client_config(), session)?;
        let mut out = std::io::stdout();

        match resource {
            Resource::Products => {
                let source: ApiSource<Product> = ApiSource::products(client);
                self.run_listing(source, settings, options, timeout, &mut out)
                    .await
            }
            Resource::PriorityGroups => {
                let source: ApiSource<ProductPriorityGroup> = ApiSource::priority_groups(client);
                self.run_listing(source, settings, options, timeout, &mut out)
                    .await
            }
            Resource::ProductGroups => {
                let source: ApiSource<ProductGroup> = ApiSource::product_groups(client);
                self.run_listing(source, settings, options, timeout, &mut out)
                    .await
            }
            Resource::Categories => {
                let source: ApiSource<ProductCategory> = ApiSource::categories(client);
                self.run_listing(source, settings, options, timeout, &mut out)
                    .await
            }
            Resource::Warehouses => {
                let source: ApiSource<Warehouse> = ApiSource::warehouses(client);
                self.run_listing(source, settings, options, timeout, &mut out)
                    .await
            }
        }
    }

    /// Run a listing and write its records to `out`
    pub async fn run_listing<T, W>(
        &self,
        source: ApiSource<T>,
        settings: ListingSettings,
        options: &ListOptions,
        timeout: Option<Duration>,
        out: &mut W,
    ) -> Result<ListSummary>
    where
        T: DeserializeOwned + Serialize + Send + 'static,
        W: Write,
    {
        let request = source.request().to_string();
        let lister = Lister::new(settings, source)?;
        let filters = options.request_filters();

        let stream = match timeout {
            Some(timeout) => lister.get_with_timeout(timeout, filters),
            None => lister.get(&CancellationToken::new(), filters),
        };

        // Ctrl-C stops the listing; records already received are still written
        let interrupt = stream.cancellation_token().clone();
        tokio::spawn(async move {
            tokio::select! {
                result = tokio::signal::ctrl_c() => {
                    if result.is_ok() {
                        warn!("Interrupted, stopping listing");
                        interrupt.cancel();
                    }
                }
                () = interrupt.cancelled() => {}
            }
        });

        let start = Instant::now();
        let summary = self.write_records(stream, options.max_records, out).await?;
        info!(
            request = %request,
            records = summary.records,
            errors = summary.errors,
            duration_ms = start.elapsed().as_millis() as u64,
            "Listing finished"
        );
        Ok(summary)
    }

    /// Drain a listing stream into `out`
    async fn write_records<T, W>(
        &self,
        mut stream: ListingStream<T>,
        max_records: Option<usize>,
        out: &mut W,
    ) -> Result<ListSummary>
    where
        T: Serialize,
        W: Write,
    {
        let mut summary = ListSummary::default();

        loop {
            if max_records.is_some_and(|max| summary.records >= max) {
                stream.cancel();
                break;
            }
            let Some(envelope) = stream.next().await else {
                break;
            };
            match envelope {
                Ok(record) => {
                    self.output_message(out, &record)?;
                    summary.records += 1;
                }
                Err(e) => {
                    error!(page = e.page(), error = %e, "Page failed");
                    summary.errors += 1;
                }
            }
        }

        out.flush()?;
        Ok(summary)
    }

    /// Output a message
    fn output_message<W: Write, T: Serialize + ?Sized>(&self, out: &mut W, msg: &T) -> Result<()> {
        match self.cli.format {
            OutputFormat::Json => writeln!(out, "{}", serde_json::to_string(msg)?)?,
            OutputFormat::Pretty => writeln!(out, "{}", serde_json::to_string_pretty(msg)?)?,
        }
        Ok(())
    }
}
