// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::match_wildcard_for_single_variants)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # Retail Lister
//!
//! Rate limited, concurrent enumeration of paginated collections from a
//! retail back-office bulk API.
//!
//! ## Features
//!
//! - **Concurrent Fetching**: A bounded pool of fetchers claims pages from a shared counter
//! - **Rate Limiting**: One sliding one-second window shared by every fetcher
//! - **Streaming**: Records arrive on a bounded stream as soon as their page is fetched
//! - **Cancellation**: Token or deadline driven, no leaked tasks
//! - **Typed Resources**: Products, product groups, priority groups, categories, warehouses
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use retail_lister::{ApiClient, ApiClientConfig, ApiSource, Lister, ListingSettings, Session};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> retail_lister::Result<()> {
//!     let client = ApiClient::new(ApiClientConfig::default(), Session::new("123456", "key"))?;
//!     let lister = Lister::new(ListingSettings::default(), ApiSource::products(client))?;
//!
//!     let mut stream = lister.get(&CancellationToken::new(), Default::default());
//!     while let Some(envelope) = stream.recv().await {
//!         match envelope {
//!             Ok(product) => println!("{}", product.name),
//!             Err(e) => eprintln!("{e}"),
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                           Lister                                │
//! │  get(cancel, filters) → ListingStream<Result<T>>                │
//! └─────────────────────────────────────────────────────────────────┘
//!                                │
//! ┌──────────────┬───────────────┴───────┬─────────────────────────┐
//! │  RateGate    │   FetchWorker pool    │   PageSource            │
//! ├──────────────┼───────────────────────┼─────────────────────────┤
//! │ Sliding 1s   │ Shared page counter   │ ApiSource<T>            │
//! │ window       │ Discovery via page 1  │   └─ ApiClient (HTTP)   │
//! │ Cancellable  │ Per-page errors       │      └─ Session (auth)  │
//! └──────────────┴───────────────────────┴─────────────────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// Request rate limiting
pub mod rate_gate;

/// Page source contract and API sources
pub mod pagination;

/// Listing engine
pub mod engine;

/// HTTP transport
pub mod http;

/// Session acquisition
pub mod auth;

/// Record types
pub mod models;

/// Configuration loading
pub mod config;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

// Re-export commonly used types
pub use auth::{verify_user, Credentials, Session};
pub use config::ListerConfig;
pub use engine::{Lister, ListingPhase, ListingSettings, ListingStats, ListingStream, ResultEnvelope};
pub use http::{ApiClient, ApiClientConfig};
pub use pagination::{ApiSource, Page, PageRequest, PageSource};
pub use rate_gate::RateGate;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
