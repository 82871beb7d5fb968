//! HTTP transport module
//!
//! Provides the client used by page sources and session acquisition to call
//! the remote retail API.
//!
//! # Features
//!
//! - **Form-encoded calls**: every request is a POST naming the remote call
//!   in the `request` parameter
//! - **Session injection**: client code and session key are added to each call
//! - **Status decoding**: the response envelope's status block is checked and
//!   turned into typed errors
//!
//! Requests are never retried here; a failed call surfaces as an error.

mod client;
mod types;

pub(crate) use client::post_form;
pub use client::{ApiClient, ApiClientConfig, ApiClientConfigBuilder};
pub use types::{ApiResponse, ApiStatus};
