//! Error types for the retail lister
//!
//! This module defines the error hierarchy for the whole crate.
//! All public APIs return `Result<T, Error>` where Error is defined here.
//!
//! Errors fall into three families:
//! - configuration errors, raised synchronously before any request is made
//! - fetch errors, carried on the listing stream as error envelopes
//! - cancellation, which ends workers silently and never reaches the stream

use thiserror::Error;

/// The main error type for the retail lister
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Missing required config field: {field}")]
    MissingConfigField { field: String },

    #[error("Invalid listing setting '{field}': {message}")]
    InvalidSetting { field: String, message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // Authentication Errors
    // ============================================================================
    #[error("Authentication failed: {message}")]
    Auth { message: String },

    // ============================================================================
    // Transport / Remote Errors
    // ============================================================================
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("API error {code}{}", describe_field(.field))]
    Api { code: i64, field: Option<String> },

    #[error("Failed to decode response: {message}")]
    Decode { message: String },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ============================================================================
    // Listing Errors
    // ============================================================================
    #[error("Failed to fetch page {page}: {source}")]
    PageFetch {
        page: u32,
        #[source]
        source: Box<Error>,
    },

    #[error("Operation cancelled")]
    Cancelled,

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a missing field error
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingConfigField {
            field: field.into(),
        }
    }

    /// Create an invalid setting error
    pub fn invalid_setting(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidSetting {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create an auth error
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth {
            message: message.into(),
        }
    }

    /// Create an HTTP status error
    pub fn http_status(status: u16, body: impl Into<String>) -> Self {
        Self::HttpStatus {
            status,
            body: body.into(),
        }
    }

    /// Create a remote API error
    pub fn api(code: i64, field: Option<String>) -> Self {
        Self::Api { code, field }
    }

    /// Create a decode error
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Wrap an error as the failure of one page
    pub fn page_fetch(page: u32, source: Error) -> Self {
        Self::PageFetch {
            page,
            source: Box::new(source),
        }
    }

    /// Page number this error is attributed to, if any
    pub fn page(&self) -> Option<u32> {
        match self {
            Error::PageFetch { page, .. } => Some(*page),
            _ => None,
        }
    }

    /// Check if this error is a cancellation rather than a fault
    pub fn is_cancelled(&self) -> bool {
        match self {
            Error::Cancelled => true,
            Error::PageFetch { source, .. } => source.is_cancelled(),
            _ => false,
        }
    }

    /// Check if this error is a configuration error
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            Error::Config { .. } | Error::MissingConfigField { .. } | Error::InvalidSetting { .. }
        )
    }
}

fn describe_field(field: &Option<String>) -> String {
    field
        .as_deref()
        .map(|f| format!(" (field '{f}')"))
        .unwrap_or_default()
}

/// Result type alias for the retail lister
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", message.into(), inner))
        })
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", f(), inner))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::config("test message");
        assert_eq!(err.to_string(), "Configuration error: test message");

        let err = Error::missing_field("client_code");
        assert_eq!(err.to_string(), "Missing required config field: client_code");

        let err = Error::http_status(404, "Not found");
        assert_eq!(err.to_string(), "HTTP 404: Not found");

        let err = Error::api(1002, None);
        assert_eq!(err.to_string(), "API error 1002");

        let err = Error::api(1011, Some("productID".to_string()));
        assert_eq!(err.to_string(), "API error 1011 (field 'productID')");
    }

    #[test]
    fn test_page_fetch_attribution() {
        let err = Error::page_fetch(2, Error::http_status(500, "boom"));
        assert_eq!(err.page(), Some(2));
        assert_eq!(err.to_string(), "Failed to fetch page 2: HTTP 500: boom");
        assert!(!err.is_cancelled());

        assert_eq!(Error::Cancelled.page(), None);
    }

    #[test]
    fn test_is_cancelled() {
        assert!(Error::Cancelled.is_cancelled());
        assert!(Error::page_fetch(3, Error::Cancelled).is_cancelled());
        assert!(!Error::config("x").is_cancelled());
    }

    #[test]
    fn test_is_config() {
        assert!(Error::config("x").is_config());
        assert!(Error::invalid_setting("max_fetchers_count", "must be > 0").is_config());
        assert!(Error::missing_field("client_code").is_config());
        assert!(!Error::Cancelled.is_config());
    }

    #[test]
    fn test_result_context() {
        let result: Result<()> = Err(Error::config("inner"));
        let with_context = result.context("outer");
        assert!(with_context
            .unwrap_err()
            .to_string()
            .contains("outer: Configuration error: inner"));
    }

    #[test]
    fn test_reported_through_anyhow_with_causes() {
        let result: Result<()> = Err(Error::page_fetch(2, Error::http_status(500, "boom")));
        let report = anyhow::Context::context(result, "retail-lister list failed").unwrap_err();

        let chain: Vec<String> = report.chain().map(ToString::to_string).collect();
        assert_eq!(
            chain,
            vec![
                "retail-lister list failed".to_string(),
                "Failed to fetch page 2: HTTP 500: boom".to_string(),
                "HTTP 500: boom".to_string(),
            ]
        );
    }
}
