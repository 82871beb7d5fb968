//! Lister configuration
//!
//! Account, transport and listing settings loaded from a YAML or JSON file.
//!
//! ```yaml
//! client_code: "123456"
//! username: demo
//! password: secret
//! request_timeout_secs: 30
//! timeout_secs: 600
//! listing:
//!   max_requests_per_second: 5
//!   max_fetchers_count: 10
//! ```

use crate::auth::{Credentials, Session};
use crate::engine::ListingSettings;
use crate::error::{Error, Result};
use crate::http::ApiClientConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Complete lister configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListerConfig {
    /// Account code; selects the per-account endpoint
    pub client_code: String,

    /// Existing session key, used instead of logging in
    #[serde(default)]
    pub session_key: Option<String>,

    /// Username for `verifyUser`
    #[serde(default)]
    pub username: Option<String>,

    /// Password for `verifyUser`
    #[serde(default)]
    pub password: Option<String>,

    /// Endpoint override
    #[serde(default)]
    pub base_url: Option<String>,

    /// Timeout of a single HTTP request, in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Extra headers sent with every request
    #[serde(default)]
    pub headers: HashMap<String, String>,

    /// Listing settings
    #[serde(default)]
    pub listing: ListingSettings,

    /// Deadline of a whole listing, in seconds
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

fn default_request_timeout() -> u64 {
    30
}

/// File formats accepted by [`ListerConfig::load`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// `.yaml` / `.yml`
    Yaml,
    /// `.json`
    Json,
}

impl ConfigFormat {
    /// Detect the format from a file extension
    pub fn from_path(path: &Path) -> Result<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
                Ok(Self::Yaml)
            }
            Some(ext) if ext.eq_ignore_ascii_case("json") => Ok(Self::Json),
            _ => Err(Error::config(format!(
                "Unsupported config file '{}': expected .yaml, .yml or .json",
                path.display()
            ))),
        }
    }
}

impl ListerConfig {
    /// Create a config for an account with default settings
    pub fn new(client_code: impl Into<String>) -> Self {
        Self {
            client_code: client_code.into(),
            session_key: None,
            username: None,
            password: None,
            base_url: None,
            request_timeout_secs: default_request_timeout(),
            headers: HashMap::new(),
            listing: ListingSettings::default(),
            timeout_secs: None,
        }
    }

    /// Load and validate a config file, picking the parser by extension
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let format = ConfigFormat::from_path(path)?;

        let content = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::FileNotFound {
                    path: path.display().to_string(),
                }
            } else {
                Error::config(format!(
                    "Failed to read config file '{}': {}",
                    path.display(),
                    e
                ))
            }
        })?;

        match format {
            ConfigFormat::Yaml => Self::from_yaml_str(&content),
            ConfigFormat::Json => Self::from_json_str(&content),
        }
    }

    /// Parse and validate a YAML config
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a JSON config
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the account fields and the listing settings
    pub fn validate(&self) -> Result<()> {
        if self.client_code.trim().is_empty() {
            return Err(Error::missing_field("client_code"));
        }
        if self.session_key.is_none() {
            if self.username.is_none() {
                return Err(Error::missing_field("username"));
            }
            if self.password.is_none() {
                return Err(Error::missing_field("password"));
            }
        }
        if let Some(url) = &self.base_url {
            Url::parse(url)?;
        }
        if self.request_timeout_secs == 0 {
            return Err(Error::invalid_setting(
                "request_timeout_secs",
                "must be greater than 0",
            ));
        }
        self.listing.validate()
    }

    /// Transport configuration
    pub fn api_client_config(&self) -> ApiClientConfig {
        let mut builder = ApiClientConfig::builder()
            .timeout(Duration::from_secs(self.request_timeout_secs));
        if let Some(url) = &self.base_url {
            builder = builder.base_url(url.clone());
        }
        for (key, value) in &self.headers {
            builder = builder.header(key.clone(), value.clone());
        }
        builder.build()
    }

    /// Stored session, when a session key is configured
    pub fn session(&self) -> Option<Session> {
        self.session_key
            .as_ref()
            .map(|key| Session::new(self.client_code.clone(), key.clone()))
    }

    /// Login credentials, when both username and password are configured
    pub fn credentials(&self) -> Option<Credentials> {
        match (&self.username, &self.password) {
            (Some(username), Some(password)) => Some(Credentials::new(
                username.clone(),
                password.clone(),
                self.client_code.clone(),
            )),
            _ => None,
        }
    }

    /// Deadline of a whole listing
    pub fn listing_timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}
