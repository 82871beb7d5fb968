//! Auth types

use serde::{Deserialize, Serialize};

/// Account credentials used to open a session
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct Credentials {
    /// User name
    pub username: String,
    /// Password
    pub password: String,
    /// Account (client) code
    pub client_code: String,
}

impl Credentials {
    /// Create credentials
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        client_code: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            client_code: client_code.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .field("client_code", &self.client_code)
            .finish()
    }
}

/// An authenticated API session
#[derive(Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Session {
    /// Account (client) code
    pub client_code: String,
    /// Session key returned by `verifyUser`
    pub session_key: String,
    /// Session lifetime in seconds, when reported
    #[serde(default)]
    pub session_length: Option<u64>,
}

impl Session {
    /// Create a session from a known key
    pub fn new(client_code: impl Into<String>, session_key: impl Into<String>) -> Self {
        Self {
            client_code: client_code.into(),
            session_key: session_key.into(),
            session_length: None,
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("client_code", &self.client_code)
            .field("session_key", &"***")
            .field("session_length", &self.session_length)
            .finish()
    }
}
