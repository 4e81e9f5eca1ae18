//! Runtime configuration for the MCP server.

use std::fmt;
use std::time::Duration;

use super::DEFAULT_API_URL;
use crate::identity::{Wallet, WalletError};

/// Root configuration structure, built once at startup.
#[derive(Clone)]
pub struct ServerConfig {
    /// Skillz Market API base URL (no trailing slash).
    pub api_url: String,

    /// Hex-encoded private key enabling paid skill calls.
    pub private_key: Option<String>,

    /// Log filter used when `RUST_LOG` is unset.
    pub log_level: String,

    /// HTTP request timeout handed to the marketplace client.
    pub request_timeout: Option<Duration>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.into(),
            private_key: None,
            log_level: "info".into(),
            request_timeout: None,
        }
    }
}

impl ServerConfig {
    /// Normalize raw settings: blank values count as unset.
    pub fn new(api_url: Option<String>, private_key: Option<String>) -> Self {
        let api_url = api_url
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.into());

        let private_key = private_key
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty());

        Self {
            api_url,
            private_key,
            ..Self::default()
        }
    }

    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    pub fn with_request_timeout(mut self, secs: Option<u64>) -> Self {
        self.request_timeout = secs.filter(|s| *s > 0).map(Duration::from_secs);
        self
    }

    /// Derive the wallet, if a private key is configured.
    pub fn wallet(&self) -> Result<Option<Wallet>, WalletError> {
        self.private_key
            .as_deref()
            .map(Wallet::from_private_key)
            .transpose()
    }
}

impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConfig")
            .field("api_url", &self.api_url)
            .field("private_key", &self.private_key.as_ref().map(|_| "<redacted>"))
            .field("log_level", &self.log_level)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}
