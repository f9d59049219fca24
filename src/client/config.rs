//! Client configuration

use std::time::Duration;

/// Default backend base URL, including the API prefix.
pub const DEFAULT_BASE_URL: &str = "http://localhost:3001/api/v1";

/// Configuration for talking to the ordering backend
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend base URL (e.g. "http://localhost:3001/api/v1")
    pub base_url: String,

    /// Timeout for REST calls. The event stream is long-lived and only
    /// bounded by `connect_timeout`.
    pub timeout: Duration,

    /// Timeout for establishing a TCP/TLS connection
    pub connect_timeout: Duration,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Join `path` onto the base URL.
    pub(crate) fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}
