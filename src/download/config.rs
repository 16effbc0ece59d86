//! Client configuration.

use std::time::Duration;

use super::constants::REQUEST_TIMEOUT_SECS;
use crate::user_agent;

/// Settings applied to every HTTP client a downloader builds, including the
/// one-off clients built for proxied requests.
///
/// The blocking [`download`](crate::download()) always uses the default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloaderConfig {
    /// Ceiling on one whole exchange, body included.
    pub timeout: Duration,
    /// `User-Agent` sent when the request does not set its own.
    pub user_agent: String,
}

impl Default for DownloaderConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
            user_agent: user_agent::default_user_agent(),
        }
    }
}

impl DownloaderConfig {
    /// Replaces the exchange timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Replaces the default `User-Agent`.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}
