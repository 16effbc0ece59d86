//! Error types for the download module.
//!
//! Three kinds of failure reach the caller: construction errors (the
//! request could not be turned into an exchange, nothing was sent),
//! transport errors ([`HttpError`], the exchange did not complete) and body
//! read errors. Non-2xx status codes are not errors, and neither is a body
//! that fails to parse as HTML or JSON.

use std::error::Error as StdError;
use std::fmt;

use thiserror::Error;

use crate::request::Request;

/// Errors returned by [`download`](crate::download()) and
/// [`Downloader::fetch`](crate::Downloader::fetch).
#[derive(Debug, Error)]
pub enum DownloadError {
    /// The method string is not a valid HTTP method token.
    #[error("invalid HTTP method {method:?}")]
    InvalidMethod {
        /// The rejected method.
        method: String,
    },

    /// The URL cannot be fetched over HTTP.
    #[error("invalid URL {url}: {reason}")]
    InvalidUrl {
        /// The rejected URL.
        url: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A header or cookie cannot be encoded as an HTTP header.
    #[error("invalid header {name:?}")]
    InvalidHeader {
        /// Name of the offending header (`Cookie` for cookies).
        name: String,
    },

    /// The per-request proxy string is not a usable proxy URL.
    #[error("invalid proxy {proxy:?}: {reason}")]
    InvalidProxy {
        /// The proxy string as supplied on the request.
        proxy: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {reason}")]
    ClientBuild {
        /// Why construction failed.
        reason: String,
    },

    /// The exchange itself failed (DNS, connect, TLS, timeout, ...).
    #[error(transparent)]
    Http(#[from] HttpError),

    /// The server replied but the body could not be read to the end.
    #[error("failed reading response body from {url}: {source}")]
    Body {
        /// The URL whose body failed.
        url: String,
        /// The underlying read error.
        #[source]
        source: reqwest::Error,
    },
}

impl DownloadError {
    /// Creates an invalid method error.
    pub fn invalid_method(method: impl Into<String>) -> Self {
        Self::InvalidMethod {
            method: method.into(),
        }
    }

    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidUrl {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Creates an invalid header error.
    pub fn invalid_header(name: impl Into<String>) -> Self {
        Self::InvalidHeader { name: name.into() }
    }

    /// Creates an invalid proxy error.
    pub fn invalid_proxy(proxy: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self::InvalidProxy {
            proxy: proxy.into(),
            reason: reason.to_string(),
        }
    }

    /// Creates a client construction error.
    pub fn client_build(reason: impl fmt::Display) -> Self {
        Self::ClientBuild {
            reason: reason.to_string(),
        }
    }

    /// Creates a body read error.
    pub fn body(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Body {
            url: url.into(),
            source,
        }
    }

    /// True for errors raised before anything was sent.
    #[must_use]
    pub fn is_construction(&self) -> bool {
        matches!(
            self,
            Self::InvalidMethod { .. }
                | Self::InvalidUrl { .. }
                | Self::InvalidHeader { .. }
                | Self::InvalidProxy { .. }
                | Self::ClientBuild { .. }
        )
    }

    /// The transport error, when the exchange itself failed.
    #[must_use]
    pub fn as_http(&self) -> Option<&HttpError> {
        match self {
            Self::Http(error) => Some(error),
            _ => None,
        }
    }
}

/// Transport failure together with the request that caused it.
///
/// Holds its own copy of the request so the error can outlive the caller's
/// borrow and be passed up as `Box<dyn Error>`.
#[derive(Debug)]
pub struct HttpError {
    source: reqwest::Error,
    request: Box<Request>,
}

impl HttpError {
    pub(crate) fn new(source: reqwest::Error, request: &Request) -> Self {
        Self {
            source,
            request: Box::new(request.clone()),
        }
    }

    /// The request whose exchange failed.
    #[must_use]
    pub fn request(&self) -> &Request {
        &self.request
    }

    /// True when the exchange hit the client timeout.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        self.source.is_timeout()
    }

    /// True when no connection could be established (target or proxy).
    #[must_use]
    pub fn is_connect(&self) -> bool {
        self.source.is_connect()
    }
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "HTTP error on {} {}: {}",
            self.request.method, self.request.url, self.source
        )
    }
}

impl StdError for HttpError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(&self.source)
    }
}

// No `From<reqwest::Error>`: every variant needs context (URL, request) the
// reqwest error does not carry, so callers go through the constructors.
