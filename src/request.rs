//! Outbound request descriptor.
//!
//! A [`Request`] is configured in place through chained setters that take
//! `&mut self` and hand the same request back, so a caller holding the
//! request sees every later change:
//!
//! ```
//! use fetcher_core::{Request, must_parse_url};
//!
//! let mut request = Request::new();
//! request
//!     .set_url(must_parse_url("https://example.com/search"))
//!     .set_header("Accept", "application/json")
//!     .add_cookie("session", "abc123")
//!     .with_proxy("http://127.0.0.1:8080");
//!
//! assert_eq!(request.method, "GET");
//! assert_eq!(request.cookies.len(), 1);
//! ```
//!
//! Setters never fail. Anything malformed (an illegal header name, a proxy
//! string that is not a URL, an unknown method token) is reported by
//! [`download`](crate::download()) before any bytes go on the wire.

use std::fmt;

use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use tracing::debug;
use url::Url;

/// URL every fresh [`Request`] starts with; valid, but not fetchable.
const BLANK_URL: &str = "about:blank";

/// One `name=value` pair sent in the `Cookie` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    /// Cookie name.
    pub name: String,
    /// Cookie value, sent verbatim.
    pub value: String,
}

impl Cookie {
    /// Creates a cookie pair.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

impl fmt::Display for Cookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.value)
    }
}

/// Kind of payload carried in a request body, mapped to its `Content-Type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostDataType {
    /// `text/plain`
    Text,
    /// `application/x-www-form-urlencoded`
    UrlEncoded,
    /// `application/json`
    Json,
}

impl PostDataType {
    /// MIME type sent as `Content-Type` for this payload kind.
    #[must_use]
    pub fn content_type(self) -> &'static str {
        match self {
            Self::Text => "text/plain",
            Self::UrlEncoded => "application/x-www-form-urlencoded",
            Self::Json => "application/json",
        }
    }
}

/// Descriptor of one outbound HTTP call.
///
/// Fields are public and may be assigned directly; the setters exist for
/// chaining. Not meant to be mutated from several threads at once, and must
/// not be mutated while a [`download`](crate::download()) borrowing it is in
/// flight (the borrow checker enforces the latter).
#[derive(Debug, Clone)]
pub struct Request {
    /// Target URL. Starts as `about:blank`, which cannot be fetched.
    pub url: Url,
    /// HTTP method token, `"GET"` by default.
    pub method: String,
    /// Cookies sent in insertion order. Repeated names are all sent.
    pub cookies: Vec<Cookie>,
    /// Request headers (case-insensitive names, one or more values each).
    pub headers: HeaderMap,
    /// Raw request body, empty by default.
    pub body: Vec<u8>,
    /// Proxy URL for this request only. Empty means "use the shared client".
    pub proxy: String,
    /// First header key rejected by [`set_header`](Self::set_header).
    invalid_header: Option<String>,
}

impl Default for Request {
    fn default() -> Self {
        Self::new()
    }
}

impl Request {
    /// Creates a `GET` request with a blank URL and no headers, cookies,
    /// body or proxy.
    #[must_use]
    pub fn new() -> Self {
        Self {
            url: blank_url(),
            method: "GET".to_string(),
            cookies: Vec::new(),
            headers: HeaderMap::new(),
            body: Vec::new(),
            proxy: String::new(),
            invalid_header: None,
        }
    }

    /// Sets the target URL.
    pub fn set_url(&mut self, url: Url) -> &mut Self {
        self.url = url;
        self
    }

    /// Sets the HTTP method token. Validated when the request is sent.
    pub fn set_method(&mut self, method: impl Into<String>) -> &mut Self {
        self.method = method.into();
        self
    }

    /// Replaces every existing value of `key` with the single `value`.
    ///
    /// A key or value that is not legal in an HTTP header is remembered and
    /// makes the next download fail with
    /// [`DownloadError::InvalidHeader`](crate::DownloadError::InvalidHeader).
    pub fn set_header(&mut self, key: &str, value: &str) -> &mut Self {
        match (
            HeaderName::from_bytes(key.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                self.headers.insert(name, value);
            }
            _ => {
                debug!(header = %key, "rejected malformed header");
                self.invalid_header.get_or_insert_with(|| key.to_string());
            }
        }
        self
    }

    /// Replaces the body. The `Content-Type` header is left untouched.
    pub fn set_body(&mut self, body: impl Into<Vec<u8>>) -> &mut Self {
        self.body = body.into();
        self
    }

    /// Replaces the body and sets the matching `Content-Type` header.
    pub fn set_post_data(&mut self, kind: PostDataType, body: impl Into<Vec<u8>>) -> &mut Self {
        self.headers
            .insert(CONTENT_TYPE, HeaderValue::from_static(kind.content_type()));
        self.set_body(body)
    }

    /// Appends one cookie. Existing cookies with the same name are kept.
    pub fn add_cookie(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.cookies.push(Cookie::new(name, value));
        self
    }

    /// Routes this request through `proxy`, stored verbatim and parsed only
    /// when the request is sent.
    pub fn with_proxy(&mut self, proxy: impl Into<String>) -> &mut Self {
        self.proxy = proxy.into();
        self
    }

    /// Header key rejected by an earlier [`set_header`](Self::set_header), if any.
    #[must_use]
    pub fn invalid_header(&self) -> Option<&str> {
        self.invalid_header.as_deref()
    }
}

/// Parses a URL literal, panicking if it is malformed.
///
/// Meant for URLs written into the program by hand, where a typo is a bug.
/// Never use it on URLs that come from user input or the network; call
/// [`Url::parse`] and handle the error instead.
///
/// # Panics
///
/// Panics if `raw` is not a valid absolute URL.
#[must_use]
#[track_caller]
pub fn must_parse_url(raw: &str) -> Url {
    match Url::parse(raw) {
        Ok(url) => url,
        Err(error) => panic!("invalid URL literal {raw:?}: {error}"),
    }
}

#[allow(clippy::expect_used)]
fn blank_url() -> Url {
    Url::parse(BLANK_URL).expect("about:blank is a valid URL")
}
