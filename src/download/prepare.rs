//! Turns a [`Request`] into the parts handed to the HTTP client.

use reqwest::Method;
use reqwest::header::{COOKIE, HeaderMap, HeaderValue};
use url::Url;

use super::error::DownloadError;
use crate::request::{Cookie, Request};

/// Validated, detached copy of a request's wire-level parts.
#[derive(Debug)]
pub(crate) struct PreparedRequest {
    pub(crate) method: Method,
    pub(crate) url: Url,
    pub(crate) headers: HeaderMap,
    pub(crate) body: Option<Vec<u8>>,
}

/// Validates `request` and copies what goes on the wire.
///
/// Headers are cloned, so later edits to the request do not reach an
/// exchange already in flight. Cookies are folded into one `Cookie` header.
///
/// # Errors
///
/// Returns a construction error for a bad method token, a non-HTTP URL, a
/// header rejected by [`Request::set_header`], or cookies that cannot be
/// encoded as a header value.
pub(crate) fn prepare(request: &Request) -> Result<PreparedRequest, DownloadError> {
    let method = Method::from_bytes(request.method.as_bytes())
        .map_err(|_| DownloadError::invalid_method(&request.method))?;

    let scheme = request.url.scheme();
    if !matches!(scheme, "http" | "https") {
        return Err(DownloadError::invalid_url(
            request.url.as_str(),
            format!("unsupported scheme {scheme:?}, expected http or https"),
        ));
    }

    if let Some(name) = request.invalid_header() {
        return Err(DownloadError::invalid_header(name));
    }

    let mut headers = request.headers.clone();
    attach_cookies(&mut headers, &request.cookies)?;

    Ok(PreparedRequest {
        method,
        url: request.url.clone(),
        headers,
        body: (!request.body.is_empty()).then(|| request.body.clone()),
    })
}

fn attach_cookies(headers: &mut HeaderMap, cookies: &[Cookie]) -> Result<(), DownloadError> {
    if cookies.is_empty() {
        return Ok(());
    }

    let pairs = cookies
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ");
    let combined = match headers
        .get(COOKIE)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
    {
        Some(existing) => format!("{existing}; {pairs}"),
        None => pairs,
    };

    let value = HeaderValue::from_str(&combined)
        .map_err(|_| DownloadError::invalid_header(COOKIE.as_str()))?;
    headers.insert(COOKIE, value);
    Ok(())
}
