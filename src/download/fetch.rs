//! Blocking download over the process-wide shared client.

use tracing::{debug, instrument};

use super::client::{build_proxied_blocking_client, select_client, shared_blocking_client};
use super::config::DownloaderConfig;
use super::error::{DownloadError, HttpError};
use super::prepare::prepare;
use crate::request::Request;
use crate::response::{ReplyInfo, Response};

/// Sends `request` and returns the fully read, fully parsed response.
///
/// Blocks the calling thread for the whole exchange, at most
/// [`REQUEST_TIMEOUT_SECS`](super::REQUEST_TIMEOUT_SECS). Requests without a
/// proxy share one client across the process and may be downloaded from
/// many threads at once; a request with a proxy gets its own client.
///
/// Do not call this from inside an async runtime; use
/// [`Downloader::fetch`](crate::Downloader::fetch) there.
///
/// Any status code, 4xx and 5xx included, produces `Ok`: inspect
/// [`Response::status`].
///
/// # Errors
///
/// - a construction error (bad method, URL, header, cookie or proxy) before
///   anything is sent
/// - [`DownloadError::Http`] when the exchange fails; never retried
/// - [`DownloadError::Body`] when the body cannot be read to the end
#[instrument(skip(request), fields(method = %request.method, url = %request.url))]
pub fn download(request: &Request) -> Result<Response<'_>, DownloadError> {
    let prepared = prepare(request)?;
    let client = select_client(request, shared_blocking_client, |proxy| {
        build_proxied_blocking_client(&DownloaderConfig::default(), proxy)
    })?;

    let mut builder = client
        .request(prepared.method, prepared.url)
        .headers(prepared.headers);
    if let Some(body) = prepared.body {
        builder = builder.body(body);
    }

    let reply = builder
        .send()
        .map_err(|error| HttpError::new(error, request))?;

    let info = ReplyInfo::from_blocking(&reply);
    let status = reply.status();
    let headers = reply.headers().clone();
    let body = reply
        .bytes()
        .map_err(|error| DownloadError::body(request.url.as_str(), error))?;

    debug!(status = status.as_u16(), bytes = body.len(), "download complete");
    Ok(Response::assemble(request, status, headers, info, body.to_vec()))
}
