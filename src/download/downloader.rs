//! Async downloader for callers running inside a tokio runtime.

use tracing::{debug, instrument};

use super::client::{build_async_client, build_proxied_async_client, select_client};
use super::config::DownloaderConfig;
use super::error::{DownloadError, HttpError};
use super::prepare::prepare;
use crate::request::Request;
use crate::response::{ReplyInfo, Response};

/// Async counterpart of [`download`](crate::download()).
///
/// Owns one shared client, created once and reused for every unproxied
/// request (cloning the downloader shares it). Proxied requests get a
/// one-off client built from the same [`DownloaderConfig`].
///
/// [`Response`] holds a parsed HTML document and is not `Send`, so a fetched
/// response cannot be returned from a `tokio::spawn` task. Extract owned data
/// (text, JSON values, selected elements) inside the task and return that.
///
/// # Example
///
/// ```no_run
/// use fetcher_core::{Downloader, Request, must_parse_url};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let downloader = Downloader::new()?;
/// let mut request = Request::new();
/// request.set_url(must_parse_url("https://example.com/data.json"));
///
/// let response = downloader.fetch(&request).await?;
/// println!("{:?}", response.json().get("name"));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Downloader {
    client: reqwest::Client,
    config: DownloaderConfig,
}

impl Downloader {
    /// Creates a downloader with the default configuration.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::ClientBuild`] if the HTTP client cannot be built.
    pub fn new() -> Result<Self, DownloadError> {
        Self::with_config(DownloaderConfig::default())
    }

    /// Creates a downloader with an explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::ClientBuild`] if the HTTP client cannot be built.
    pub fn with_config(config: DownloaderConfig) -> Result<Self, DownloadError> {
        let client = build_async_client(&config)?;
        Ok(Self { client, config })
    }

    /// Configuration every client of this downloader is built with.
    #[must_use]
    pub fn config(&self) -> &DownloaderConfig {
        &self.config
    }

    /// Sends `request` and returns the fully read, fully parsed response.
    ///
    /// Same contract as [`download`](crate::download()): non-2xx statuses
    /// are not errors and body parse failures are never surfaced.
    ///
    /// # Errors
    ///
    /// Returns the same errors as [`download`](crate::download()).
    #[instrument(skip(self, request), fields(method = %request.method, url = %request.url))]
    pub async fn fetch<'r>(&self, request: &'r Request) -> Result<Response<'r>, DownloadError> {
        let prepared = prepare(request)?;
        let client = select_client(
            request,
            || Ok(&self.client),
            |proxy| build_proxied_async_client(&self.config, proxy),
        )?;

        let mut builder = client
            .request(prepared.method, prepared.url)
            .headers(prepared.headers);
        if let Some(body) = prepared.body {
            builder = builder.body(body);
        }

        let reply = builder
            .send()
            .await
            .map_err(|error| HttpError::new(error, request))?;

        let info = ReplyInfo::from_async(&reply);
        let status = reply.status();
        let headers = reply.headers().clone();
        let body = reply
            .bytes()
            .await
            .map_err(|error| DownloadError::body(request.url.as_str(), error))?;

        debug!(status = status.as_u16(), bytes = body.len(), "fetch complete");
        Ok(Response::assemble(request, status, headers, info, body.to_vec()))
    }
}
