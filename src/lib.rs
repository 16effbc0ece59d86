//! Fetcher Core Library
//!
//! A small HTTP fetch abstraction: describe an outbound call with a
//! [`Request`], run it with [`download`] (or [`Downloader::fetch`] from async
//! code), and get back a [`Response`] that already exposes the body as raw
//! bytes, text, a parsed HTML document and a decoded JSON map.
//!
//! # Architecture
//!
//! - [`request`] - the outbound request descriptor and its chained setters
//! - [`response`] - the response descriptor and its derived body views
//! - [`download`] - the exchange itself, client selection and errors
//!
//! # Example
//!
//! ```no_run
//! use fetcher_core::{Request, download, must_parse_url};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut request = Request::new();
//! request
//!     .set_url(must_parse_url("https://example.com/"))
//!     .set_header("Accept", "text/html");
//!
//! let response = download(&request)?;
//! println!("{} ({} bytes)", response.status(), response.body().len());
//! # Ok(())
//! # }
//! ```

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod download;
pub mod request;
pub mod response;
mod user_agent;

// Re-export commonly used types
pub use download::{
    DownloadError, Downloader, DownloaderConfig, HttpError, REQUEST_TIMEOUT_SECS, download,
};
pub use request::{Cookie, PostDataType, Request, must_parse_url};
pub use response::{ReplyInfo, Response, ViewState};
