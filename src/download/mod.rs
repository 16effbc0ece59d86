//! Executes a [`Request`](crate::Request) and builds the
//! [`Response`](crate::Response).
//!
//! # Features
//!
//! - Blocking [`download`] over one process-wide shared client
//! - Async [`Downloader`] for code already running on tokio
//! - One-off client per proxied request; nothing proxy-related is shared
//! - Fixed 10s ceiling on every exchange, no retries
//! - Body read fully into memory and parsed as text, HTML and JSON
//!
//! # Example
//!
//! ```no_run
//! use fetcher_core::{Request, download, must_parse_url};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut request = Request::new();
//! request
//!     .set_url(must_parse_url("https://example.com/api"))
//!     .with_proxy("http://127.0.0.1:3128");
//!
//! let response = download(&request)?;
//! if response.status().is_success() {
//!     println!("{}", response.text());
//! }
//! # Ok(())
//! # }
//! ```

mod client;
mod config;
mod constants;
mod downloader;
mod error;
mod fetch;
mod prepare;

pub use config::DownloaderConfig;
pub use constants::REQUEST_TIMEOUT_SECS;
pub use downloader::Downloader;
pub use error::{DownloadError, HttpError};
pub use fetch::download;
