//! Constants for the download module.

/// Ceiling on one whole exchange (connect, send, receive body), in seconds.
/// Applies to the shared client and to every per-proxy client.
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Environment variables consulted, in order, for an HTTPS proxy when the
/// system proxy lookup has to be bypassed.
pub(crate) const HTTPS_PROXY_VARS: &[&str] =
    &["HTTPS_PROXY", "https_proxy", "ALL_PROXY", "all_proxy"];

/// Same as [`HTTPS_PROXY_VARS`] for plain HTTP.
pub(crate) const HTTP_PROXY_VARS: &[&str] =
    &["HTTP_PROXY", "http_proxy", "ALL_PROXY", "all_proxy"];
