//! HTTP client construction and per-request client selection.
//!
//! Requests without a proxy go through a long-lived shared client. Requests
//! with a proxy get a client of their own, built for that one exchange and
//! dropped with it, so nothing proxy-related is ever shared between calls.

use std::ops::Deref;
use std::panic::{AssertUnwindSafe, catch_unwind, set_hook, take_hook};
use std::sync::OnceLock;

use reqwest::Proxy;
use tracing::{debug, warn};
use url::Url;

use super::config::DownloaderConfig;
use super::constants::{HTTP_PROXY_VARS, HTTPS_PROXY_VARS};
use super::error::DownloadError;
use crate::request::Request;

/// Client used for one exchange.
#[derive(Debug)]
pub(crate) enum ClientChoice<'a, C> {
    /// Long-lived client shared by every unproxied request.
    Shared(&'a C),
    /// Client built for a single proxied request.
    OneOff(C),
}

impl<C> Deref for ClientChoice<'_, C> {
    type Target = C;

    fn deref(&self) -> &C {
        match self {
            Self::Shared(client) => client,
            Self::OneOff(client) => client,
        }
    }
}

/// Picks the client for `request`: the shared one when no proxy is set,
/// otherwise a fresh client routed through the parsed proxy.
///
/// # Errors
///
/// Returns [`DownloadError::InvalidProxy`] if the proxy string cannot be
/// parsed, or whatever the supplied constructors return.
pub(crate) fn select_client<'a, C>(
    request: &Request,
    shared: impl FnOnce() -> Result<&'a C, DownloadError>,
    one_off: impl FnOnce(Proxy) -> Result<C, DownloadError>,
) -> Result<ClientChoice<'a, C>, DownloadError> {
    if request.proxy.is_empty() {
        return shared().map(ClientChoice::Shared);
    }
    let proxy = parse_proxy(&request.proxy)?;
    debug!(proxy = %request.proxy, "building one-off proxied client");
    one_off(proxy).map(ClientChoice::OneOff)
}

/// Parses a per-request proxy string into a proxy for all schemes.
pub(crate) fn parse_proxy(raw: &str) -> Result<Proxy, DownloadError> {
    let url = Url::parse(raw).map_err(|error| DownloadError::invalid_proxy(raw, error))?;
    Proxy::all(url).map_err(|error| DownloadError::invalid_proxy(raw, error))
}

static SHARED_BLOCKING_CLIENT: OnceLock<reqwest::blocking::Client> = OnceLock::new();

/// The process-wide blocking client, built with the default config on first use.
pub(crate) fn shared_blocking_client()
-> Result<&'static reqwest::blocking::Client, DownloadError> {
    if let Some(client) = SHARED_BLOCKING_CLIENT.get() {
        return Ok(client);
    }
    let client = build_blocking_client(&DownloaderConfig::default())?;
    Ok(SHARED_BLOCKING_CLIENT.get_or_init(|| client))
}

/// Builds a long-lived blocking client that honours the system proxy settings.
pub(crate) fn build_blocking_client(
    config: &DownloaderConfig,
) -> Result<reqwest::blocking::Client, DownloadError> {
    build_guarded(|disable_system_proxy_lookup| {
        let mut builder = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .gzip(true)
            .user_agent(config.user_agent.clone());
        if disable_system_proxy_lookup {
            builder = env_proxies().into_iter().fold(builder.no_proxy(), |b, p| b.proxy(p));
        }
        builder.build()
    })
}

/// Builds a one-off blocking client routed through `proxy`.
///
/// An explicit proxy turns off the system proxy lookup, so this build is not
/// guarded and leaves the process panic hook alone.
pub(crate) fn build_proxied_blocking_client(
    config: &DownloaderConfig,
    proxy: Proxy,
) -> Result<reqwest::blocking::Client, DownloadError> {
    reqwest::blocking::Client::builder()
        .timeout(config.timeout)
        .gzip(true)
        .user_agent(config.user_agent.clone())
        .proxy(proxy)
        .build()
        .map_err(DownloadError::client_build)
}

/// Builds a long-lived async client that honours the system proxy settings.
pub(crate) fn build_async_client(
    config: &DownloaderConfig,
) -> Result<reqwest::Client, DownloadError> {
    build_guarded(|disable_system_proxy_lookup| {
        let mut builder = reqwest::Client::builder()
            .timeout(config.timeout)
            .gzip(true)
            .user_agent(config.user_agent.clone());
        if disable_system_proxy_lookup {
            builder = env_proxies().into_iter().fold(builder.no_proxy(), |b, p| b.proxy(p));
        }
        builder.build()
    })
}

/// Async counterpart of [`build_proxied_blocking_client`].
pub(crate) fn build_proxied_async_client(
    config: &DownloaderConfig,
    proxy: Proxy,
) -> Result<reqwest::Client, DownloadError> {
    reqwest::Client::builder()
        .timeout(config.timeout)
        .gzip(true)
        .user_agent(config.user_agent.clone())
        .proxy(proxy)
        .build()
        .map_err(DownloadError::client_build)
}

/// Runs `build`, retrying once with system proxy lookup disabled if the
/// first attempt panics (some sandboxed environments panic while querying
/// system proxy settings).
fn build_guarded<C>(
    build: impl Fn(bool) -> Result<C, reqwest::Error>,
) -> Result<C, DownloadError> {
    match try_build(&build, false) {
        Ok(result) => result.map_err(DownloadError::client_build),
        Err(()) => {
            warn!(
                "HTTP client builder panicked while loading system proxy settings; retrying with env-proxy fallback"
            );
            match try_build(&build, true) {
                Ok(result) => result.map_err(DownloadError::client_build),
                Err(()) => Err(DownloadError::client_build(
                    "HTTP client builder panicked while applying env-proxy fallback",
                )),
            }
        }
    }
}

fn try_build<C>(
    build: &impl Fn(bool) -> Result<C, reqwest::Error>,
    disable_system_proxy_lookup: bool,
) -> Result<Result<C, reqwest::Error>, ()> {
    catch_unwind_silent(AssertUnwindSafe(|| {
        #[cfg(test)]
        maybe_inject_client_build_panic(disable_system_proxy_lookup);

        build(disable_system_proxy_lookup)
    }))
    .map_err(|_| ())
}

// `catch_unwind` does not suppress panic-hook stderr output; silence the hook
// while a guarded build runs. Only long-lived clients go through here.
static CLIENT_BUILD_PANIC_HOOK_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

fn catch_unwind_silent<F, T>(operation: F) -> Result<T, Box<dyn std::any::Any + Send + 'static>>
where
    F: FnOnce() -> T + std::panic::UnwindSafe,
{
    let _panic_hook_guard = CLIENT_BUILD_PANIC_HOOK_LOCK
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    let previous_hook = take_hook();
    set_hook(Box::new(|_| {}));
    let outcome = catch_unwind(operation);
    set_hook(previous_hook);
    outcome
}

fn env_proxies() -> Vec<Proxy> {
    let mut proxies = Vec::new();
    if let Some(proxy) = find_first_proxy_var(HTTPS_PROXY_VARS)
        && let Ok(resolved) = Proxy::https(&proxy)
    {
        proxies.push(resolved);
    }
    if let Some(proxy) = find_first_proxy_var(HTTP_PROXY_VARS)
        && let Ok(resolved) = Proxy::http(&proxy)
    {
        proxies.push(resolved);
    }
    proxies
}

fn find_first_proxy_var(names: &[&str]) -> Option<String> {
    names.iter().find_map(|name| {
        std::env::var(name)
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    })
}

#[cfg(test)]
static CLIENT_BUILD_PANIC_INJECTION_COUNT: std::sync::atomic::AtomicUsize =
    std::sync::atomic::AtomicUsize::new(0);

#[cfg(test)]
fn inject_client_build_panics(count: usize) {
    CLIENT_BUILD_PANIC_INJECTION_COUNT.store(count, std::sync::atomic::Ordering::SeqCst);
}

#[cfg(test)]
fn maybe_inject_client_build_panic(disable_system_proxy_lookup: bool) {
    use std::sync::atomic::Ordering;

    if disable_system_proxy_lookup {
        return;
    }

    if CLIENT_BUILD_PANIC_INJECTION_COUNT
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |count| {
            if count > 0 { Some(count - 1) } else { None }
        })
        .is_ok()
    {
        panic!("injected HTTP client builder panic");
    }
}
