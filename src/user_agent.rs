//! Default User-Agent sent with every request that does not set its own.

/// Default User-Agent for fetch requests: `<crate name>/<crate version>`.
#[must_use]
pub(crate) fn default_user_agent() -> String {
    format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
}
