//! Shared HTTP client construction.

use std::time::Duration;

/// Create the HTTP client shared by the REST providers.
///
/// Config: 30s connect timeout, 120s request timeout, rustls TLS,
/// `reporag/{version}` user-agent, redirect limit 10.
#[must_use]
pub fn default_client() -> reqwest::Client {
    reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(30))
        .timeout(Duration::from_secs(120))
        .user_agent(concat!("reporag/", env!("CARGO_PKG_VERSION")))
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()
        .expect("default HTTP client construction must not fail")
}
