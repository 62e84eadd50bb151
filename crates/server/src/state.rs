//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::ProxyConfig;

/// Application state shared across all handlers.
///
/// Cheap to clone; the configuration and the upstream HTTP client live
/// behind one `Arc`. There is no other cross-request state.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ProxyConfig,
    http: reqwest::Client,
}

impl AppState {
    /// Build the state, constructing the shared upstream client with the
    /// configured timeout.
    ///
    /// # Errors
    ///
    /// Returns the underlying `reqwest` error if the client cannot be built.
    pub fn new(config: ProxyConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(config.upstream_timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(AppStateInner { config, http }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &ProxyConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn http(&self) -> &reqwest::Client {
        &self.inner.http
    }
}
