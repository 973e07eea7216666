//! Shared HTTP client
//!
//! Features:
//! - HTTP/2 with fallback to HTTP/1.1
//! - Gzip compression (auto-negotiated)
//! - Connection pooling with keep-alive
//! - Bounded connect time, unbounded transfer time for large media

use std::time::Duration;

use reqwest::{Client, Response};
use tracing::{debug, instrument};

use crate::error::Result;

const USER_AGENT: &str = concat!("storyreel/", env!("CARGO_PKG_VERSION"));

/// HTTP client shared by the catalog, downloader and speech backends
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .http2_adaptive_window(true)
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .tcp_nodelay(true)
            .use_rustls_tls()
            .gzip(true)
            .connect_timeout(Duration::from_secs(10))
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;

        Ok(Self { client })
    }

    /// GET a URL, failing on non-2xx status
    #[instrument(skip(self), fields(url = %url))]
    pub async fn get(&self, url: &str) -> Result<Response> {
        debug!("GET");
        let response = self.client.get(url).send().await?.error_for_status()?;
        debug!(status = %response.status(), version = ?response.version(), "Response received");
        Ok(response)
    }

    /// Get the underlying reqwest client
    #[must_use]
    pub fn inner(&self) -> &Client {
        &self.client
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_agent_names_crate() {
        assert!(USER_AGENT.starts_with("storyreel/"));
        assert!(HttpClient::new().is_ok());
    }
}
