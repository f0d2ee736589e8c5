//! HTTP client for ranking sources.
//!
//! Features:
//! - Connection pooling with keep-alive (per-category pages share a host)
//! - Brotli, Gzip compression (auto-negotiated)
//! - Realistic browser fingerprinting
//! - Per-request timeouts, mapped to [`FetchError::Timeout`]

use std::time::Duration;

use reqwest::Client;
use tracing::{debug, info, instrument};

use crate::error::FetchError;
use crate::fingerprint::BrowserProfile;

/// Body and metadata of a successful plain request.
#[derive(Debug, Clone)]
pub struct TextResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: String,
}

/// HTTP client with pooled connections and a browser profile.
pub struct AcceleratedClient {
    client: Client,
}

impl AcceleratedClient {
    /// Create client with specific browser profile
    pub fn with_profile(profile: &BrowserProfile) -> Result<Self, FetchError> {
        let headers = profile.to_headers();

        let client = Client::builder()
            // Let the server negotiate HTTP/1.1 vs HTTP/2
            .http2_adaptive_window(true)
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .tcp_nodelay(true)
            .use_rustls_tls()
            .brotli(true)
            .gzip(true)
            .deflate(true)
            .default_headers(headers)
            .connect_timeout(Duration::from_secs(10))
            .redirect(reqwest::redirect::Policy::limited(10))
            .cookie_store(true)
            .build()
            .map_err(|e| FetchError::Network(e.to_string()))?;

        Ok(Self { client })
    }

    /// GET `url` and return its body as text.
    ///
    /// A non-2xx status is an error; the body is not read in that case.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn fetch_text(&self, url: &str, timeout: Duration) -> Result<TextResponse, FetchError> {
        debug!("Fetching");
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| map_reqwest_error(&e, timeout))?;

        let status = response.status();
        info!(
            status = %status,
            version = ?response.version(),
            "Response received"
        );

        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let body = response
            .text()
            .await
            .map_err(|e| map_reqwest_error(&e, timeout))?;

        Ok(TextResponse {
            status: status.as_u16(),
            content_type,
            body,
        })
    }
}

fn map_reqwest_error(error: &reqwest::Error, timeout: Duration) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout(timeout)
    } else {
        FetchError::Network(error.to_string())
    }
}
