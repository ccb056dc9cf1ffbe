//! HTTP client for fetching result pages with rate limiting
//!
//! Thin wrapper over `reqwest` that applies a per-client request quota, a
//! browser-like user agent and a cookie store, and reports failures as
//! `SessionError`s so the session layer can surface them unchanged.

use std::num::NonZeroU32;
use std::time::Duration;

use governor::{
    Quota, RateLimiter,
    clock::DefaultClock,
    state::{InMemoryState, direct::NotKeyed},
};
use reqwest::{
    Client, Method, Response,
    header::{ACCEPT_LANGUAGE, HeaderMap, HeaderValue},
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use url::Url;

use super::session::{SessionError, SessionResult};

/// HTTP client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpClientConfig {
    pub user_agent: String,
    pub timeout_seconds: u64,
    pub max_requests_per_second: u32,
    pub accept_language: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36".to_string(),
            timeout_seconds: 30,
            max_requests_per_second: 1,
            accept_language: "en-IN,en;q=0.9".to_string(),
        }
    }
}

/// A fetched document and the URL it was finally served from
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub url: Url,
    pub body: String,
}

/// Rate-limited HTTP client
pub struct HttpClient {
    client: Client,
    rate_limiter: RateLimiter<NotKeyed, InMemoryState, DefaultClock>,
}

impl HttpClient {
    pub fn new(config: &HttpClientConfig) -> anyhow::Result<Self> {
        use anyhow::Context;

        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_str(&config.accept_language).context("Invalid accept-language")?,
        );

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(&config.user_agent)
            .default_headers(headers)
            .cookie_store(true)
            .gzip(true)
            .brotli(true)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .context("Failed to create HTTP client")?;

        let quota = Quota::per_second(
            NonZeroU32::new(config.max_requests_per_second)
                .context("Rate limit must be greater than 0")?,
        );

        Ok(Self {
            client,
            rate_limiter: RateLimiter::direct(quota),
        })
    }

    /// Submit form fields: as a query string for GET, url-encoded body otherwise
    pub async fn fetch(
        &self,
        method: Method,
        url: &Url,
        fields: &[(String, String)],
    ) -> SessionResult<FetchedPage> {
        self.rate_limiter.until_ready().await;

        info!("Fetching {} {}", method, url);

        let request = if method == Method::GET {
            self.client.get(url.clone()).query(fields)
        } else {
            self.client.request(method, url.clone()).form(fields)
        };

        let response = request
            .send()
            .await
            .map_err(|e| SessionError::navigation(url.as_str(), e))?;

        Self::read_page(response).await
    }

    async fn read_page(response: Response) -> SessionResult<FetchedPage> {
        let url = response.url().clone();
        let status = response.status();

        if !status.is_success() {
            return Err(SessionError::Http {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| SessionError::navigation(url.as_str(), e))?;

        debug!("Fetched {} ({} bytes)", url, body.len());
        Ok(FetchedPage { url, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_builds_from_default_config() {
        assert!(HttpClient::new(&HttpClientConfig::default()).is_ok());
    }

    #[test]
    fn test_zero_rate_is_rejected() {
        let config = HttpClientConfig {
            max_requests_per_second: 0,
            ..HttpClientConfig::default()
        };
        assert!(HttpClient::new(&config).is_err());
    }
}
