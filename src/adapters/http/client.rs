//! Source HTTP Client - Header-rotating reqwest Transport
//!
//! Wraps reqwest with the browser-like headers the public agricultural
//! sources expect, user-agent rotation, and optional retries for all
//! source adapter requests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::config::HttpConfig;
use crate::ports::transport::{HttpTransport, RawResponse, SourceRequest, TransportError};

/// Configuration for the source HTTP client.
#[derive(Debug, Clone)]
pub struct SourceClientConfig {
    /// User-agent pool, rotated per request.
    pub user_agents: Vec<String>,
    /// `Accept-Language` header value.
    pub accept_language: String,
    /// `Referer` header value.
    pub referer: String,
    /// Maximum retries on transport errors and 5xx responses.
    pub max_retries: u32,
    /// Base delay between retries (exponential backoff).
    pub retry_base_delay: Duration,
    /// Idle connections kept per host.
    pub pool_max_idle_per_host: usize,
}

impl From<&HttpConfig> for SourceClientConfig {
    fn from(config: &HttpConfig) -> Self {
        Self {
            user_agents: config.user_agents.clone(),
            accept_language: config.accept_language.clone(),
            referer: config.referer.clone(),
            max_retries: config.max_retries,
            retry_base_delay: Duration::from_millis(config.retry_base_delay_ms),
            pool_max_idle_per_host: config.pool_max_idle_per_host,
        }
    }
}

impl Default for SourceClientConfig {
    fn default() -> Self {
        Self::from(&HttpConfig::default())
    }
}

/// reqwest-backed implementation of the `HttpTransport` port.
pub struct ReqwestTransport {
    /// Underlying HTTP client.
    http: Client,
    /// Client configuration.
    config: SourceClientConfig,
    /// Next user-agent index.
    next_agent: AtomicUsize,
}

impl ReqwestTransport {
    /// Create a new transport.
    ///
    /// # Errors
    /// Fails when the user-agent pool is empty or the client cannot be built.
    pub fn new(config: SourceClientConfig) -> Result<Self> {
        anyhow::ensure!(
            !config.user_agents.is_empty(),
            "At least one user agent is required"
        );

        let http = Client::builder()
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            config,
            next_agent: AtomicUsize::new(0),
        })
    }

    /// Pick the next user agent (round-robin).
    fn user_agent(&self) -> &str {
        let idx = self.next_agent.fetch_add(1, Ordering::Relaxed);
        &self.config.user_agents[idx % self.config.user_agents.len()]
    }

    /// Build a request with default and per-request headers.
    fn build(&self, request: &SourceRequest) -> RequestBuilder {
        let mut req = self
            .http
            .get(&request.url)
            .timeout(request.timeout)
            .header(reqwest::header::USER_AGENT, self.user_agent())
            .header(reqwest::header::ACCEPT_LANGUAGE, &self.config.accept_language)
            .header(reqwest::header::REFERER, &self.config.referer);

        for (name, value) in &request.headers {
            req = req.header(name.as_str(), value.as_str());
        }
        req
    }

    /// Send once, mapping reqwest errors onto the port's error type.
    async fn send_once(&self, request: &SourceRequest) -> Result<RawResponse, TransportError> {
        let response = self
            .build(request)
            .send()
            .await
            .map_err(|e| classify(&e, request.timeout))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| classify(&e, request.timeout))?;

        Ok(RawResponse { status, body })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, request: &SourceRequest) -> Result<RawResponse, TransportError> {
        let mut last = None;

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                let delay = self.config.retry_base_delay * 2u32.pow(attempt - 1);
                debug!(attempt, delay_ms = delay.as_millis(), "Retrying request");
                sleep(delay).await;
            }

            match self.send_once(request).await {
                Ok(response) if response.status >= 500 => {
                    warn!(url = %request.url, status = response.status, attempt, "Server error");
                    last = Some(Ok(response));
                }
                Ok(response) => {
                    debug!(url = %request.url, status = response.status, "Response received");
                    return Ok(response);
                }
                Err(e) => {
                    warn!(url = %request.url, error = %e, attempt, "Request failed");
                    last = Some(Err(e));
                }
            }
        }

        last.unwrap_or_else(|| Err(TransportError::Request("no attempt made".to_string())))
    }
}

fn classify(err: &reqwest::Error, timeout: Duration) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout(timeout)
    } else if err.is_connect() {
        TransportError::Connect(err.to_string())
    } else {
        TransportError::Request(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_empty_agent_pool() {
        let config = SourceClientConfig {
            user_agents: Vec::new(),
            ..SourceClientConfig::default()
        };
        assert!(ReqwestTransport::new(config).is_err());
    }

    #[test]
    fn test_user_agent_rotates() {
        let config = SourceClientConfig {
            user_agents: vec!["a".to_string(), "b".to_string()],
            ..SourceClientConfig::default()
        };
        let transport = ReqwestTransport::new(config).unwrap();
        assert_eq!(transport.user_agent(), "a");
        assert_eq!(transport.user_agent(), "b");
        assert_eq!(transport.user_agent(), "a");
    }
}
