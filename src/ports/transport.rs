//! HTTP Transport Port - Outbound Request Interface
//!
//! Defines the trait adapters use to reach their external source.
//! The transport reports whatever status the server returned; deciding
//! whether a status is acceptable is the source adapter's job.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// A single outbound GET request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRequest {
  /// Fully substituted URL.
  pub url: String,
  /// Extra headers beyond the transport's defaults.
  pub headers: Vec<(String, String)>,
  /// Bound on the whole request.
  pub timeout: Duration,
}

impl SourceRequest {
  /// Create a request with no extra headers.
  pub fn get(url: impl Into<String>, timeout: Duration) -> Self {
    Self {
      url: url.into(),
      headers: Vec::new(),
      timeout,
    }
  }

  /// Add a header.
  #[must_use]
  pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
    self.headers.push((name.into(), value.into()));
    self
  }
}

/// Raw response handed back to the adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
  /// HTTP status code.
  pub status: u16,
  /// Body decoded as text.
  pub body: String,
}

impl RawResponse {
  /// Convenience constructor.
  pub fn new(status: u16, body: impl Into<String>) -> Self {
    Self {
      status,
      body: body.into(),
    }
  }

  /// Whether the status is 200 OK.
  pub const fn is_ok(&self) -> bool {
    self.status == 200
  }
}

/// Failures that prevented any usable response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
  /// The request did not complete within its timeout.
  #[error("request timed out after {0:?}")]
  Timeout(Duration),
  /// Connection could not be established.
  #[error("connection failed: {0}")]
  Connect(String),
  /// Any other request or body-decoding failure.
  #[error("request failed: {0}")]
  Request(String),
}

/// Trait for outbound HTTP providers.
///
/// Implementors must honor `request.timeout`. Adapters also guard each
/// call with their own timer, so a transport that hangs still resolves.
#[async_trait]
pub trait HttpTransport: Send + Sync + 'static {
  /// Issue a GET request.
  ///
  /// # Errors
  /// Returns `TransportError` when no response was received.
  async fn get(&self, request: &SourceRequest) -> Result<RawResponse, TransportError>;
}
