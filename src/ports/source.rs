//! Source Adapter Port - Fetch-or-Fallback Contract
//!
//! Defines the trait every source family implements. Implementors
//! supply the real observation path and the synthetic generator; the
//! provided `fetch` method joins them so that no failure ever leaves
//! the adapter. Callers tell real from synthetic data only through the
//! record's source tag.

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::domain::family::SourceFamily;
use crate::domain::record::{NormalizedRecord, RecordError};

use super::transport::TransportError;

/// Coarse classification of a soft failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
  /// Unreachable source, timeout, or non-success status.
  Transport,
  /// Expected structural element absent from a successful response.
  SchemaDrift,
  /// Element present but its value unusable.
  DataQuality,
}

impl FailureKind {
  /// Stable label for logs and metrics.
  pub const fn as_str(self) -> &'static str {
    match self {
      Self::Transport => "transport",
      Self::SchemaDrift => "schema_drift",
      Self::DataQuality => "data_quality",
    }
  }
}

/// Any adapter-level fault absorbed by the fallback path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SoftFailure {
  /// No response received.
  #[error(transparent)]
  Transport(#[from] TransportError),
  /// Response received with a non-success status.
  #[error("unexpected status {0}")]
  Status(u16),
  /// The source changed shape.
  #[error("schema drift: {0}")]
  SchemaDrift(String),
  /// The source returned unusable values.
  #[error("data quality: {0}")]
  DataQuality(String),
}

impl SoftFailure {
  /// Classify this failure.
  pub const fn kind(&self) -> FailureKind {
    match self {
      Self::Transport(_) | Self::Status(_) => FailureKind::Transport,
      Self::SchemaDrift(_) => FailureKind::SchemaDrift,
      Self::DataQuality(_) => FailureKind::DataQuality,
    }
  }

  /// Shorthand for a schema-drift failure.
  pub fn drift(reason: impl Into<String>) -> Self {
    Self::SchemaDrift(reason.into())
  }

  /// Shorthand for a data-quality failure.
  pub fn quality(reason: impl Into<String>) -> Self {
    Self::DataQuality(reason.into())
  }
}

impl From<RecordError> for SoftFailure {
  fn from(err: RecordError) -> Self {
    Self::DataQuality(err.to_string())
  }
}

/// Result of one adapter fetch. Both variants carry a complete record.
#[derive(Debug, Clone)]
pub enum FetchOutcome {
  /// Parsed from the real source.
  Observed(NormalizedRecord),
  /// Synthesized after a soft failure.
  Synthetic {
    /// The substitute record.
    record: NormalizedRecord,
    /// What went wrong.
    cause: SoftFailure,
  },
}

impl FetchOutcome {
  /// The record, real or synthetic.
  pub const fn record(&self) -> &NormalizedRecord {
    match self {
      Self::Observed(record) | Self::Synthetic { record, .. } => record,
    }
  }

  /// Consume the outcome, keeping the record.
  pub fn into_record(self) -> NormalizedRecord {
    match self {
      Self::Observed(record) | Self::Synthetic { record, .. } => record,
    }
  }

  /// Whether the fallback path was taken.
  pub const fn is_synthetic(&self) -> bool {
    matches!(self, Self::Synthetic { .. })
  }

  /// The soft failure, if any.
  pub const fn cause(&self) -> Option<&SoftFailure> {
    match self {
      Self::Observed(_) => None,
      Self::Synthetic { cause, .. } => Some(cause),
    }
  }
}

/// Trait for source-family adapters.
///
/// Implementors provide `observe` (real path, may fail softly) and
/// `synthesize` (fallback, infallible). Callers use `fetch`, which
/// never fails.
#[async_trait]
pub trait SourceAdapter: Send + Sync + 'static {
  /// Family served by this adapter.
  fn family(&self) -> SourceFamily;

  /// Subject used when the caller supplies none.
  fn default_subject(&self) -> &str;

  /// Fetch and parse the real source.
  ///
  /// # Errors
  /// Any transport, schema-drift or data-quality fault.
  async fn observe(&self, subject: &str) -> Result<NormalizedRecord, SoftFailure>;

  /// Build a plausible substitute for `subject`.
  fn synthesize(&self, subject: &str) -> NormalizedRecord;

  /// Fetch a record, degrading to a synthetic one on any soft failure.
  async fn fetch(&self, subject: Option<&str>) -> FetchOutcome {
    let family = self.family();
    let subject = subject.unwrap_or_else(|| self.default_subject());

    match self.observe(subject).await {
      Ok(record) => {
        debug!(%family, subject, value = record.value(), "Observed record");
        FetchOutcome::Observed(record)
      }
      Err(cause) => {
        match cause.kind() {
          FailureKind::SchemaDrift => error!(
            %family,
            subject,
            error = %cause,
            "Source structure changed, parser needs maintenance; using simulated data"
          ),
          kind => warn!(
            %family,
            subject,
            kind = kind.as_str(),
            error = %cause,
            "Source unavailable; using simulated data"
          ),
        }
        FetchOutcome::Synthetic {
          record: self.synthesize(subject),
          cause,
        }
      }
    }
  }
}
