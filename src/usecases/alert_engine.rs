//! Alert Engine - Threshold Alerts over Collection Snapshots
//!
//! Applies the domain alert rules and the synthetic-majority policy:
//! when most of a snapshot is simulated, alerts would describe invented
//! data, so none are raised.

use serde::Serialize;
use tracing::{info, warn};

use crate::config::AlertConfig;
use crate::domain::alert::{Alert, AlertRules, PriceBaseline};
use crate::domain::snapshot::Snapshot;

/// Synthetic records at or above which alerts are suppressed.
pub const SYNTHETIC_MAJORITY: usize = 3;

/// Result of evaluating one snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertEvaluation {
  /// Triggered alerts (empty when suppressed).
  pub alerts: Vec<Alert>,
  /// Whether the synthetic-majority policy withheld alerts.
  pub suppressed: bool,
  /// Synthetic records in the evaluated snapshot.
  pub synthetic_count: usize,
}

/// Evaluates alert rules against snapshots.
#[derive(Debug, Clone)]
pub struct AlertEngine {
  rules: AlertRules,
  suppress_on_synthetic_majority: bool,
}

impl AlertEngine {
  /// Create an engine from alert settings.
  pub fn new(config: &AlertConfig) -> Self {
    Self {
      rules: AlertRules {
        price_drop_fraction: config.price_drop_fraction,
        price_high_factor: config.price_high_factor,
        drought_threshold_mm: config.drought_threshold_mm,
      },
      suppress_on_synthetic_majority: config.suppress_on_synthetic_majority,
    }
  }

  /// Evaluate a snapshot against a caller-supplied price baseline.
  pub fn evaluate(&self, snapshot: &Snapshot, baseline: &PriceBaseline) -> AlertEvaluation {
    let synthetic_count = snapshot.synthetic_count();

    if self.suppress_on_synthetic_majority && synthetic_count >= SYNTHETIC_MAJORITY {
      warn!(
        cycle_id = %snapshot.cycle_id(),
        synthetic = synthetic_count,
        "Most records are simulated, alerts suppressed"
      );
      return AlertEvaluation {
        alerts: Vec::new(),
        suppressed: true,
        synthetic_count,
      };
    }

    let alerts = self.rules.evaluate(snapshot, baseline);
    for alert in &alerts {
      info!(
        kind = alert.kind.as_str(),
        severity = ?alert.severity,
        message = %alert.message,
        "Alert triggered"
      );
    }

    AlertEvaluation {
      alerts,
      suppressed: false,
      synthetic_count,
    }
  }
}

impl Default for AlertEngine {
  fn default() -> Self {
    Self::new(&AlertConfig::default())
  }
}
