//! Threshold alert types.
//!
//! Pure alert rules evaluated over a snapshot. Delivery (chat, e-mail)
//! belongs to downstream consumers.

use serde::{Deserialize, Serialize};

use super::family::SourceFamily;
use super::snapshot::Snapshot;

/// Kind of condition detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertKind {
    /// Spot price fell sharply against the last recorded price.
    PriceDrop,
    /// Spot price well above its historical average.
    PriceHigh,
    /// Rainfall below the drought threshold.
    DroughtRisk,
}

impl AlertKind {
    /// Stable label for logs and metrics.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PriceDrop => "PRICE_DROP",
            Self::PriceHigh => "PRICE_HIGH",
            Self::DroughtRisk => "DROUGHT_RISK",
        }
    }
}

/// Alert severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    /// Worth watching; no immediate action.
    Medium,
    /// Needs attention this cycle.
    High,
}

/// A triggered alert.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
    /// Condition detected.
    pub kind: AlertKind,
    /// Severity.
    pub severity: Severity,
    /// Short headline.
    pub message: String,
    /// Supporting context for the reader.
    pub context: String,
}

/// Reference prices supplied by the caller (usually from storage).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PriceBaseline {
    /// Last persisted spot price.
    pub last_price: Option<f64>,
    /// Rolling historical average spot price.
    pub historical_avg: Option<f64>,
}

/// Rule thresholds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlertRules {
    /// Relative drop that triggers `PriceDrop` (0.05 = 5%).
    pub price_drop_fraction: f64,
    /// Multiple of the historical average that triggers `PriceHigh`.
    pub price_high_factor: f64,
    /// Rainfall (mm) below which `DroughtRisk` fires.
    pub drought_threshold_mm: f64,
}

impl Default for AlertRules {
    fn default() -> Self {
        Self {
            price_drop_fraction: 0.05,
            price_high_factor: 1.1,
            drought_threshold_mm: 20.0,
        }
    }
}

impl AlertRules {
    /// Evaluate all rules against a snapshot.
    ///
    /// Rules needing a baseline value are skipped when it is missing.
    pub fn evaluate(&self, snapshot: &Snapshot, baseline: &PriceBaseline) -> Vec<Alert> {
        let mut alerts = Vec::new();
        let spot = snapshot.get(SourceFamily::PriceBoard);
        let current = spot.value();
        let usd = snapshot.get(SourceFamily::Currency).value();

        if let Some(last) = baseline.last_price.filter(|p| *p > 0.0) {
            let drop = (last - current) / last;
            if drop > self.price_drop_fraction {
                alerts.push(Alert {
                    kind: AlertKind::PriceDrop,
                    severity: Severity::High,
                    message: format!(
                        "{:.1}% drop in {} price",
                        drop * 100.0,
                        spot.subject()
                    ),
                    context: format!(
                        "Current price: R$ {current:.2} | USD: R$ {usd:.4}. Potential impact on exports"
                    ),
                });
            }
        }

        if let Some(avg) = baseline.historical_avg {
            if current > avg * self.price_high_factor {
                alerts.push(Alert {
                    kind: AlertKind::PriceHigh,
                    severity: Severity::Medium,
                    message: format!(
                        "{} price {:.0}% above historical average ({avg:.2})",
                        spot.subject(),
                        (self.price_high_factor - 1.0) * 100.0
                    ),
                    context: "Opportunity for strategic sales in domestic and export markets"
                        .to_string(),
                });
            }
        }

        let rain = snapshot.get(SourceFamily::Rainfall);
        if rain.value() < self.drought_threshold_mm {
            alerts.push(Alert {
                kind: AlertKind::DroughtRisk,
                severity: Severity::High,
                message: format!(
                    "Low rainfall in {} (<{:.0}mm)",
                    rain.subject(),
                    self.drought_threshold_mm
                ),
                context: "Risk of reduced future production; expect price volatility".to_string(),
            });
        }

        alerts
    }
}
