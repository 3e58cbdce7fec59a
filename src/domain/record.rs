//! Normalized indicator records.
//!
//! Every source adapter produces a [`NormalizedRecord`], either parsed
//! from the real source or synthesized as a fallback. The
//! [`SourceTag`] is the only place that distinguishes the two.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use thiserror::Error;

use super::family::SourceFamily;

/// Reserved suffix marking a synthetic (simulated) record.
pub const SYNTHETIC_SUFFIX: &str = "_SIMULADO";

/// Provenance of a record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct SourceTag(String);

impl SourceTag {
    /// Tag for data observed at the family's real source.
    pub fn real(family: SourceFamily) -> Self {
        Self(family.real_tag().to_string())
    }

    /// Tag for a locally synthesized substitute.
    pub fn synthetic(family: SourceFamily) -> Self {
        Self(format!("{}{SYNTHETIC_SUFFIX}", family.synthetic_prefix()))
    }

    /// Whether the tag carries the synthetic suffix.
    pub fn is_synthetic(&self) -> bool {
        self.0.ends_with(SYNTHETIC_SUFFIX)
    }

    /// The raw tag string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SourceTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Family-specific measured values.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Measurement {
    /// Spot or futures price with its period change.
    Price {
        /// Price in the source's currency.
        price: f64,
        /// Signed percentage change, as published.
        change: String,
    },
    /// Exchange rate with its period change.
    ExchangeRate {
        /// BRL per unit of the foreign currency.
        rate: f64,
        /// Signed percentage change.
        change: String,
    },
    /// Average daily rainfall across stations of a state.
    Rainfall {
        /// Millimetres.
        avg_rainfall_mm: f64,
    },
    /// Crop production estimate.
    Production {
        /// Million metric tons.
        production_million_tons: f64,
        /// Geographic scope of the estimate.
        region: String,
    },
}

impl Measurement {
    /// The headline numeric value.
    pub const fn value(&self) -> f64 {
        match self {
            Self::Price { price, .. } => *price,
            Self::ExchangeRate { rate, .. } => *rate,
            Self::Rainfall { avg_rainfall_mm } => *avg_rainfall_mm,
            Self::Production {
                production_million_tons,
                ..
            } => *production_million_tons,
        }
    }

    /// Period change, for price and currency measurements.
    pub fn change(&self) -> Option<&str> {
        match self {
            Self::Price { change, .. } | Self::ExchangeRate { change, .. } => Some(change),
            Self::Rainfall { .. } | Self::Production { .. } => None,
        }
    }

    /// Whether this measurement shape belongs to `family`.
    pub const fn matches(&self, family: SourceFamily) -> bool {
        matches!(
            (family, self),
            (SourceFamily::PriceBoard | SourceFamily::Futures, Self::Price { .. })
                | (SourceFamily::Currency, Self::ExchangeRate { .. })
                | (SourceFamily::Rainfall, Self::Rainfall { .. })
                | (SourceFamily::Production, Self::Production { .. })
        )
    }

    /// Whether the headline value is plausible for its kind: prices and
    /// rates are positive, rainfall and production are non-negative.
    pub fn in_range(&self) -> bool {
        match self {
            Self::Price { price: v, .. } | Self::ExchangeRate { rate: v, .. } => *v > 0.0,
            Self::Rainfall { avg_rainfall_mm: v }
            | Self::Production {
                production_million_tons: v,
                ..
            } => *v >= 0.0,
        }
    }

    /// Replace any non-finite value with zero.
    fn sanitized(mut self) -> Self {
        let slot = match &mut self {
            Self::Price { price, .. } => price,
            Self::ExchangeRate { rate, .. } => rate,
            Self::Rainfall { avg_rainfall_mm } => avg_rainfall_mm,
            Self::Production {
                production_million_tons,
                ..
            } => production_million_tons,
        };
        if !slot.is_finite() {
            *slot = 0.0;
        }
        self
    }

    fn field_listing(&self) -> Vec<(&'static str, String)> {
        match self {
            Self::Price { price, change } => {
                vec![("price", price.to_string()), ("change", change.clone())]
            }
            Self::ExchangeRate { rate, change } => {
                vec![("rate", rate.to_string()), ("change", change.clone())]
            }
            Self::Rainfall { avg_rainfall_mm } => {
                vec![("avg_rainfall_mm", avg_rainfall_mm.to_string())]
            }
            Self::Production {
                production_million_tons,
                region,
            } => vec![
                (
                    "production_million_tons",
                    production_million_tons.to_string(),
                ),
                ("region", region.clone()),
            ],
        }
    }
}

/// Reasons a record could not be built from observed data.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RecordError {
    /// The subject identifier was blank.
    #[error("empty subject")]
    EmptySubject,
    /// A numeric field was NaN or infinite.
    #[error("non-finite value {value} for {subject}")]
    NonFinite {
        /// Subject being recorded.
        subject: String,
        /// Offending value.
        value: f64,
    },
    /// A finite value outside the plausible range for its kind.
    #[error("out-of-range value {value} for {subject}")]
    OutOfRange {
        /// Subject being recorded.
        subject: String,
        /// Offending value.
        value: f64,
    },
    /// The measurement shape does not belong to the family.
    #[error("measurement shape does not match family {family}")]
    FamilyMismatch {
        /// Family the record was built for.
        family: SourceFamily,
    },
}

/// One normalized indicator, real or synthetic.
///
/// Fields are private: a record is complete when constructed and is
/// never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedRecord {
    family: SourceFamily,
    subject: String,
    #[serde(flatten)]
    measurement: Measurement,
    source_tag: SourceTag,
    observed_at: DateTime<Utc>,
}

impl NormalizedRecord {
    /// Build a record from data observed at the real source.
    ///
    /// # Errors
    /// Fails when the subject is blank, the value is not finite or out of
    /// range for its kind, or the measurement shape belongs to another
    /// family.
    pub fn observed(
        family: SourceFamily,
        subject: impl Into<String>,
        measurement: Measurement,
    ) -> Result<Self, RecordError> {
        let subject = subject.into();
        if subject.trim().is_empty() {
            return Err(RecordError::EmptySubject);
        }
        if !measurement.matches(family) {
            return Err(RecordError::FamilyMismatch { family });
        }
        let value = measurement.value();
        if !value.is_finite() {
            return Err(RecordError::NonFinite { subject, value });
        }
        if !measurement.in_range() {
            return Err(RecordError::OutOfRange { subject, value });
        }

        Ok(Self {
            family,
            subject,
            measurement,
            source_tag: SourceTag::real(family),
            observed_at: Utc::now(),
        })
    }

    /// Build a synthetic substitute record.
    ///
    /// Infallible: non-finite values are zeroed so the record stays
    /// complete.
    pub fn synthetic(
        family: SourceFamily,
        subject: impl Into<String>,
        measurement: Measurement,
    ) -> Self {
        debug_assert!(measurement.matches(family));
        Self {
            family,
            subject: subject.into(),
            measurement: measurement.sanitized(),
            source_tag: SourceTag::synthetic(family),
            observed_at: Utc::now(),
        }
    }

    /// Source family.
    pub const fn family(&self) -> SourceFamily {
        self.family
    }

    /// What was measured (commodity, currency code, state code).
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Measured values.
    pub const fn measurement(&self) -> &Measurement {
        &self.measurement
    }

    /// Headline numeric value.
    pub const fn value(&self) -> f64 {
        self.measurement.value()
    }

    /// Period change, if the family carries one.
    pub fn change(&self) -> Option<&str> {
        self.measurement.change()
    }

    /// Provenance tag.
    pub const fn source_tag(&self) -> &SourceTag {
        &self.source_tag
    }

    /// Whether this record was synthesized locally.
    pub fn is_synthetic(&self) -> bool {
        self.source_tag.is_synthetic()
    }

    /// Record construction time.
    pub const fn observed_at(&self) -> DateTime<Utc> {
        self.observed_at
    }

    /// Label of the subject field for this family.
    pub const fn subject_label(&self) -> &'static str {
        match self.family {
            SourceFamily::PriceBoard | SourceFamily::Futures | SourceFamily::Production => {
                "commodity"
            }
            SourceFamily::Currency => "currency",
            SourceFamily::Rainfall => "state",
        }
    }

    /// Ordered `field: value` listing for human-readable reports.
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![(self.subject_label(), self.subject.clone())];
        fields.extend(self.measurement.field_listing());
        fields.push(("source_tag", self.source_tag.to_string()));
        fields.push((
            "observed_at",
            self.observed_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        ));
        fields
    }
}
