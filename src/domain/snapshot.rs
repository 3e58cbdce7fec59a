//! Collection snapshots.
//!
//! A [`Snapshot`] holds exactly one record per source family. The shape
//! is fixed by the type: a family can be synthetic but never absent.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::family::SourceFamily;
use super::record::NormalizedRecord;

/// The complete result of one collection cycle.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    /// Correlation ID for logs and the summary artifact.
    cycle_id: Uuid,
    /// When the cycle finished.
    collected_at: DateTime<Utc>,
    /// Wall-clock duration of the cycle.
    #[serde(serialize_with = "serialize_secs")]
    duration: Duration,
    #[serde(rename = "cepea")]
    price_board: NormalizedRecord,
    #[serde(rename = "b3")]
    futures: NormalizedRecord,
    #[serde(rename = "usd")]
    currency: NormalizedRecord,
    #[serde(rename = "inmet")]
    rainfall: NormalizedRecord,
    #[serde(rename = "conab")]
    production: NormalizedRecord,
}

/// The five records of a cycle, one per family.
#[derive(Debug, Clone)]
pub struct SnapshotRecords {
    /// Spot price board record.
    pub price_board: NormalizedRecord,
    /// Futures record.
    pub futures: NormalizedRecord,
    /// Exchange rate record.
    pub currency: NormalizedRecord,
    /// Rainfall record.
    pub rainfall: NormalizedRecord,
    /// Production estimate record.
    pub production: NormalizedRecord,
}

impl Snapshot {
    /// Assemble a snapshot from the cycle's records.
    pub fn new(cycle_id: Uuid, duration: Duration, records: SnapshotRecords) -> Self {
        Self {
            cycle_id,
            collected_at: Utc::now(),
            duration,
            price_board: records.price_board,
            futures: records.futures,
            currency: records.currency,
            rainfall: records.rainfall,
            production: records.production,
        }
    }

    /// Cycle correlation ID.
    pub const fn cycle_id(&self) -> Uuid {
        self.cycle_id
    }

    /// Cycle completion time.
    pub const fn collected_at(&self) -> DateTime<Utc> {
        self.collected_at
    }

    /// Cycle duration.
    pub const fn duration(&self) -> Duration {
        self.duration
    }

    /// Record for a family. Always present.
    pub const fn get(&self, family: SourceFamily) -> &NormalizedRecord {
        match family {
            SourceFamily::PriceBoard => &self.price_board,
            SourceFamily::Futures => &self.futures,
            SourceFamily::Currency => &self.currency,
            SourceFamily::Rainfall => &self.rainfall,
            SourceFamily::Production => &self.production,
        }
    }

    /// Records in collection order.
    pub fn iter(&self) -> impl Iterator<Item = (SourceFamily, &NormalizedRecord)> {
        SourceFamily::ALL.into_iter().map(|f| (f, self.get(f)))
    }

    /// Snapshot keys in collection order.
    pub fn keys(&self) -> [&'static str; 5] {
        SourceFamily::ALL.map(SourceFamily::key)
    }

    /// Number of synthetic records in this snapshot.
    pub fn synthetic_count(&self) -> usize {
        self.iter().filter(|(_, r)| r.is_synthetic()).count()
    }

    /// Whether every record came from its real source.
    pub fn is_fully_observed(&self) -> bool {
        self.synthetic_count() == 0
    }
}

fn serialize_secs<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64())
}
