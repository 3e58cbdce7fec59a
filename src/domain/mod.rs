//! Domain layer - Indicator records, snapshots and alert rules.
//!
//! Pure types with no I/O (hexagonal architecture inner ring).
//! Adapters produce these; use cases and downstream consumers read them.

pub mod alert;
pub mod family;
pub mod locale;
pub mod record;
pub mod snapshot;

// Re-export core types for convenience
pub use alert::{Alert, AlertKind, AlertRules, PriceBaseline, Severity};
pub use family::SourceFamily;
pub use record::{Measurement, NormalizedRecord, RecordError, SourceTag, SYNTHETIC_SUFFIX};
pub use snapshot::{Snapshot, SnapshotRecords};
