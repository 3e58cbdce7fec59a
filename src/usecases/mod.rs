//! Use Cases Layer - Application Business Logic
//!
//! Orchestrates source adapters and domain rules to implement the
//! collector's workflows.
//!
//! Use cases:
//! - `Collector`: One snapshot per cycle from all five source families
//! - `AlertEngine`: Threshold alerts with the synthetic-majority policy

pub mod alert_engine;
pub mod collector;

pub use alert_engine::{AlertEngine, AlertEvaluation};
pub use collector::{AdapterSet, Collector};
