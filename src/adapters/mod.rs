//! Adapters Layer - Hexagonal Architecture Outer Ring
//!
//! Implements the port traits defined in `crate::ports` with concrete
//! external dependencies (HTTP client, public data sources, file I/O).
//! Each sub-module groups adapters by infrastructure concern.
//!
//! Adapter categories:
//! - `http`: reqwest transport with header rotation and retries
//! - `sources`: one fetch-or-fallback adapter per source family
//! - `metrics`: Prometheus metrics export and liveness probe
//! - `persistence`: atomic summary file output

pub mod http;
pub mod metrics;
pub mod persistence;
pub mod sources;
