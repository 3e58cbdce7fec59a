//! Ports Layer - Hexagonal Architecture Boundaries
//!
//! Defines the interfaces (traits) that the use cases require from the
//! outside world. Adapters implement these traits.
//!
//! Port categories:
//! - `SourceAdapter`: Fetch-or-fallback contract for each source family
//! - `HttpTransport`: Outbound HTTP used by the source adapters

pub mod source;
pub mod transport;
