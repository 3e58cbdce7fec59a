//! HTTP Transport Adapter
//!
//! reqwest implementation of the `HttpTransport` port shared by all
//! source adapters.

pub mod client;

pub use client::{ReqwestTransport, SourceClientConfig};
