//! Persistence Adapters - Summary File Output
//!
//! Writes the plain-text collection summary with atomic writes
//! (tmp file, then rename). No database dependency.

pub mod summary;

pub use summary::{SummaryWriter, render_summary};
