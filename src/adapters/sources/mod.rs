//! Source Adapters - One Fetch-or-Fallback Adapter per Source Family
//!
//! Implements the `SourceAdapter` port for:
//! - `PriceBoardAdapter`: CEPEA spot price board (HTML)
//! - `FuturesAdapter`: B3 futures via the Yahoo chart API (JSON)
//! - `CurrencyAdapter`: USD/BRL via the Yahoo chart API (JSON)
//! - `RainfallAdapter`: INMET daily station data (JSON)
//! - `ProductionAdapter`: CONAB crop-season estimates (JSON)
//!
//! Shared request/parse helpers live here. Every helper reports
//! problems as `SoftFailure`, never as a panic.

pub mod chart;
pub mod currency;
pub mod futures;
pub mod price_board;
pub mod production;
pub mod rainfall;
pub mod simulator;

use std::time::Duration;

use serde_json::Value;

use crate::domain::locale::parse_decimal;
use crate::ports::source::SoftFailure;
use crate::ports::transport::{HttpTransport, SourceRequest, TransportError};

pub use currency::CurrencyAdapter;
pub use futures::FuturesAdapter;
pub use price_board::PriceBoardAdapter;
pub use production::ProductionAdapter;
pub use rainfall::RainfallAdapter;
pub use simulator::Simulator;

/// Slack added to the adapter-side timer on top of the request timeout.
const TIMER_GRACE: Duration = Duration::from_millis(500);

/// Issue a request and return the body of a 200 response.
///
/// The whole call, retries included, is bounded by the request timeout
/// plus a small grace period.
pub(crate) async fn fetch_body(
    transport: &dyn HttpTransport,
    request: &SourceRequest,
) -> Result<String, SoftFailure> {
    let response = tokio::time::timeout(request.timeout + TIMER_GRACE, transport.get(request))
        .await
        .map_err(|_| TransportError::Timeout(request.timeout))??;

    if !response.is_ok() {
        return Err(SoftFailure::Status(response.status));
    }
    Ok(response.body)
}

/// Parse a body as JSON. Malformed JSON is a data-quality failure.
pub(crate) fn parse_json(body: &str) -> Result<Value, SoftFailure> {
    serde_json::from_str(body).map_err(|e| SoftFailure::quality(format!("malformed JSON: {e}")))
}

/// Read a JSON number or numeric string (decimal comma or point).
pub(crate) fn numeric_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => parse_decimal(s),
        _ => None,
    }
}
