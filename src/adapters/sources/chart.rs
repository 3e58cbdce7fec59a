//! Yahoo chart API response parsing.
//!
//! Futures and currency quotes come from the same chart endpoint. The
//! latest non-null close is the current value; the change is measured
//! against the close before it.

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::parse_json;
use crate::config::Instrument;
use crate::domain::locale::percent_change;
use crate::ports::source::SoftFailure;

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteSeries>,
}

#[derive(Debug, Deserialize)]
struct QuoteSeries {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

/// Latest close and its day-over-day change.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartQuote {
    /// Most recent non-null close.
    pub last: f64,
    /// Percent change from the previous non-null close.
    pub change_pct: f64,
}

/// Parse a chart API body into a quote.
///
/// # Errors
/// Data quality for malformed JSON, a reported API error or an empty
/// close series; schema drift when the expected nesting is absent.
pub fn parse_chart(body: &str) -> Result<ChartQuote, SoftFailure> {
    let value = parse_json(body)?;
    let envelope: ChartEnvelope = serde_json::from_value(value)
        .map_err(|e| SoftFailure::drift(format!("unexpected chart layout: {e}")))?;

    if let Some(error) = envelope.chart.error.filter(|e| !e.is_null()) {
        return Err(SoftFailure::quality(format!("chart API error: {error}")));
    }

    let result = envelope
        .chart
        .result
        .and_then(|r| r.into_iter().next())
        .ok_or_else(|| SoftFailure::drift("chart.result is empty"))?;
    let series = result
        .indicators
        .quote
        .into_iter()
        .next()
        .ok_or_else(|| SoftFailure::drift("indicators.quote is empty"))?;

    let closes: Vec<f64> = series
        .close
        .into_iter()
        .flatten()
        .filter(|c| c.is_finite())
        .collect();

    let Some(&last) = closes.last() else {
        return Err(SoftFailure::quality("no close values in window"));
    };

    Ok(ChartQuote {
        last,
        change_pct: daily_change(&closes),
    })
}

fn daily_change(closes: &[f64]) -> f64 {
    match closes {
        [.., previous, last] => percent_change(*last, *previous),
        _ => {
            debug!("Single close in window, reporting zero change");
            0.0
        }
    }
}

/// Find the instrument for a subject (case-insensitive).
///
/// # Errors
/// Data quality when no instrument is configured for the subject.
pub fn resolve<'a>(instruments: &'a [Instrument], subject: &str) -> Result<&'a Instrument, SoftFailure> {
    instruments
        .iter()
        .find(|i| i.subject.eq_ignore_ascii_case(subject))
        .ok_or_else(|| SoftFailure::quality(format!("no instrument configured for {subject:?}")))
}
