//! Locale-aware number handling.
//!
//! Brazilian sources format numbers with a decimal comma and a `.`
//! thousands separator (`R$ 1.158,50`). International feeds use a
//! decimal point. Both end up as `f64` here.

/// Parse a numeric string that may use Brazilian formatting.
///
/// Strips a leading `R$`, whitespace (including non-breaking spaces) and a
/// trailing `%`. When a comma is present it is the decimal separator and
/// any `.` is a thousands separator. Returns `None` for empty or
/// non-finite results.
pub fn parse_decimal(text: &str) -> Option<f64> {
    let cleaned: String = text
        .trim()
        .trim_start_matches("R$")
        .trim_end_matches('%')
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();

    if cleaned.is_empty() {
        return None;
    }

    let normalized = if cleaned.contains(',') {
        cleaned.replace('.', "").replace(',', ".")
    } else {
        cleaned
    };

    normalized.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Round to a fixed number of decimal places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Percentage change between two observations.
///
/// A zero previous value yields 0% rather than infinity.
pub fn percent_change(current: f64, previous: f64) -> f64 {
    if previous == 0.0 {
        return 0.0;
    }
    (current - previous) / previous * 100.0
}

/// Format a change as `+1.25%` (decimal point, two places).
pub fn format_change(pct: f64) -> String {
    format!("{pct:+.2}%")
}

/// Format a change as `+2,3%` (decimal comma, one place), the way the
/// price board publishes it.
pub fn format_change_br(pct: f64) -> String {
    format!("{pct:+.1}%").replace('.', ",")
}
