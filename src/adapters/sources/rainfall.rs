//! INMET Rainfall - Daily Station Precipitation by State
//!
//! The daily endpoint returns every automatic station for a date. The
//! adapter keeps stations of the requested state (`UF`) with a numeric
//! precipitation reading (`CHUVA`) and averages them. INMET publishes
//! with a delay, so the requested date lags today by `lag_days`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Days, NaiveDate, Utc};
use serde_json::Value;
use tracing::{debug, instrument};

use super::simulator::Simulator;
use super::{fetch_body, numeric_value, parse_json};
use crate::config::{RainfallConfig, ValueRange};
use crate::domain::family::SourceFamily;
use crate::domain::locale::round_to;
use crate::domain::record::{Measurement, NormalizedRecord};
use crate::ports::source::{SoftFailure, SourceAdapter};
use crate::ports::transport::{HttpTransport, SourceRequest};

/// Average precipitation across a state's stations.
///
/// Stations without a numeric reading are skipped. No usable station
/// yields `0.0`.
pub fn average_rainfall(stations: &[Value], state: &str) -> f64 {
    let readings: Vec<f64> = stations
        .iter()
        .filter(|s| {
            s.get("UF")
                .and_then(Value::as_str)
                .is_some_and(|uf| uf.eq_ignore_ascii_case(state))
        })
        .filter_map(|s| s.get("CHUVA").and_then(numeric_value))
        .collect();

    if readings.is_empty() {
        return 0.0;
    }
    readings.iter().sum::<f64>() / readings.len() as f64
}

/// Rainfall adapter.
pub struct RainfallAdapter {
    transport: Arc<dyn HttpTransport>,
    config: RainfallConfig,
    simulator: Simulator,
}

impl RainfallAdapter {
    /// Create a new rainfall adapter.
    pub fn new(transport: Arc<dyn HttpTransport>, config: RainfallConfig, simulator: Simulator) -> Self {
        Self {
            transport,
            config,
            simulator,
        }
    }

    /// Request for the lagged reporting date relative to `today`.
    pub(crate) fn request_for(&self, today: NaiveDate) -> SourceRequest {
        let lag = u64::try_from(self.config.lag_days).unwrap_or(0);
        let date = today.checked_sub_days(Days::new(lag)).unwrap_or(today);
        SourceRequest::get(
            self.config
                .url_template
                .replace("{date}", &date.format("%Y-%m-%d").to_string()),
            Duration::from_secs(self.config.timeout_seconds),
        )
    }

    /// Simulated range for a state's climate profile.
    fn range_for(&self, state: &str) -> ValueRange {
        let listed = |states: &[String]| states.iter().any(|s| s.eq_ignore_ascii_case(state));
        if listed(&self.config.dry_states) {
            self.config.dry_range
        } else if listed(&self.config.wet_states) {
            self.config.wet_range
        } else {
            self.config.default_range
        }
    }
}

#[async_trait]
impl SourceAdapter for RainfallAdapter {
    fn family(&self) -> SourceFamily {
        SourceFamily::Rainfall
    }

    fn default_subject(&self) -> &str {
        &self.config.default_subject
    }

    #[instrument(skip(self), fields(family = "inmet"))]
    async fn observe(&self, subject: &str) -> Result<NormalizedRecord, SoftFailure> {
        let request = self.request_for(Utc::now().date_naive());
        debug!(url = %request.url, "Requesting station data");

        let body = fetch_body(self.transport.as_ref(), &request).await?;
        let Value::Array(stations) = parse_json(&body)? else {
            return Err(SoftFailure::drift("expected a station array"));
        };

        let avg = average_rainfall(&stations, subject);
        debug!(stations = stations.len(), avg, "Averaged station rainfall");

        Ok(NormalizedRecord::observed(
            SourceFamily::Rainfall,
            subject,
            Measurement::Rainfall {
                avg_rainfall_mm: round_to(avg, 1),
            },
        )?)
    }

    fn synthesize(&self, subject: &str) -> NormalizedRecord {
        let avg = self.simulator.sample(self.range_for(subject));
        NormalizedRecord::synthetic(
            SourceFamily::Rainfall,
            subject,
            Measurement::Rainfall {
                avg_rainfall_mm: round_to(avg, 1),
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::adapters::sources::testing::StubTransport;

    fn adapter(transport: Arc<dyn HttpTransport>) -> RainfallAdapter {
        RainfallAdapter::new(transport, RainfallConfig::default(), Simulator::seeded(9))
    }

    #[test]
    fn test_average_skips_unusable_readings() {
        let stations = vec![
            json!({"UF": "MT", "CHUVA": "12.4"}),
            json!({"UF": "MT", "CHUVA": 3.6}),
            json!({"UF": "MT", "CHUVA": null}),
            json!({"UF": "MT", "CHUVA": ""}),
            json!({"UF": "PR", "CHUVA": "90"}),
            json!({"DC_NOME": "no state"}),
        ];
        assert!((average_rainfall(&stations, "MT") - 8.0).abs() < 1e-9);
    }

    #[test]
    fn test_average_without_matches_is_zero() {
        let stations = vec![json!({"UF": "PR", "CHUVA": "90"})];
        assert_eq!(average_rainfall(&stations, "MT"), 0.0);
        assert_eq!(average_rainfall(&[], "MT"), 0.0);
    }

    #[test]
    fn test_request_uses_lagged_date() {
        let a = adapter(StubTransport::ok("[]"));
        let today = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(
            a.request_for(today).url,
            "https://apitempo.inmet.gov.br/estacao/diaria/2024-02-29/all"
        );
    }

    #[tokio::test]
    async fn test_zero_matching_stations_is_real_zero() {
        let outcome = adapter(StubTransport::ok(r#"[{"UF":"RS","CHUVA":"40"}]"#))
            .fetch(None)
            .await;
        assert!(!outcome.is_synthetic());
        assert_eq!(outcome.record().value(), 0.0);
        assert_eq!(outcome.record().source_tag().as_str(), "INMET");
        assert_eq!(outcome.record().subject(), "MT");
    }

    #[tokio::test]
    async fn test_observed_average_rounded() {
        let body = r#"[{"UF":"GO","CHUVA":"1.25"},{"UF":"GO","CHUVA":"2"}]"#;
        let outcome = adapter(StubTransport::ok(body)).fetch(Some("GO")).await;
        assert_eq!(outcome.record().value(), 1.6);
    }

    #[tokio::test]
    async fn test_object_body_is_schema_drift() {
        let outcome = adapter(StubTransport::ok(r#"{"message":"maintenance"}"#))
            .fetch(None)
            .await;
        assert!(matches!(outcome.cause(), Some(SoftFailure::SchemaDrift(_))));
        assert_eq!(outcome.record().source_tag().as_str(), "INMET_SIMULADO");
    }

    #[test]
    fn test_synthetic_follows_climate_profile() {
        let a = adapter(StubTransport::ok("[]"));
        for _ in 0..50 {
            assert!((0.0..=50.0).contains(&a.synthesize("MT").value()));
            assert!((50.0..=150.0).contains(&a.synthesize("rs").value()));
            assert!((20.0..=100.0).contains(&a.synthesize("BA").value()));
        }
    }

    #[tokio::test]
    async fn test_negative_average_is_data_quality() {
        let body = r#"[{"UF":"MT","CHUVA":"-9999"},{"UF":"MT","CHUVA":"4.0"}]"#;
        let outcome = adapter(StubTransport::ok(body)).fetch(None).await;
        assert!(matches!(outcome.cause(), Some(SoftFailure::DataQuality(_))));
        assert_eq!(outcome.record().source_tag().as_str(), "INMET_SIMULADO");
    }
}
