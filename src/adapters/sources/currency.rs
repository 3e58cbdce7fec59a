//! Currency Rates - BRL Exchange Rates via the Yahoo Chart API

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, instrument};

use super::chart::{parse_chart, resolve};
use super::fetch_body;
use super::simulator::Simulator;
use crate::config::CurrencyConfig;
use crate::domain::family::SourceFamily;
use crate::domain::locale::{format_change, round_to};
use crate::domain::record::{Measurement, NormalizedRecord};
use crate::ports::source::{SoftFailure, SourceAdapter};
use crate::ports::transport::{HttpTransport, SourceRequest};

/// Exchange rate adapter (BRL per unit of foreign currency).
pub struct CurrencyAdapter {
    transport: Arc<dyn HttpTransport>,
    config: CurrencyConfig,
    simulator: Simulator,
}

impl CurrencyAdapter {
    /// Create a new currency adapter.
    pub fn new(transport: Arc<dyn HttpTransport>, config: CurrencyConfig, simulator: Simulator) -> Self {
        Self {
            transport,
            config,
            simulator,
        }
    }
}

#[async_trait]
impl SourceAdapter for CurrencyAdapter {
    fn family(&self) -> SourceFamily {
        SourceFamily::Currency
    }

    fn default_subject(&self) -> &str {
        &self.config.default_subject
    }

    #[instrument(skip(self), fields(family = "usd"))]
    async fn observe(&self, subject: &str) -> Result<NormalizedRecord, SoftFailure> {
        let instrument = resolve(&self.config.instruments, subject)?;
        let request = SourceRequest::get(
            self.config.url_template.replace("{symbol}", &instrument.symbol),
            Duration::from_secs(self.config.timeout_seconds),
        );
        debug!(url = %request.url, "Requesting exchange rate");

        let body = fetch_body(self.transport.as_ref(), &request).await?;
        let quote = parse_chart(&body)?;

        Ok(NormalizedRecord::observed(
            SourceFamily::Currency,
            instrument.subject.as_str(),
            Measurement::ExchangeRate {
                rate: round_to(quote.last, 4),
                change: format_change(quote.change_pct),
            },
        )?)
    }

    fn synthesize(&self, subject: &str) -> NormalizedRecord {
        NormalizedRecord::synthetic(
            SourceFamily::Currency,
            subject,
            Measurement::ExchangeRate {
                rate: round_to(self.simulator.sample(self.config.simulated_rate), 4),
                change: format_change(self.simulator.sample(self.config.simulated_change_pct)),
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sources::testing::StubTransport;
    use crate::ports::transport::TransportError;

    fn adapter(transport: Arc<dyn HttpTransport>) -> CurrencyAdapter {
        CurrencyAdapter::new(transport, CurrencyConfig::default(), Simulator::seeded(5))
    }

    #[tokio::test]
    async fn test_observed_rate_rounded_to_four_places() {
        let body = r#"{"chart":{"result":[{"indicators":{"quote":[{"close":[5.0,5.123456]}]}}],"error":null}}"#;
        let transport = StubTransport::ok(body);
        let outcome = adapter(transport.clone()).fetch(None).await;

        let record = outcome.record();
        assert_eq!(record.subject(), "USD");
        assert_eq!(record.value(), 5.1235);
        assert_eq!(record.change(), Some("+2.47%"));
        assert_eq!(record.source_tag().as_str(), "BACEN/YAHOO");
        assert!(transport.last_request().url.contains("/chart/BRL=X"));
    }

    #[tokio::test]
    async fn test_timeout_falls_back_to_range() {
        let transport = StubTransport::failing(TransportError::Timeout(Duration::from_secs(15)));
        let outcome = adapter(transport).fetch(None).await;

        assert!(outcome.is_synthetic());
        let record = outcome.record();
        assert_eq!(record.source_tag().as_str(), "USD_SIMULADO");
        assert!((4.8..=5.3).contains(&record.value()));
    }

    #[tokio::test]
    async fn test_second_instrument() {
        let body = r#"{"chart":{"result":[{"indicators":{"quote":[{"close":[6.1]}]}}]}}"#;
        let transport = StubTransport::ok(body);
        let outcome = adapter(transport.clone()).fetch(Some("eur")).await;
        assert_eq!(outcome.record().subject(), "EUR");
        assert_eq!(outcome.record().change(), Some("+0.00%"));
        assert!(transport.last_request().url.contains("/chart/EURBRL=X"));
    }

    #[tokio::test]
    async fn test_negative_rate_is_data_quality() {
        let body = r#"{"chart":{"result":[{"indicators":{"quote":[{"close":[5.0,-5.1]}]}}],"error":null}}"#;
        let outcome = adapter(StubTransport::ok(body)).fetch(None).await;
        assert!(matches!(outcome.cause(), Some(SoftFailure::DataQuality(_))));
        assert_eq!(outcome.record().source_tag().as_str(), "USD_SIMULADO");
    }
}
