//! B3 Futures - Commodity Futures via the Yahoo Chart API
//!
//! Subjects (`soja_futuro`, `milho_futuro`, ...) map to chart symbols
//! through the configured instrument list.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, instrument};

use super::chart::{parse_chart, resolve};
use super::fetch_body;
use super::simulator::Simulator;
use crate::config::FuturesConfig;
use crate::domain::family::SourceFamily;
use crate::domain::locale::{format_change, round_to};
use crate::domain::record::{Measurement, NormalizedRecord};
use crate::ports::source::{SoftFailure, SourceAdapter};
use crate::ports::transport::{HttpTransport, SourceRequest};

/// Futures price adapter.
pub struct FuturesAdapter {
    transport: Arc<dyn HttpTransport>,
    config: FuturesConfig,
    simulator: Simulator,
}

impl FuturesAdapter {
    /// Create a new futures adapter.
    pub fn new(transport: Arc<dyn HttpTransport>, config: FuturesConfig, simulator: Simulator) -> Self {
        Self {
            transport,
            config,
            simulator,
        }
    }
}

#[async_trait]
impl SourceAdapter for FuturesAdapter {
    fn family(&self) -> SourceFamily {
        SourceFamily::Futures
    }

    fn default_subject(&self) -> &str {
        &self.config.default_subject
    }

    #[instrument(skip(self), fields(family = "b3"))]
    async fn observe(&self, subject: &str) -> Result<NormalizedRecord, SoftFailure> {
        let instrument = resolve(&self.config.instruments, subject)?;
        let request = SourceRequest::get(
            self.config.url_template.replace("{symbol}", &instrument.symbol),
            Duration::from_secs(self.config.timeout_seconds),
        );
        debug!(url = %request.url, symbol = %instrument.symbol, "Requesting futures chart");

        let body = fetch_body(self.transport.as_ref(), &request).await?;
        let quote = parse_chart(&body)?;

        Ok(NormalizedRecord::observed(
            SourceFamily::Futures,
            instrument.subject.as_str(),
            Measurement::Price {
                price: round_to(quote.last, 2),
                change: format_change(quote.change_pct),
            },
        )?)
    }

    fn synthesize(&self, subject: &str) -> NormalizedRecord {
        NormalizedRecord::synthetic(
            SourceFamily::Futures,
            subject,
            Measurement::Price {
                price: round_to(self.simulator.sample(self.config.simulated_price), 2),
                change: format_change(self.simulator.sample(self.config.simulated_change_pct)),
            },
        )
    }
}
