//! CONAB Production - Crop-Season Production Estimates
//!
//! The season endpoint returns `{"resultados": [{"cultura": ..,
//! "producao": ..}, ...]}` with production in million tons.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, instrument};

use super::simulator::Simulator;
use super::{fetch_body, numeric_value, parse_json};
use crate::config::ProductionConfig;
use crate::domain::family::SourceFamily;
use crate::domain::locale::round_to;
use crate::domain::record::{Measurement, NormalizedRecord};
use crate::ports::source::{SoftFailure, SourceAdapter};
use crate::ports::transport::{HttpTransport, SourceRequest};

/// Production estimate for `commodity` from a season payload.
///
/// # Errors
/// Schema drift without a `resultados` array; data quality when the
/// crop is absent or its production is not numeric.
pub fn find_production(payload: &Value, commodity: &str) -> Result<f64, SoftFailure> {
    let crops = payload
        .get("resultados")
        .and_then(Value::as_array)
        .ok_or_else(|| SoftFailure::drift("resultados array not found"))?;

    let wanted = commodity.to_lowercase();
    let crop = crops
        .iter()
        .find(|c| {
            c.get("cultura")
                .and_then(Value::as_str)
                .is_some_and(|name| name.to_lowercase() == wanted)
        })
        .ok_or_else(|| SoftFailure::quality(format!("crop {commodity:?} not in season data")))?;

    crop.get("producao")
        .and_then(numeric_value)
        .ok_or_else(|| SoftFailure::quality(format!("non-numeric production for {commodity:?}")))
}

/// Production estimate adapter.
pub struct ProductionAdapter {
    transport: Arc<dyn HttpTransport>,
    config: ProductionConfig,
    simulator: Simulator,
}

impl ProductionAdapter {
    /// Create a new production adapter.
    pub fn new(transport: Arc<dyn HttpTransport>, config: ProductionConfig, simulator: Simulator) -> Self {
        Self {
            transport,
            config,
            simulator,
        }
    }
}

#[async_trait]
impl SourceAdapter for ProductionAdapter {
    fn family(&self) -> SourceFamily {
        SourceFamily::Production
    }

    fn default_subject(&self) -> &str {
        &self.config.default_subject
    }

    #[instrument(skip(self), fields(family = "conab"))]
    async fn observe(&self, subject: &str) -> Result<NormalizedRecord, SoftFailure> {
        let request = SourceRequest::get(
            self.config.url.clone(),
            Duration::from_secs(self.config.timeout_seconds),
        )
        .header("Accept", "application/json");
        debug!(url = %request.url, "Requesting season estimates");

        let body = fetch_body(self.transport.as_ref(), &request).await?;
        let production = find_production(&parse_json(&body)?, subject)?;

        Ok(NormalizedRecord::observed(
            SourceFamily::Production,
            subject,
            Measurement::Production {
                production_million_tons: round_to(production, 1),
                region: self.config.region.clone(),
            },
        )?)
    }

    fn synthesize(&self, subject: &str) -> NormalizedRecord {
        let range = self
            .config
            .simulated
            .iter()
            .find(|p| p.commodity.eq_ignore_ascii_case(subject))
            .map_or(self.config.default_range, |p| p.range);

        NormalizedRecord::synthetic(
            SourceFamily::Production,
            subject,
            Measurement::Production {
                production_million_tons: round_to(self.simulator.sample(range), 1),
                region: self.config.region.clone(),
            },
        )
    }
}
