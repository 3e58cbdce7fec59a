//! CEPEA Price Board - Spot Commodity Prices
//!
//! Scrapes the CEPEA/ESALQ quote page for a commodity. The price sits
//! in the first `<h3>` of the quote container and the daily variation
//! in a sibling element, both formatted the Brazilian way
//! (`R$ 158,50`, `+2,3%`).

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use regex::Regex;
use tracing::{debug, instrument};

use super::simulator::Simulator;
use super::fetch_body;
use crate::config::PriceBoardConfig;
use crate::domain::family::SourceFamily;
use crate::domain::locale::{format_change_br, parse_decimal, round_to};
use crate::domain::record::{Measurement, NormalizedRecord};
use crate::ports::source::{SoftFailure, SourceAdapter};
use crate::ports::transport::{HttpTransport, SourceRequest};

/// Change reported when the board shows no variation.
const UNCHANGED: &str = "+0,0%";

/// Spot price adapter for the CEPEA quote board.
pub struct PriceBoardAdapter {
    /// Outbound HTTP.
    transport: Arc<dyn HttpTransport>,
    /// Endpoint, selectors and simulated ranges.
    config: PriceBoardConfig,
    /// Fallback value generator.
    simulator: Simulator,
    /// Opening tag of the quote container, capturing the element name.
    container: Regex,
    /// Opening or closing tag, capturing the slash and the element name.
    element: Regex,
    /// First `<h3>` inside the container.
    heading: Regex,
    /// Element carrying the variation class.
    variation: Regex,
    /// Any markup tag.
    tag: Regex,
}

impl PriceBoardAdapter {
    /// Create a new price board adapter.
    ///
    /// # Errors
    /// Fails when the configured selector classes do not compile.
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        config: PriceBoardConfig,
        simulator: Simulator,
    ) -> Result<Self> {
        let container = Regex::new(&format!(
            r#"(?is)<([a-z][a-z0-9]*)[^>]*\bclass\s*=\s*["'](?:[^"']*\s)?{}(?:\s[^"']*)?["'][^>]*>"#,
            regex::escape(&config.container_class)
        ))
        .context("Invalid price board container class")?;
        let variation = Regex::new(&format!(
            r#"(?is)<[a-z0-9]+[^>]*\bclass\s*=\s*["'](?:[^"']*\s)?{}(?:\s[^"']*)?["'][^>]*>(.*?)</"#,
            regex::escape(&config.variation_class)
        ))
        .context("Invalid price board variation class")?;
        let element =
            Regex::new(r"(?i)<(/?)([a-z][a-z0-9]*)\b[^>]*>").context("Invalid element pattern")?;
        let heading = Regex::new(r"(?is)<h3[^>]*>(.*?)</h3>").context("Invalid heading pattern")?;
        let tag = Regex::new(r"(?s)<[^>]*>").context("Invalid tag pattern")?;

        Ok(Self {
            transport,
            config,
            simulator,
            container,
            element,
            heading,
            variation,
            tag,
        })
    }

    /// Build the quote page request for a commodity.
    fn request(&self, commodity: &str) -> SourceRequest {
        SourceRequest::get(
            self.config.url_template.replace("{subject}", commodity),
            Duration::from_secs(self.config.timeout_seconds),
        )
    }

    /// Extract `(price, change)` from the quote page markup.
    ///
    /// # Errors
    /// Schema drift when the container, heading or variation element is
    /// missing; data quality when the price text is not a number.
    pub fn parse_quote(&self, html: &str) -> Result<(f64, String), SoftFailure> {
        let scope = self.container_body(html)?;

        let price_text = self
            .heading
            .captures(scope)
            .and_then(|c| c.get(1))
            .map(|m| self.inner_text(m.as_str()))
            .ok_or_else(|| SoftFailure::drift("price heading not found"))?;

        let change = self
            .variation
            .captures(scope)
            .and_then(|c| c.get(1))
            .map(|m| self.inner_text(m.as_str()))
            .ok_or_else(|| {
                SoftFailure::drift(format!("variation .{} not found", self.config.variation_class))
            })?;

        let price = parse_decimal(&price_text)
            .ok_or_else(|| SoftFailure::quality(format!("unparsable price {price_text:?}")))?;

        let change = if change.is_empty() {
            // No prior quote to compare against; reported as unchanged.
            debug!("Empty variation on price board, assuming unchanged");
            UNCHANGED.to_string()
        } else {
            change
        };

        Ok((price, change))
    }

    /// Markup between the container's opening tag and its matching
    /// closing tag.
    fn container_body<'h>(&self, html: &'h str) -> Result<&'h str, SoftFailure> {
        let missing =
            || SoftFailure::drift(format!("container .{} not found", self.config.container_class));
        let caps = self.container.captures(html).ok_or_else(missing)?;
        let (Some(open), Some(name)) = (caps.get(0), caps.get(1)) else {
            return Err(missing());
        };
        let body = &html[open.end()..];

        let mut depth = 1usize;
        for tag in self.element.captures_iter(body) {
            let (Some(whole), Some(tag_name)) = (tag.get(0), tag.get(2)) else {
                continue;
            };
            if !tag_name.as_str().eq_ignore_ascii_case(name.as_str()) {
                continue;
            }
            if tag.get(1).is_some_and(|slash| !slash.as_str().is_empty()) {
                depth -= 1;
                if depth == 0 {
                    return Ok(&body[..whole.start()]);
                }
            } else if !whole.as_str().ends_with("/>") {
                depth += 1;
            }
        }

        Err(SoftFailure::drift(format!(
            "container .{} is never closed",
            self.config.container_class
        )))
    }

    /// Visible text of a markup fragment.
    fn inner_text(&self, fragment: &str) -> String {
        self.tag
            .replace_all(fragment, "")
            .replace("&nbsp;", " ")
            .replace("&#160;", " ")
            .trim()
            .to_string()
    }
}

#[async_trait]
impl SourceAdapter for PriceBoardAdapter {
    fn family(&self) -> SourceFamily {
        SourceFamily::PriceBoard
    }

    fn default_subject(&self) -> &str {
        &self.config.default_subject
    }

    #[instrument(skip(self), fields(family = "cepea"))]
    async fn observe(&self, subject: &str) -> Result<NormalizedRecord, SoftFailure> {
        if self.config.pre_request_delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.config.pre_request_delay_ms)).await;
        }

        let request = self.request(subject);
        debug!(url = %request.url, "Requesting price board");
        let html = fetch_body(self.transport.as_ref(), &request).await?;
        let (price, change) = self.parse_quote(&html)?;

        Ok(NormalizedRecord::observed(
            SourceFamily::PriceBoard,
            subject,
            Measurement::Price {
                price: round_to(price, 2),
                change,
            },
        )?)
    }

    fn synthesize(&self, subject: &str) -> NormalizedRecord {
        let profile = self
            .config
            .simulated
            .iter()
            .find(|p| p.commodity.eq_ignore_ascii_case(subject))
            .or_else(|| self.config.simulated.first());

        let (price, change_pct) = profile.map_or((0.0, 0.0), |p| {
            (
                self.simulator.sample(p.price),
                self.simulator.sign() * self.simulator.sample(p.change_pct),
            )
        });

        NormalizedRecord::synthetic(
            SourceFamily::PriceBoard,
            subject,
            Measurement::Price {
                price: round_to(price, 2),
                change: format_change_br(change_pct),
            },
        )
    }
}
