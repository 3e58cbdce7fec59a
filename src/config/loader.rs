//! Configuration Loader - File Loading and Validation
//!
//! Handles loading `config.toml`, validating all parameters,
//! and providing clear error messages for misconfiguration.
//! A misconfigured adapter must stop startup: silently degrading
//! would be indistinguishable from a real outage.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use super::{AppConfig, Instrument, ValueRange};

/// Load and validate configuration from a TOML file.
///
/// # Arguments
/// * `path` - Path to the config.toml file
///
/// # Errors
/// Returns detailed error if:
/// - File doesn't exist or can't be read
/// - TOML parsing fails
/// - Validation rules are violated
pub fn load_config(path: &str) -> Result<AppConfig> {
  let path = Path::new(path);

  let content = std::fs::read_to_string(path)
    .with_context(|| format!("Failed to read config file: {}", path.display()))?;

  let config = parse_config(&content)?;

  info!(
    name = %config.app.name,
    concurrent = config.collection.concurrent,
    interval_seconds = config.collection.interval_seconds,
    "Configuration loaded successfully"
  );

  Ok(config)
}

/// Parse and validate configuration from TOML text.
///
/// # Errors
/// Fails on malformed TOML or any validation rule violation.
pub fn parse_config(content: &str) -> Result<AppConfig> {
  let config: AppConfig =
    toml::from_str(content).with_context(|| "Failed to parse config.toml")?;

  validate_config(&config)?;
  Ok(config)
}

/// Validate all configuration parameters.
///
/// Checks for:
/// - Non-empty endpoints carrying their substitution placeholder
/// - Ordered, finite simulated-value ranges
/// - Non-empty subject mappings that include the default subject
/// - A non-empty user-agent pool
///
/// # Errors
/// Returns the first violated rule.
pub fn validate_config(config: &AppConfig) -> Result<()> {
  // HTTP validation
  anyhow::ensure!(
    !config.http.user_agents.is_empty(),
    "http.user_agents must contain at least one entry"
  );
  anyhow::ensure!(
    config.http.user_agents.iter().all(|ua| !ua.trim().is_empty()),
    "http.user_agents must not contain blank entries"
  );

  // Price board validation
  let board = &config.sources.price_board;
  ensure_template(&board.url_template, "{subject}", "sources.price_board.url_template")?;
  ensure_timeout(board.timeout_seconds, "sources.price_board")?;
  anyhow::ensure!(
    !board.default_subject.trim().is_empty(),
    "sources.price_board.default_subject must not be empty"
  );
  anyhow::ensure!(
    !board.container_class.trim().is_empty() && !board.variation_class.trim().is_empty(),
    "sources.price_board selector classes must not be empty"
  );
  anyhow::ensure!(
    !board.simulated.is_empty(),
    "sources.price_board.simulated must contain at least one commodity"
  );
  for sim in &board.simulated {
    ensure_range(sim.price, &format!("sources.price_board.simulated[{}].price", sim.commodity))?;
    ensure_range(
      sim.change_pct,
      &format!("sources.price_board.simulated[{}].change_pct", sim.commodity),
    )?;
    anyhow::ensure!(
      sim.change_pct.min >= 0.0,
      "sources.price_board.simulated[{}].change_pct is a magnitude and must be >= 0",
      sim.commodity
    );
  }

  // Futures validation
  let futures = &config.sources.futures;
  ensure_template(&futures.url_template, "{symbol}", "sources.futures.url_template")?;
  ensure_timeout(futures.timeout_seconds, "sources.futures")?;
  ensure_instruments(&futures.instruments, &futures.default_subject, "sources.futures")?;
  ensure_range(futures.simulated_price, "sources.futures.simulated_price")?;
  ensure_range(futures.simulated_change_pct, "sources.futures.simulated_change_pct")?;

  // Currency validation
  let currency = &config.sources.currency;
  ensure_template(&currency.url_template, "{symbol}", "sources.currency.url_template")?;
  ensure_timeout(currency.timeout_seconds, "sources.currency")?;
  ensure_instruments(&currency.instruments, &currency.default_subject, "sources.currency")?;
  ensure_range(currency.simulated_rate, "sources.currency.simulated_rate")?;
  ensure_range(currency.simulated_change_pct, "sources.currency.simulated_change_pct")?;

  // Rainfall validation
  let rainfall = &config.sources.rainfall;
  ensure_template(&rainfall.url_template, "{date}", "sources.rainfall.url_template")?;
  ensure_timeout(rainfall.timeout_seconds, "sources.rainfall")?;
  anyhow::ensure!(
    !rainfall.default_subject.trim().is_empty(),
    "sources.rainfall.default_subject must not be empty"
  );
  anyhow::ensure!(
    rainfall.lag_days >= 0,
    "sources.rainfall.lag_days must be >= 0, got {}",
    rainfall.lag_days
  );
  ensure_range(rainfall.dry_range, "sources.rainfall.dry_range")?;
  ensure_range(rainfall.wet_range, "sources.rainfall.wet_range")?;
  ensure_range(rainfall.default_range, "sources.rainfall.default_range")?;
  anyhow::ensure!(
    rainfall.dry_range.min >= 0.0 && rainfall.wet_range.min >= 0.0 && rainfall.default_range.min >= 0.0,
    "sources.rainfall ranges must be non-negative"
  );

  // Production validation
  let production = &config.sources.production;
  anyhow::ensure!(
    !production.url.trim().is_empty(),
    "sources.production.url must not be empty"
  );
  ensure_timeout(production.timeout_seconds, "sources.production")?;
  anyhow::ensure!(
    !production.default_subject.trim().is_empty() && !production.region.trim().is_empty(),
    "sources.production.default_subject and region must not be empty"
  );
  for sim in &production.simulated {
    ensure_range(sim.range, &format!("sources.production.simulated[{}].range", sim.commodity))?;
  }
  ensure_range(production.default_range, "sources.production.default_range")?;

  // Alert validation
  anyhow::ensure!(
    config.alerts.price_drop_fraction > 0.0 && config.alerts.price_drop_fraction < 1.0,
    "alerts.price_drop_fraction must be in (0, 1), got {}",
    config.alerts.price_drop_fraction
  );
  anyhow::ensure!(
    config.alerts.price_high_factor > 1.0,
    "alerts.price_high_factor must be > 1, got {}",
    config.alerts.price_high_factor
  );
  anyhow::ensure!(
    config.alerts.drought_threshold_mm >= 0.0,
    "alerts.drought_threshold_mm must be >= 0"
  );

  Ok(())
}

fn ensure_template(template: &str, placeholder: &str, name: &str) -> Result<()> {
  anyhow::ensure!(!template.trim().is_empty(), "{name} must not be empty");
  anyhow::ensure!(
    template.contains(placeholder),
    "{name} must contain the {placeholder} placeholder, got {template}"
  );
  Ok(())
}

fn ensure_timeout(seconds: u64, name: &str) -> Result<()> {
  anyhow::ensure!(seconds > 0, "{name}.timeout_seconds must be positive");
  Ok(())
}

fn ensure_range(range: ValueRange, name: &str) -> Result<()> {
  anyhow::ensure!(
    range.is_valid(),
    "{name} must be finite with min <= max, got [{}, {}]",
    range.min,
    range.max
  );
  Ok(())
}

fn ensure_instruments(instruments: &[Instrument], default_subject: &str, name: &str) -> Result<()> {
  anyhow::ensure!(!instruments.is_empty(), "{name}.instruments must not be empty");
  for instrument in instruments {
    anyhow::ensure!(
      !instrument.subject.trim().is_empty() && !instrument.symbol.trim().is_empty(),
      "{name}.instruments entries need a subject and a symbol"
    );
  }
  anyhow::ensure!(
    instruments
      .iter()
      .any(|i| i.subject.eq_ignore_ascii_case(default_subject)),
    "{name}.default_subject {default_subject} has no instrument mapping"
  );
  Ok(())
}
