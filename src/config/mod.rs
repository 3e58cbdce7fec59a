//! Configuration Module - TOML-based Collector Configuration
//!
//! Loads and validates configuration from `config.toml`.
//! Endpoints, headers, timeouts and simulated-value ranges for every
//! source family are externalized here - nothing is hardcoded in the
//! adapters. Every section has defaults, so an empty file is valid.

pub mod loader;

use serde::Deserialize;

/// Top-level application configuration.
///
/// Loaded from `config.toml` at startup and validated before any
/// adapter is built. Read-only afterwards.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
  /// Application identity and logging.
  #[serde(default)]
  pub app: AppSection,
  /// Shared HTTP client settings.
  #[serde(default)]
  pub http: HttpConfig,
  /// Collection cycle settings.
  #[serde(default)]
  pub collection: CollectionConfig,
  /// Per-source adapter settings.
  #[serde(default)]
  pub sources: SourcesConfig,
  /// Alert thresholds.
  #[serde(default)]
  pub alerts: AlertConfig,
  /// Metrics and monitoring.
  #[serde(default)]
  pub metrics: MetricsConfig,
}

/// Application identity configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppSection {
  /// Human-readable name.
  #[serde(default = "default_app_name")]
  pub name: String,
  /// Log level (trace, debug, info, warn, error).
  #[serde(default = "default_log_level")]
  pub log_level: String,
}

impl Default for AppSection {
  fn default() -> Self {
    Self {
      name: default_app_name(),
      log_level: default_log_level(),
    }
  }
}

/// HTTP client configuration shared by all adapters.
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
  /// User-agent pool, rotated per request.
  #[serde(default = "default_user_agents")]
  pub user_agents: Vec<String>,
  /// `Accept-Language` locale hint.
  #[serde(default = "default_accept_language")]
  pub accept_language: String,
  /// `Referer` header value.
  #[serde(default = "default_referer")]
  pub referer: String,
  /// Retries on transport errors and 5xx responses.
  #[serde(default)]
  pub max_retries: u32,
  /// Base delay between retries (exponential backoff).
  #[serde(default = "default_retry_delay")]
  pub retry_base_delay_ms: u64,
  /// Idle connections kept per host.
  #[serde(default = "default_pool_idle")]
  pub pool_max_idle_per_host: usize,
}

impl Default for HttpConfig {
  fn default() -> Self {
    Self {
      user_agents: default_user_agents(),
      accept_language: default_accept_language(),
      referer: default_referer(),
      max_retries: 0,
      retry_base_delay_ms: default_retry_delay(),
      pool_max_idle_per_host: default_pool_idle(),
    }
  }
}

/// Collection cycle configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CollectionConfig {
  /// Path of the plain-text summary rewritten each cycle.
  /// Empty disables the artifact.
  #[serde(default = "default_summary_path")]
  pub summary_path: String,
  /// Fan adapters out concurrently instead of one after another.
  #[serde(default)]
  pub concurrent: bool,
  /// Seconds between cycles in periodic mode (0 = run once).
  #[serde(default)]
  pub interval_seconds: u64,
  /// Seed for simulated values (random when absent).
  #[serde(default)]
  pub seed: Option<u64>,
}

impl Default for CollectionConfig {
  fn default() -> Self {
    Self {
      summary_path: default_summary_path(),
      concurrent: false,
      interval_seconds: 0,
      seed: None,
    }
  }
}

/// Inclusive range for simulated values.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ValueRange {
  /// Lower bound.
  pub min: f64,
  /// Upper bound.
  pub max: f64,
}

impl ValueRange {
  /// Create a range.
  pub const fn new(min: f64, max: f64) -> Self {
    Self { min, max }
  }

  /// Both bounds finite and ordered.
  pub fn is_valid(&self) -> bool {
    self.min.is_finite() && self.max.is_finite() && self.min <= self.max
  }
}

/// Settings for all five source adapters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SourcesConfig {
  /// Spot price board (CEPEA).
  #[serde(default)]
  pub price_board: PriceBoardConfig,
  /// Futures (B3 contracts via Yahoo chart API).
  #[serde(default)]
  pub futures: FuturesConfig,
  /// Exchange rate (Yahoo chart API).
  #[serde(default)]
  pub currency: CurrencyConfig,
  /// Rainfall (INMET).
  #[serde(default)]
  pub rainfall: RainfallConfig,
  /// Production estimates (CONAB).
  #[serde(default)]
  pub production: ProductionConfig,
}

/// Simulated price profile for one commodity.
#[derive(Debug, Clone, Deserialize)]
pub struct SimulatedCommodity {
  /// Commodity name (matches the URL subject).
  pub commodity: String,
  /// Price range.
  pub price: ValueRange,
  /// Magnitude of the percentage change; the sign is random.
  pub change_pct: ValueRange,
}

/// Price board adapter configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct PriceBoardConfig {
  /// URL template; `{subject}` is replaced by the commodity.
  #[serde(default = "default_cepea_url")]
  pub url_template: String,
  /// Commodity fetched by a full collection.
  #[serde(default = "default_commodity")]
  pub default_subject: String,
  /// Request timeout in seconds.
  #[serde(default = "default_cepea_timeout")]
  pub timeout_seconds: u64,
  /// Fixed delay before each request (rate-limit courtesy).
  #[serde(default = "default_cepea_delay")]
  pub pre_request_delay_ms: u64,
  /// CSS class of the quote container.
  #[serde(default = "default_container_class")]
  pub container_class: String,
  /// CSS class of the variation element.
  #[serde(default = "default_variation_class")]
  pub variation_class: String,
  /// Simulated profiles; the first entry covers unknown commodities.
  #[serde(default = "default_cepea_simulated")]
  pub simulated: Vec<SimulatedCommodity>,
}

impl Default for PriceBoardConfig {
  fn default() -> Self {
    Self {
      url_template: default_cepea_url(),
      default_subject: default_commodity(),
      timeout_seconds: default_cepea_timeout(),
      pre_request_delay_ms: default_cepea_delay(),
      container_class: default_container_class(),
      variation_class: default_variation_class(),
      simulated: default_cepea_simulated(),
    }
  }
}

/// Subject-to-symbol mapping for chart-API instruments.
#[derive(Debug, Clone, Deserialize)]
pub struct Instrument {
  /// Subject reported in records (e.g. `soja_futuro`, `USD`).
  pub subject: String,
  /// Chart API symbol (e.g. `ZS=F`, `BRL=X`).
  pub symbol: String,
}

/// Futures adapter configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct FuturesConfig {
  /// URL template; `{symbol}` is replaced by the instrument symbol.
  #[serde(default = "default_chart_url")]
  pub url_template: String,
  /// Subject fetched by a full collection.
  #[serde(default = "default_futures_subject")]
  pub default_subject: String,
  /// Known contracts.
  #[serde(default = "default_futures_instruments")]
  pub instruments: Vec<Instrument>,
  /// Request timeout in seconds.
  #[serde(default = "default_timeout")]
  pub timeout_seconds: u64,
  /// Simulated price range.
  #[serde(default = "default_futures_price")]
  pub simulated_price: ValueRange,
  /// Simulated signed change range (percent).
  #[serde(default = "default_futures_change")]
  pub simulated_change_pct: ValueRange,
}

impl Default for FuturesConfig {
  fn default() -> Self {
    Self {
      url_template: default_chart_url(),
      default_subject: default_futures_subject(),
      instruments: default_futures_instruments(),
      timeout_seconds: default_timeout(),
      simulated_price: default_futures_price(),
      simulated_change_pct: default_futures_change(),
    }
  }
}

/// Currency adapter configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CurrencyConfig {
  /// URL template; `{symbol}` is replaced by the pair symbol.
  #[serde(default = "default_chart_url")]
  pub url_template: String,
  /// Currency fetched by a full collection.
  #[serde(default = "default_currency_subject")]
  pub default_subject: String,
  /// Known currency pairs.
  #[serde(default = "default_currency_instruments")]
  pub instruments: Vec<Instrument>,
  /// Request timeout in seconds.
  #[serde(default = "default_timeout")]
  pub timeout_seconds: u64,
  /// Simulated rate range.
  #[serde(default = "default_currency_rate")]
  pub simulated_rate: ValueRange,
  /// Simulated signed change range (percent).
  #[serde(default = "default_currency_change")]
  pub simulated_change_pct: ValueRange,
}

impl Default for CurrencyConfig {
  fn default() -> Self {
    Self {
      url_template: default_chart_url(),
      default_subject: default_currency_subject(),
      instruments: default_currency_instruments(),
      timeout_seconds: default_timeout(),
      simulated_rate: default_currency_rate(),
      simulated_change_pct: default_currency_change(),
    }
  }
}

/// Rainfall adapter configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RainfallConfig {
  /// URL template; `{date}` is replaced by `YYYY-MM-DD`.
  #[serde(default = "default_inmet_url")]
  pub url_template: String,
  /// State fetched by a full collection.
  #[serde(default = "default_state")]
  pub default_subject: String,
  /// Days between today and the requested date (the service lags).
  #[serde(default = "default_lag_days")]
  pub lag_days: i64,
  /// Request timeout in seconds.
  #[serde(default = "default_timeout")]
  pub timeout_seconds: u64,
  /// Drought-prone states.
  #[serde(default = "default_dry_states")]
  pub dry_states: Vec<String>,
  /// Wet states.
  #[serde(default = "default_wet_states")]
  pub wet_states: Vec<String>,
  /// Simulated range for dry states.
  #[serde(default = "default_dry_range")]
  pub dry_range: ValueRange,
  /// Simulated range for wet states.
  #[serde(default = "default_wet_range")]
  pub wet_range: ValueRange,
  /// Simulated range for every other state.
  #[serde(default = "default_other_range")]
  pub default_range: ValueRange,
}

impl Default for RainfallConfig {
  fn default() -> Self {
    Self {
      url_template: default_inmet_url(),
      default_subject: default_state(),
      lag_days: default_lag_days(),
      timeout_seconds: default_timeout(),
      dry_states: default_dry_states(),
      wet_states: default_wet_states(),
      dry_range: default_dry_range(),
      wet_range: default_wet_range(),
      default_range: default_other_range(),
    }
  }
}

/// Simulated production profile for one commodity.
#[derive(Debug, Clone, Deserialize)]
pub struct SimulatedProduction {
  /// Commodity name.
  pub commodity: String,
  /// Production range (million tons).
  pub range: ValueRange,
}

/// Production adapter configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductionConfig {
  /// Crop-season endpoint.
  #[serde(default = "default_conab_url")]
  pub url: String,
  /// Commodity fetched by a full collection.
  #[serde(default = "default_commodity")]
  pub default_subject: String,
  /// Region reported in records.
  #[serde(default = "default_region")]
  pub region: String,
  /// Request timeout in seconds.
  #[serde(default = "default_timeout")]
  pub timeout_seconds: u64,
  /// Simulated profiles per commodity.
  #[serde(default = "default_conab_simulated")]
  pub simulated: Vec<SimulatedProduction>,
  /// Simulated range for commodities without a profile.
  #[serde(default = "default_conab_other")]
  pub default_range: ValueRange,
}

impl Default for ProductionConfig {
  fn default() -> Self {
    Self {
      url: default_conab_url(),
      default_subject: default_commodity(),
      region: default_region(),
      timeout_seconds: default_timeout(),
      simulated: default_conab_simulated(),
      default_range: default_conab_other(),
    }
  }
}

/// Alert threshold configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AlertConfig {
  /// Relative price drop that triggers an alert (0.05 = 5%).
  #[serde(default = "default_drop_fraction")]
  pub price_drop_fraction: f64,
  /// Multiple of the historical average that triggers an alert.
  #[serde(default = "default_high_factor")]
  pub price_high_factor: f64,
  /// Rainfall below this (mm) triggers a drought alert.
  #[serde(default = "default_drought_mm")]
  pub drought_threshold_mm: f64,
  /// Emit no alerts when most snapshot records are synthetic.
  #[serde(default = "default_true")]
  pub suppress_on_synthetic_majority: bool,
}

impl Default for AlertConfig {
  fn default() -> Self {
    Self {
      price_drop_fraction: default_drop_fraction(),
      price_high_factor: default_high_factor(),
      drought_threshold_mm: default_drought_mm(),
      suppress_on_synthetic_majority: true,
    }
  }
}

/// Metrics and monitoring configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
  /// Enable Prometheus metrics export (periodic mode only).
  #[serde(default = "default_true")]
  pub enabled: bool,
  /// Metrics server bind address.
  #[serde(default = "default_metrics_addr")]
  pub bind_address: String,
}

impl Default for MetricsConfig {
  fn default() -> Self {
    Self {
      enabled: true,
      bind_address: default_metrics_addr(),
    }
  }
}

// Default value functions for serde

fn default_app_name() -> String {
  "agro-indicators".to_string()
}

fn default_log_level() -> String {
  "info".to_string()
}

fn default_true() -> bool {
  true
}

fn default_user_agents() -> Vec<String> {
  vec![
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36".to_string(),
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_5) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.5 Safari/605.1.15".to_string(),
    "Mozilla/5.0 (X11; Linux x86_64; rv:127.0) Gecko/20100101 Firefox/127.0".to_string(),
  ]
}

fn default_accept_language() -> String {
  "pt-BR,pt;q=0.9,en-US;q=0.8,en;q=0.7".to_string()
}

fn default_referer() -> String {
  "https://www.google.com/".to_string()
}

fn default_retry_delay() -> u64 {
  200
}

fn default_pool_idle() -> usize {
  5
}

fn default_summary_path() -> String {
  "collector_summary.log".to_string()
}

fn default_timeout() -> u64 {
  15
}

fn default_commodity() -> String {
  "soja".to_string()
}

fn default_cepea_url() -> String {
  "https://www.cepea.esalq.usp.br/br/cotacoes/{subject}/".to_string()
}

fn default_cepea_timeout() -> u64 {
  20
}

fn default_cepea_delay() -> u64 {
  1500
}

fn default_container_class() -> String {
  "box-cotacao".to_string()
}

fn default_variation_class() -> String {
  "variacao".to_string()
}

fn default_cepea_simulated() -> Vec<SimulatedCommodity> {
  vec![
    SimulatedCommodity {
      commodity: "soja".to_string(),
      price: ValueRange::new(145.0, 160.0),
      change_pct: ValueRange::new(0.5, 3.0),
    },
    SimulatedCommodity {
      commodity: "milho".to_string(),
      price: ValueRange::new(97.0, 107.0),
      change_pct: ValueRange::new(0.5, 2.5),
    },
  ]
}

fn default_chart_url() -> String {
  "https://query1.finance.yahoo.com/v8/finance/chart/{symbol}?range=5d&interval=1d".to_string()
}

fn default_futures_subject() -> String {
  "soja_futuro".to_string()
}

fn default_futures_instruments() -> Vec<Instrument> {
  vec![
    Instrument {
      subject: "soja_futuro".to_string(),
      symbol: "ZS=F".to_string(),
    },
    Instrument {
      subject: "milho_futuro".to_string(),
      symbol: "ZC=F".to_string(),
    },
  ]
}

fn default_futures_price() -> ValueRange {
  ValueRange::new(14.5, 16.0)
}

fn default_futures_change() -> ValueRange {
  ValueRange::new(-2.0, 2.0)
}

fn default_currency_subject() -> String {
  "USD".to_string()
}

fn default_currency_instruments() -> Vec<Instrument> {
  vec![
    Instrument {
      subject: "USD".to_string(),
      symbol: "BRL=X".to_string(),
    },
    Instrument {
      subject: "EUR".to_string(),
      symbol: "EURBRL=X".to_string(),
    },
  ]
}

fn default_currency_rate() -> ValueRange {
  ValueRange::new(4.8, 5.3)
}

fn default_currency_change() -> ValueRange {
  ValueRange::new(-0.5, 0.5)
}

fn default_inmet_url() -> String {
  "https://apitempo.inmet.gov.br/estacao/diaria/{date}/all".to_string()
}

fn default_state() -> String {
  "MT".to_string()
}

fn default_lag_days() -> i64 {
  1
}

fn default_dry_states() -> Vec<String> {
  ["MT", "MS", "GO"].map(String::from).to_vec()
}

fn default_wet_states() -> Vec<String> {
  ["PR", "SC", "RS"].map(String::from).to_vec()
}

fn default_dry_range() -> ValueRange {
  ValueRange::new(0.0, 50.0)
}

fn default_wet_range() -> ValueRange {
  ValueRange::new(50.0, 150.0)
}

fn default_other_range() -> ValueRange {
  ValueRange::new(20.0, 100.0)
}

fn default_conab_url() -> String {
  "https://api.conab.gov.br/v3/safra/2023-2024".to_string()
}

fn default_region() -> String {
  "BR".to_string()
}

fn default_conab_simulated() -> Vec<SimulatedProduction> {
  vec![
    SimulatedProduction {
      commodity: "soja".to_string(),
      range: ValueRange::new(140.0, 165.0),
    },
    SimulatedProduction {
      commodity: "milho".to_string(),
      range: ValueRange::new(112.0, 130.0),
    },
  ]
}

fn default_conab_other() -> ValueRange {
  ValueRange::new(45.0, 57.0)
}

fn default_drop_fraction() -> f64 {
  0.05
}

fn default_high_factor() -> f64 {
  1.1
}

fn default_drought_mm() -> f64 {
  20.0
}

fn default_metrics_addr() -> String {
  "0.0.0.0:9090".to_string()
}
