//! Collector - One Snapshot per Collection Cycle
//!
//! Runs the five source adapters (in fixed order, or fanned out when
//! `collection.concurrent` is set), assembles the snapshot, records
//! metrics and rewrites the summary file.
//!
//! `collect_all` cannot fail: every adapter degrades to a synthetic
//! record, and a summary write failure is only logged.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::time::Instant;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::adapters::metrics::MetricsRegistry;
use crate::adapters::persistence::SummaryWriter;
use crate::adapters::sources::{
  CurrencyAdapter, FuturesAdapter, PriceBoardAdapter, ProductionAdapter, RainfallAdapter,
  Simulator,
};
use crate::config::loader::validate_config;
use crate::config::{AppConfig, CollectionConfig};
use crate::domain::family::SourceFamily;
use crate::domain::record::NormalizedRecord;
use crate::domain::snapshot::{Snapshot, SnapshotRecords};
use crate::ports::source::SourceAdapter;
use crate::ports::transport::HttpTransport;

/// Odd constant used to spread one configured seed across families.
const SEED_STRIDE: u64 = 0x9E37_79B9_7F4A_7C15;

/// One adapter per family slot.
pub struct AdapterSet {
  /// Spot price board.
  pub price_board: Box<dyn SourceAdapter>,
  /// Futures quotes.
  pub futures: Box<dyn SourceAdapter>,
  /// Exchange rates.
  pub currency: Box<dyn SourceAdapter>,
  /// Station rainfall.
  pub rainfall: Box<dyn SourceAdapter>,
  /// Production estimates.
  pub production: Box<dyn SourceAdapter>,
}

impl AdapterSet {
  /// Build the standard adapters from configuration.
  ///
  /// With `collection.seed` set, each family gets its own derived seed
  /// so simulated values are reproducible.
  ///
  /// # Errors
  /// Fails when an adapter rejects its configuration.
  pub fn from_config(config: &AppConfig, transport: Arc<dyn HttpTransport>) -> Result<Self> {
    let simulator = |family: SourceFamily| match config.collection.seed {
      Some(seed) => Simulator::seeded(derive_seed(seed, family)),
      None => Simulator::from_entropy(),
    };
    let sources = &config.sources;

    Ok(Self {
      price_board: Box::new(
        PriceBoardAdapter::new(
          Arc::clone(&transport),
          sources.price_board.clone(),
          simulator(SourceFamily::PriceBoard),
        )
        .context("Failed to build price board adapter")?,
      ),
      futures: Box::new(FuturesAdapter::new(
        Arc::clone(&transport),
        sources.futures.clone(),
        simulator(SourceFamily::Futures),
      )),
      currency: Box::new(CurrencyAdapter::new(
        Arc::clone(&transport),
        sources.currency.clone(),
        simulator(SourceFamily::Currency),
      )),
      rainfall: Box::new(RainfallAdapter::new(
        Arc::clone(&transport),
        sources.rainfall.clone(),
        simulator(SourceFamily::Rainfall),
      )),
      production: Box::new(ProductionAdapter::new(
        transport,
        sources.production.clone(),
        simulator(SourceFamily::Production),
      )),
    })
  }
}

fn derive_seed(seed: u64, family: SourceFamily) -> u64 {
  let slot = SourceFamily::ALL
    .iter()
    .position(|f| *f == family)
    .unwrap_or_default() as u64;
  seed ^ SEED_STRIDE.wrapping_mul(slot + 1)
}

/// Aggregates all source families into snapshots.
pub struct Collector {
  /// Adapters, one per family.
  adapters: AdapterSet,
  /// Fan adapters out instead of running them in order.
  concurrent: bool,
  /// Summary file output (disabled when the path is empty).
  summary: Option<SummaryWriter>,
  /// Optional Prometheus registry.
  metrics: Option<Arc<MetricsRegistry>>,
}

impl Collector {
  /// Build a collector with the standard adapters.
  ///
  /// # Errors
  /// Fails on invalid configuration.
  pub fn from_config(config: &AppConfig, transport: Arc<dyn HttpTransport>) -> Result<Self> {
    validate_config(config)?;
    let adapters = AdapterSet::from_config(config, transport)?;
    Self::with_adapters(adapters, &config.collection)
  }

  /// Build a collector from explicit adapters.
  ///
  /// # Errors
  /// Fails when an adapter sits in another family's slot.
  pub fn with_adapters(adapters: AdapterSet, collection: &CollectionConfig) -> Result<Self> {
    let slots: [(&str, &dyn SourceAdapter, SourceFamily); 5] = [
      ("price_board", adapters.price_board.as_ref(), SourceFamily::PriceBoard),
      ("futures", adapters.futures.as_ref(), SourceFamily::Futures),
      ("currency", adapters.currency.as_ref(), SourceFamily::Currency),
      ("rainfall", adapters.rainfall.as_ref(), SourceFamily::Rainfall),
      ("production", adapters.production.as_ref(), SourceFamily::Production),
    ];
    for (slot, adapter, expected) in slots {
      anyhow::ensure!(
        adapter.family() == expected,
        "Adapter for {} placed in the {slot} slot",
        adapter.family()
      );
    }

    let summary = (!collection.summary_path.trim().is_empty())
      .then(|| SummaryWriter::new(&collection.summary_path));

    Ok(Self {
      adapters,
      concurrent: collection.concurrent,
      summary,
      metrics: None,
    })
  }

  /// Attach a metrics registry.
  #[must_use]
  pub fn with_metrics(mut self, metrics: Arc<MetricsRegistry>) -> Self {
    self.metrics = Some(metrics);
    self
  }

  /// Adapter serving a family.
  pub fn adapter(&self, family: SourceFamily) -> &dyn SourceAdapter {
    match family {
      SourceFamily::PriceBoard => self.adapters.price_board.as_ref(),
      SourceFamily::Futures => self.adapters.futures.as_ref(),
      SourceFamily::Currency => self.adapters.currency.as_ref(),
      SourceFamily::Rainfall => self.adapters.rainfall.as_ref(),
      SourceFamily::Production => self.adapters.production.as_ref(),
    }
  }

  /// Run one collection cycle with default subjects.
  pub async fn collect_all(&self) -> Snapshot {
    self.run_cycle(Uuid::new_v4()).await
  }

  /// Fetch a single family with an explicit subject.
  pub async fn refresh(&self, family: SourceFamily, subject: Option<&str>) -> NormalizedRecord {
    self.fetch(family, subject).await
  }

  #[instrument(skip(self), name = "collection_cycle")]
  async fn run_cycle(&self, cycle_id: Uuid) -> Snapshot {
    let start = Instant::now();
    info!(concurrent = self.concurrent, "Starting collection cycle");

    let records = if self.concurrent {
      let (price_board, futures, currency, rainfall, production) = tokio::join!(
        self.fetch(SourceFamily::PriceBoard, None),
        self.fetch(SourceFamily::Futures, None),
        self.fetch(SourceFamily::Currency, None),
        self.fetch(SourceFamily::Rainfall, None),
        self.fetch(SourceFamily::Production, None),
      );
      SnapshotRecords {
        price_board,
        futures,
        currency,
        rainfall,
        production,
      }
    } else {
      SnapshotRecords {
        price_board: self.fetch(SourceFamily::PriceBoard, None).await,
        futures: self.fetch(SourceFamily::Futures, None).await,
        currency: self.fetch(SourceFamily::Currency, None).await,
        rainfall: self.fetch(SourceFamily::Rainfall, None).await,
        production: self.fetch(SourceFamily::Production, None).await,
      }
    };

    let snapshot = Snapshot::new(cycle_id, start.elapsed(), records);
    info!(
      duration_secs = snapshot.duration().as_secs_f64(),
      synthetic = snapshot.synthetic_count(),
      "Collection cycle complete"
    );

    if let Some(metrics) = &self.metrics {
      metrics.record_cycle(&snapshot);
    }
    self.write_summary(&snapshot).await;
    snapshot
  }

  async fn fetch(&self, family: SourceFamily, subject: Option<&str>) -> NormalizedRecord {
    let outcome = self.adapter(family).fetch(subject).await;
    if let Some(metrics) = &self.metrics {
      metrics.record_fetch(family, &outcome);
    }
    outcome.into_record()
  }

  async fn write_summary(&self, snapshot: &Snapshot) {
    let Some(writer) = &self.summary else {
      return;
    };
    if let Err(e) = writer.write(snapshot).await {
      warn!(path = %writer.path().display(), error = %e, "Failed to write collection summary");
      if let Some(metrics) = &self.metrics {
        metrics.summary_write_failures.inc();
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use std::time::Duration;

  use async_trait::async_trait;

  use super::*;
  use crate::domain::record::Measurement;
  use crate::ports::source::SoftFailure;
  use crate::ports::transport::{RawResponse, SourceRequest, TransportError};

  /// Adapter answering with a fixed value, or failing.
  struct FixedAdapter {
    family: SourceFamily,
    fail: bool,
    delay: Duration,
  }

  impl FixedAdapter {
    fn boxed(family: SourceFamily, fail: bool) -> Box<dyn SourceAdapter> {
      Box::new(Self {
        family,
        fail,
        delay: Duration::ZERO,
      })
    }

    fn measurement(&self) -> Measurement {
      match self.family {
        SourceFamily::PriceBoard | SourceFamily::Futures => Measurement::Price {
          price: 10.0,
          change: "+0,0%".to_string(),
        },
        SourceFamily::Currency => Measurement::ExchangeRate {
          rate: 5.0,
          change: "+0.00%".to_string(),
        },
        SourceFamily::Rainfall => Measurement::Rainfall {
          avg_rainfall_mm: 30.0,
        },
        SourceFamily::Production => Measurement::Production {
          production_million_tons: 150.0,
          region: "BR".to_string(),
        },
      }
    }
  }

  #[async_trait]
  impl SourceAdapter for FixedAdapter {
    fn family(&self) -> SourceFamily {
      self.family
    }

    fn default_subject(&self) -> &str {
      "default"
    }

    async fn observe(&self, subject: &str) -> Result<NormalizedRecord, SoftFailure> {
      tokio::time::sleep(self.delay).await;
      if self.fail {
        return Err(SoftFailure::Status(503));
      }
      Ok(NormalizedRecord::observed(self.family, subject, self.measurement())?)
    }

    fn synthesize(&self, subject: &str) -> NormalizedRecord {
      NormalizedRecord::synthetic(self.family, subject, self.measurement())
    }
  }

  fn adapters(failing: &[SourceFamily]) -> AdapterSet {
    let make = |f: SourceFamily| FixedAdapter::boxed(f, failing.contains(&f));
    AdapterSet {
      price_board: make(SourceFamily::PriceBoard),
      futures: make(SourceFamily::Futures),
      currency: make(SourceFamily::Currency),
      rainfall: make(SourceFamily::Rainfall),
      production: make(SourceFamily::Production),
    }
  }

  fn no_summary() -> CollectionConfig {
    CollectionConfig {
      summary_path: String::new(),
      ..CollectionConfig::default()
    }
  }

  struct DownTransport;

  #[async_trait]
  impl HttpTransport for DownTransport {
    async fn get(&self, _request: &SourceRequest) -> Result<RawResponse, TransportError> {
      Err(TransportError::Connect("connection refused".to_string()))
    }
  }

  #[tokio::test]
  async fn test_snapshot_has_every_family() {
    let collector = Collector::with_adapters(adapters(&[]), &no_summary()).unwrap();
    let snapshot = collector.collect_all().await;
    assert_eq!(snapshot.keys(), ["cepea", "b3", "usd", "inmet", "conab"]);
    assert!(snapshot.is_fully_observed());
  }

  #[tokio::test]
  async fn test_failures_are_isolated() {
    let collector = Collector::with_adapters(
      adapters(&[SourceFamily::Futures, SourceFamily::Rainfall]),
      &no_summary(),
    )
    .unwrap();
    let snapshot = collector.collect_all().await;

    assert_eq!(snapshot.synthetic_count(), 2);
    assert!(snapshot.get(SourceFamily::Futures).is_synthetic());
    assert!(snapshot.get(SourceFamily::Rainfall).is_synthetic());
    assert!(!snapshot.get(SourceFamily::Currency).is_synthetic());
  }

  #[test]
  fn test_rejects_adapter_in_wrong_slot() {
    let mut set = adapters(&[]);
    set.futures = FixedAdapter::boxed(SourceFamily::Currency, false);
    let err = Collector::with_adapters(set, &no_summary()).err().unwrap();
    assert!(err.to_string().contains("futures slot"));
  }

  #[tokio::test(start_paused = true)]
  async fn test_concurrent_mode_overlaps_adapters() {
    let slow = |family| -> Box<dyn SourceAdapter> {
      Box::new(FixedAdapter {
        family,
        fail: false,
        delay: Duration::from_secs(2),
      })
    };
    let set = AdapterSet {
      price_board: slow(SourceFamily::PriceBoard),
      futures: slow(SourceFamily::Futures),
      currency: slow(SourceFamily::Currency),
      rainfall: slow(SourceFamily::Rainfall),
      production: slow(SourceFamily::Production),
    };
    let config = CollectionConfig {
      concurrent: true,
      ..no_summary()
    };
    let snapshot = Collector::with_adapters(set, &config).unwrap().collect_all().await;
    assert!(snapshot.duration() < Duration::from_secs(4));
    assert!(snapshot.is_fully_observed());
  }

  #[tokio::test]
  async fn test_refresh_uses_explicit_subject() {
    let collector = Collector::with_adapters(adapters(&[]), &no_summary()).unwrap();
    let record = collector.refresh(SourceFamily::Rainfall, Some("PR")).await;
    assert_eq!(record.subject(), "PR");
    let record = collector.refresh(SourceFamily::Rainfall, None).await;
    assert_eq!(record.subject(), "default");
  }

  #[tokio::test]
  async fn test_from_config_with_unreachable_sources() {
    let mut config = AppConfig::default();
    config.collection.summary_path = String::new();
    config.collection.seed = Some(42);
    config.sources.price_board.pre_request_delay_ms = 0;

    let collector = Collector::from_config(&config, Arc::new(DownTransport)).unwrap();
    let snapshot = collector.collect_all().await;

    assert_eq!(snapshot.synthetic_count(), 5);
    for (family, record) in snapshot.iter() {
      assert_eq!(
        record.source_tag().as_str(),
        format!("{}_SIMULADO", family.synthetic_prefix())
      );
    }
  }

  #[tokio::test]
  async fn test_seeded_collectors_agree() {
    let mut config = AppConfig::default();
    config.collection.summary_path = String::new();
    config.collection.seed = Some(7);
    config.sources.price_board.pre_request_delay_ms = 0;

    let a = Collector::from_config(&config, Arc::new(DownTransport)).unwrap();
    let b = Collector::from_config(&config, Arc::new(DownTransport)).unwrap();
    let (sa, sb) = (a.collect_all().await, b.collect_all().await);
    for family in SourceFamily::ALL {
      assert_eq!(sa.get(family).value(), sb.get(family).value());
    }
  }

  #[tokio::test]
  async fn test_summary_failure_does_not_affect_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("file");
    std::fs::write(&blocker, "x").unwrap();
    let config = CollectionConfig {
      summary_path: blocker.join("summary.log").to_string_lossy().into_owned(),
      ..CollectionConfig::default()
    };
    let metrics = Arc::new(MetricsRegistry::new().unwrap());
    let collector = Collector::with_adapters(adapters(&[]), &config)
      .unwrap()
      .with_metrics(Arc::clone(&metrics));

    let snapshot = collector.collect_all().await;
    assert!(snapshot.is_fully_observed());
    assert_eq!(metrics.summary_write_failures.get(), 1);
    assert_eq!(metrics.cycles.get(), 1);
  }

  #[test]
  fn test_derived_seeds_differ_per_family() {
    let seeds: Vec<u64> = SourceFamily::ALL.iter().map(|f| derive_seed(1, *f)).collect();
    for (i, a) in seeds.iter().enumerate() {
      for b in &seeds[i + 1..] {
        assert_ne!(a, b);
      }
    }
  }
}
