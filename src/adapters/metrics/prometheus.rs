//! Prometheus Metrics Registry - Collection Observability
//!
//! Registers and exposes Prometheus metrics on :9090. Covers per-source
//! fetch outcomes, which families are currently simulated, cycle
//! duration and raised alerts.

use std::sync::Arc;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::get;
use prometheus::{
    Encoder, GaugeVec, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry,
    TextEncoder,
};
use tokio::sync::broadcast;
use tracing::{info, instrument, warn};

use crate::domain::alert::Alert;
use crate::domain::family::SourceFamily;
use crate::domain::snapshot::Snapshot;
use crate::ports::source::FetchOutcome;

/// Centralized Prometheus metrics for the collector.
///
/// All metrics follow the naming convention `agro_collector_*` and
/// carry a `family` label where they concern one source.
pub struct MetricsRegistry {
    /// Prometheus registry.
    registry: Registry,
    /// Fetches by family, outcome (`observed`/`synthetic`) and failure kind.
    pub fetches: IntCounterVec,
    /// Whether the latest record of a family is synthetic (1) or real (0).
    pub synthetic: GaugeVec,
    /// Collection cycle duration in seconds.
    pub cycle_duration: Histogram,
    /// Completed collection cycles.
    pub cycles: IntCounter,
    /// Alerts raised, by kind.
    pub alerts: IntCounterVec,
    /// Failed summary file writes.
    pub summary_write_failures: IntCounter,
}

impl MetricsRegistry {
    /// Create and register all Prometheus metrics.
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let fetches = IntCounterVec::new(
            Opts::new("agro_collector_fetches_total", "Source fetches by outcome"),
            &["family", "outcome", "kind"],
        )?;

        let synthetic = GaugeVec::new(
            Opts::new(
                "agro_collector_synthetic",
                "Latest record is simulated (1=yes, 0=no)",
            ),
            &["family"],
        )?;

        let cycle_duration = Histogram::with_opts(
            HistogramOpts::new(
                "agro_collector_cycle_duration_seconds",
                "Collection cycle duration in seconds",
            )
            .buckets(vec![0.5, 1.0, 2.0, 5.0, 10.0, 20.0, 45.0, 90.0]),
        )?;

        let cycles = IntCounter::new("agro_collector_cycles_total", "Completed collection cycles")?;

        let alerts = IntCounterVec::new(
            Opts::new("agro_collector_alerts_total", "Alerts raised by kind"),
            &["kind"],
        )?;

        let summary_write_failures = IntCounter::new(
            "agro_collector_summary_write_failures_total",
            "Failed summary file writes",
        )?;

        registry.register(Box::new(fetches.clone()))?;
        registry.register(Box::new(synthetic.clone()))?;
        registry.register(Box::new(cycle_duration.clone()))?;
        registry.register(Box::new(cycles.clone()))?;
        registry.register(Box::new(alerts.clone()))?;
        registry.register(Box::new(summary_write_failures.clone()))?;

        Ok(Self {
            registry,
            fetches,
            synthetic,
            cycle_duration,
            cycles,
            alerts,
            summary_write_failures,
        })
    }

    /// Count one adapter fetch.
    pub fn record_fetch(&self, family: SourceFamily, outcome: &FetchOutcome) {
        let (label, kind) = match outcome.cause() {
            None => ("observed", "none"),
            Some(cause) => ("synthetic", cause.kind().as_str()),
        };
        self.fetches
            .with_label_values(&[family.key(), label, kind])
            .inc();
        self.synthetic
            .with_label_values(&[family.key()])
            .set(if outcome.is_synthetic() { 1.0 } else { 0.0 });
    }

    /// Record a completed cycle.
    pub fn record_cycle(&self, snapshot: &Snapshot) {
        self.cycles.inc();
        self.cycle_duration.observe(snapshot.duration().as_secs_f64());
    }

    /// Count raised alerts.
    pub fn record_alerts(&self, alerts: &[Alert]) {
        for alert in alerts {
            self.alerts.with_label_values(&[alert.kind.as_str()]).inc();
        }
    }

    /// Text exposition of all registered metrics.
    pub fn encode(&self) -> anyhow::Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }

    /// Serve `/metrics` and `/live` on the configured bind address.
    #[instrument(skip(self, shutdown_rx))]
    pub async fn serve(
        self: Arc<Self>,
        bind_address: String,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) -> anyhow::Result<()> {
        let metrics_self = Arc::clone(&self);

        let app = Router::new()
            .route(
                "/metrics",
                get(move || {
                    let metrics = Arc::clone(&metrics_self);
                    async move {
                        metrics.encode().map_err(|e| {
                            warn!(error = %e, "Failed to encode metrics");
                            StatusCode::INTERNAL_SERVER_ERROR
                        })
                    }
                }),
            )
            .route("/live", get(|| async { (StatusCode::OK, "OK") }));

        let listener = tokio::net::TcpListener::bind(&bind_address).await?;
        info!(address = %bind_address, "Prometheus metrics server started");

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
            })
            .await?;

        Ok(())
    }
}
