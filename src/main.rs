//! Agro Indicators - Entry Point
//!
//! Initializes configuration, logging, the HTTP transport and the
//! collector. Runs a single collection cycle and prints a report, or
//! collects periodically until SIGINT when an interval is configured.
//!
//! Wiring sequence:
//! 1. Load config (path from AGRO_CONFIG, default config.toml) + validate
//! 2. Init tracing (JSON structured logging)
//! 3. Create ReqwestTransport (header rotation + retries)
//! 4. Create MetricsRegistry and Collector
//! 5. Single run: collect, print report and alerts, exit
//! 6. Periodic run: spawn metrics server on :9090 (/metrics + /live),
//!    collect every interval, graceful shutdown on SIGINT

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::signal;
use tokio::sync::broadcast;
use tracing::{error, info};

use agro_indicators::adapters::http::{ReqwestTransport, SourceClientConfig};
use agro_indicators::adapters::metrics::MetricsRegistry;
use agro_indicators::config::{self, AppConfig};
use agro_indicators::domain::alert::PriceBaseline;
use agro_indicators::domain::snapshot::Snapshot;
use agro_indicators::usecases::{AlertEngine, AlertEvaluation, Collector};

/// Environment variable holding the config file path.
const CONFIG_ENV: &str = "AGRO_CONFIG";

#[tokio::main]
async fn main() -> Result<()> {
    // ── 1. Load configuration ───────────────────────────────
    let config_path = std::env::var(CONFIG_ENV).unwrap_or_else(|_| "config.toml".to_string());
    let config = config::loader::load_config(&config_path)
        .with_context(|| format!("Failed to load configuration from {config_path}"))?;

    // ── 2. Initialize structured JSON logging ───────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.app.log_level)),
        )
        .json()
        .init();

    info!(
        name = %config.app.name,
        version = env!("CARGO_PKG_VERSION"),
        concurrent = config.collection.concurrent,
        interval_seconds = config.collection.interval_seconds,
        "Starting agro indicator collector"
    );

    // ── 3. HTTP transport ───────────────────────────────────
    let transport = Arc::new(
        ReqwestTransport::new(SourceClientConfig::from(&config.http))
            .context("Failed to create HTTP transport")?,
    );

    // ── 4. Metrics + collector ──────────────────────────────
    let metrics = Arc::new(MetricsRegistry::new().context("Failed to register metrics")?);
    let collector = Collector::from_config(&config, transport)
        .context("Failed to build collector")?
        .with_metrics(Arc::clone(&metrics));
    let alerts = AlertEngine::new(&config.alerts);

    if config.collection.interval_seconds == 0 {
        // ── 5. Single run ───────────────────────────────────
        let snapshot = collector.collect_all().await;
        let evaluation = alerts.evaluate(&snapshot, &PriceBaseline::default());
        metrics.record_alerts(&evaluation.alerts);
        print_report(&snapshot, &evaluation);
        return Ok(());
    }

    // ── 6. Periodic run ─────────────────────────────────────
    run_periodic(&config, &collector, &alerts, metrics).await
}

/// Collect every `interval_seconds` until SIGINT.
async fn run_periodic(
    config: &AppConfig,
    collector: &Collector,
    alerts: &AlertEngine,
    metrics: Arc<MetricsRegistry>,
) -> Result<()> {
    let (shutdown_tx, _shutdown_rx) = broadcast::channel::<()>(1);

    let metrics_handle = if config.metrics.enabled {
        let server = Arc::clone(&metrics);
        let bind_address = config.metrics.bind_address.clone();
        let shutdown = shutdown_tx.subscribe();
        Some(tokio::spawn(async move {
            if let Err(e) = server.serve(bind_address, shutdown).await {
                error!(error = %e, "Metrics server failed");
            }
        }))
    } else {
        None
    };

    let mut ticker = tokio::time::interval(Duration::from_secs(config.collection.interval_seconds));
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = signal::ctrl_c() => {
                info!("SIGINT received, initiating graceful shutdown");
                break;
            }
            _ = ticker.tick() => {
                let snapshot = collector.collect_all().await;
                let evaluation = alerts.evaluate(&snapshot, &PriceBaseline::default());
                metrics.record_alerts(&evaluation.alerts);
                info!(
                    cycle_id = %snapshot.cycle_id(),
                    synthetic = snapshot.synthetic_count(),
                    alerts = evaluation.alerts.len(),
                    suppressed = evaluation.suppressed,
                    "Cycle finished"
                );
            }
        }
    }

    let _ = shutdown_tx.send(());
    if let Some(handle) = metrics_handle {
        let _ = tokio::time::timeout(Duration::from_secs(5), handle).await;
    }

    info!("Shutdown complete");
    Ok(())
}

/// Human-readable report for a single run.
fn print_report(snapshot: &Snapshot, evaluation: &AlertEvaluation) {
    println!("=== Agro indicators ({}) ===", snapshot.cycle_id());
    println!(
        "Collected in {:.2} seconds",
        snapshot.duration().as_secs_f64()
    );

    for (family, record) in snapshot.iter() {
        let status = if record.is_synthetic() { "SIMULATED" } else { "REAL" };
        println!("\n{}: {status}", family.key().to_uppercase());
        for (name, value) in record.fields() {
            println!("  {name}: {value}");
        }
    }

    println!();
    if evaluation.suppressed {
        println!(
            "Alerts suppressed: {} of 5 sources simulated",
            evaluation.synthetic_count
        );
    } else if evaluation.alerts.is_empty() {
        println!("No alerts");
    } else {
        for alert in &evaluation.alerts {
            println!(
                "[{:?}] {}: {} ({})",
                alert.severity,
                alert.kind.as_str(),
                alert.message,
                alert.context
            );
        }
    }
}
