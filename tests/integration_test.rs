//! Integration Tests - End-to-end Collection Cycles
//!
//! Drives the collector through a mocked `HttpTransport` port with
//! realistic source payloads and every combination of failing sources.
//! Uses mockall for trait mocking and tokio::test for async tests.

use std::sync::Arc;

use mockall::mock;

use agro_indicators::config::AppConfig;
use agro_indicators::domain::family::SourceFamily;
use agro_indicators::domain::snapshot::Snapshot;
use agro_indicators::ports::transport::{RawResponse, SourceRequest, TransportError};
use agro_indicators::usecases::{AlertEngine, Collector};
use agro_indicators::domain::alert::PriceBaseline;

// ---- Mock Definitions ----

mock! {
    pub Transport {}

    #[async_trait::async_trait]
    impl agro_indicators::ports::transport::HttpTransport for Transport {
        async fn get(&self, request: &SourceRequest) -> Result<RawResponse, TransportError>;
    }
}

// ---- Fixtures ----

const CEPEA_PAGE: &str = r#"<html><body>
<div class="box-cotacao"><h3>R$ 158,50</h3><span class="variacao">+2,3%</span></div>
</body></html>"#;

const FUTURES_CHART: &str =
    r#"{"chart":{"result":[{"indicators":{"quote":[{"close":[14.80,15.10]}]}}],"error":null}}"#;

const CURRENCY_CHART: &str =
    r#"{"chart":{"result":[{"indicators":{"quote":[{"close":[5.00,5.05]}]}}],"error":null}}"#;

const INMET_STATIONS: &str = r#"[
  {"UF":"MT","CHUVA":"12.0","DC_NOME":"SORRISO"},
  {"UF":"MT","CHUVA":"8.0","DC_NOME":"SINOP"},
  {"UF":"PR","CHUVA":"40.0","DC_NOME":"LONDRINA"}
]"#;

const CONAB_SEASON: &str = r#"{"resultados":[{"cultura":"Soja","producao":147.38},{"cultura":"Milho","producao":115.7}]}"#;

fn family_of(url: &str) -> SourceFamily {
    if url.contains("cepea") {
        SourceFamily::PriceBoard
    } else if url.contains("ZS=F") {
        SourceFamily::Futures
    } else if url.contains("BRL=X") {
        SourceFamily::Currency
    } else if url.contains("inmet") {
        SourceFamily::Rainfall
    } else {
        SourceFamily::Production
    }
}

fn healthy_body(family: SourceFamily) -> &'static str {
    match family {
        SourceFamily::PriceBoard => CEPEA_PAGE,
        SourceFamily::Futures => FUTURES_CHART,
        SourceFamily::Currency => CURRENCY_CHART,
        SourceFamily::Rainfall => INMET_STATIONS,
        SourceFamily::Production => CONAB_SEASON,
    }
}

/// A failure response, varied by family so every failure kind is exercised.
fn failure(family: SourceFamily) -> Result<RawResponse, TransportError> {
    match family {
        SourceFamily::PriceBoard => Ok(RawResponse::new(200, "<html>layout changed</html>")),
        SourceFamily::Futures => Ok(RawResponse::new(503, "")),
        SourceFamily::Currency => Err(TransportError::Connect("connection refused".to_string())),
        SourceFamily::Rainfall => Ok(RawResponse::new(200, r#"{"error":"maintenance"}"#)),
        SourceFamily::Production => Ok(RawResponse::new(200, "not json")),
    }
}

fn is_failing(mask: u8, family: SourceFamily) -> bool {
    let slot = SourceFamily::ALL.iter().position(|f| *f == family).unwrap();
    mask & (1 << slot) != 0
}

fn transport_with_failures(mask: u8) -> MockTransport {
    let mut transport = MockTransport::new();
    transport.expect_get().returning(move |request| {
        let family = family_of(&request.url);
        if is_failing(mask, family) {
            failure(family)
        } else {
            Ok(RawResponse::new(200, healthy_body(family)))
        }
    });
    transport
}

fn test_config(summary_path: &str) -> AppConfig {
    let mut config = AppConfig::default();
    config.collection.summary_path = summary_path.to_string();
    config.collection.seed = Some(2024);
    config.sources.price_board.pre_request_delay_ms = 0;
    config
}

async fn collect(mask: u8, config: &AppConfig) -> Snapshot {
    let collector = Collector::from_config(config, Arc::new(transport_with_failures(mask))).unwrap();
    collector.collect_all().await
}

// ---- Integration Tests ----

#[tokio::test]
async fn test_every_failure_combination_yields_complete_snapshot() {
    let config = test_config("");

    for mask in 0u8..32 {
        let snapshot = collect(mask, &config).await;
        let json = serde_json::to_value(&snapshot).unwrap();

        for family in SourceFamily::ALL {
            let record = snapshot.get(family);
            assert_eq!(
                record.is_synthetic(),
                is_failing(mask, family),
                "mask {mask:05b} family {family}"
            );
            assert!(record.value().is_finite());
            assert!(json[family.key()]["source_tag"].is_string());
        }
        assert_eq!(snapshot.synthetic_count(), mask.count_ones() as usize);
    }
}

#[tokio::test]
async fn test_healthy_sources_produce_real_values() {
    let snapshot = collect(0, &test_config("")).await;

    let cepea = snapshot.get(SourceFamily::PriceBoard);
    assert_eq!(cepea.value(), 158.5);
    assert_eq!(cepea.change(), Some("+2,3%"));
    assert_eq!(cepea.source_tag().as_str(), "CEPEA/ESALQ");

    let b3 = snapshot.get(SourceFamily::Futures);
    assert_eq!(b3.value(), 15.1);
    assert_eq!(b3.change(), Some("+2.03%"));

    let usd = snapshot.get(SourceFamily::Currency);
    assert_eq!(usd.value(), 5.05);
    assert_eq!(usd.change(), Some("+1.00%"));

    assert_eq!(snapshot.get(SourceFamily::Rainfall).value(), 10.0);
    assert_eq!(snapshot.get(SourceFamily::Production).value(), 147.4);
}

#[tokio::test]
async fn test_synthetic_values_stay_in_profile_ranges() {
    let snapshot = collect(0b11111, &test_config("")).await;

    assert!((145.0..=160.0).contains(&snapshot.get(SourceFamily::PriceBoard).value()));
    assert!((14.5..=16.0).contains(&snapshot.get(SourceFamily::Futures).value()));
    assert!((4.8..=5.3).contains(&snapshot.get(SourceFamily::Currency).value()));
    assert!((0.0..=50.0).contains(&snapshot.get(SourceFamily::Rainfall).value()));
    assert!((140.0..=165.0).contains(&snapshot.get(SourceFamily::Production).value()));

    for (family, record) in snapshot.iter() {
        assert_eq!(
            record.source_tag().as_str(),
            format!("{}_SIMULADO", family.synthetic_prefix())
        );
    }
}

#[tokio::test]
async fn test_each_source_requested_once_per_cycle() {
    let mut transport = MockTransport::new();
    transport
        .expect_get()
        .times(5)
        .returning(|request| Ok(RawResponse::new(200, healthy_body(family_of(&request.url)))));

    let collector = Collector::from_config(&test_config(""), Arc::new(transport)).unwrap();
    let snapshot = collector.collect_all().await;
    assert!(snapshot.is_fully_observed());
}

#[tokio::test]
async fn test_concurrent_mode_matches_sequential_shape() {
    let mut config = test_config("");
    config.collection.concurrent = true;

    let snapshot = collect(0b00110, &config).await;
    assert_eq!(snapshot.keys(), ["cepea", "b3", "usd", "inmet", "conab"]);
    assert!(snapshot.get(SourceFamily::Futures).is_synthetic());
    assert!(snapshot.get(SourceFamily::Currency).is_synthetic());
    assert!(!snapshot.get(SourceFamily::Rainfall).is_synthetic());
}

#[tokio::test]
async fn test_summary_file_written_each_cycle() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("collector_summary.log");
    let config = test_config(path.to_str().unwrap());

    let snapshot = collect(0b00010, &config).await;
    let text = std::fs::read_to_string(&path).unwrap();

    assert!(text.starts_with("Collection summary - "));
    assert!(text.contains(&format!("Cycle: {}", snapshot.cycle_id())));
    assert!(text.contains("[CEPEA] - SUCCESS"));
    assert!(text.contains("[B3] - SIMULATED"));
    assert!(text.contains("  source_tag: B3_SIMULADO"));
    assert!(text.contains("[CONAB] - SUCCESS"));
}

#[tokio::test]
async fn test_alerts_suppressed_when_mostly_simulated() {
    let engine = AlertEngine::new(&AppConfig::default().alerts);

    let degraded = collect(0b01011, &test_config("")).await;
    let evaluation = engine.evaluate(&degraded, &PriceBaseline::default());
    assert!(evaluation.suppressed);
    assert!(evaluation.alerts.is_empty());

    // Real rainfall of 10mm is below the drought threshold
    let healthy = collect(0, &test_config("")).await;
    let evaluation = engine.evaluate(&healthy, &PriceBaseline::default());
    assert!(!evaluation.suppressed);
    assert_eq!(evaluation.alerts.len(), 1);
}
