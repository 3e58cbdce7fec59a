//! Source Parsing Benchmarks - Per-Cycle Parser Cost
//!
//! Benchmarks the parsers that run once per source per collection
//! cycle, on payloads sized like the real responses.
//!
//! Run with: cargo bench --bench parsing_bench

use std::hint::black_box;
use std::sync::Arc;

use async_trait::async_trait;
use criterion::{Criterion, criterion_group, criterion_main};
use serde_json::{Value, json};

use agro_indicators::adapters::sources::chart::parse_chart;
use agro_indicators::adapters::sources::production::find_production;
use agro_indicators::adapters::sources::rainfall::average_rainfall;
use agro_indicators::adapters::sources::{PriceBoardAdapter, Simulator};
use agro_indicators::config::PriceBoardConfig;
use agro_indicators::domain::locale::parse_decimal;
use agro_indicators::ports::transport::{HttpTransport, RawResponse, SourceRequest, TransportError};

struct NoTransport;

#[async_trait]
impl HttpTransport for NoTransport {
    async fn get(&self, _request: &SourceRequest) -> Result<RawResponse, TransportError> {
        Err(TransportError::Request("offline".to_string()))
    }
}

/// Quote page with surrounding noise, like the real board.
fn quote_page() -> String {
    let filler = "<div class=\"menu\"><a href=\"#\">link</a></div>\n".repeat(400);
    format!(
        "<html><body>{filler}<div class=\"box-cotacao\"><h3>R$ 158,50</h3>\
         <span class=\"variacao\">+2,3%</span></div>{filler}</body></html>"
    )
}

/// Benchmark price board extraction.
fn bench_price_board(c: &mut Criterion) {
    let adapter = PriceBoardAdapter::new(
        Arc::new(NoTransport),
        PriceBoardConfig::default(),
        Simulator::seeded(1),
    )
    .unwrap();
    let page = quote_page();

    c.bench_function("price_board_parse_quote", |b| {
        b.iter(|| adapter.parse_quote(black_box(&page)).unwrap());
    });
}

/// Benchmark chart JSON parsing over a 5-day window.
fn bench_chart(c: &mut Criterion) {
    let body = r#"{"chart":{"result":[{"meta":{"symbol":"ZS=F","currency":"USX"},
        "timestamp":[1,2,3,4,5],
        "indicators":{"quote":[{"close":[1480.25,1491.5,null,1502.75,1517.2],
        "open":[1,2,3,4,5],"volume":[10,20,30,40,50]}]}}],"error":null}}"#;

    c.bench_function("chart_parse", |b| {
        b.iter(|| parse_chart(black_box(body)).unwrap());
    });
}

/// Benchmark averaging over a national station list.
fn bench_rainfall(c: &mut Criterion) {
    let states = ["MT", "MS", "GO", "PR", "SC", "RS", "BA", "MG", "SP"];
    let stations: Vec<Value> = (0..600)
        .map(|i| {
            json!({
                "UF": states[i % states.len()],
                "CHUVA": format!("{}.{}", i % 40, i % 10),
                "DC_NOME": format!("STATION {i}"),
            })
        })
        .collect();

    c.bench_function("rainfall_average_600_stations", |b| {
        b.iter(|| average_rainfall(black_box(&stations), black_box("MT")));
    });
}

/// Benchmark crop lookup in the season payload.
fn bench_production(c: &mut Criterion) {
    let payload = json!({"resultados": [
        {"cultura": "Algodao", "producao": 7.4},
        {"cultura": "Arroz", "producao": 10.5},
        {"cultura": "Feijao", "producao": 3.2},
        {"cultura": "Milho", "producao": 115.7},
        {"cultura": "Soja", "producao": "147,4"},
        {"cultura": "Trigo", "producao": 8.1},
    ]});

    c.bench_function("production_find_soja", |b| {
        b.iter(|| find_production(black_box(&payload), black_box("soja")).unwrap());
    });
}

/// Benchmark Brazilian decimal parsing.
fn bench_parse_decimal(c: &mut Criterion) {
    c.bench_function("parse_decimal_brl", |b| {
        b.iter(|| parse_decimal(black_box("R$ 1.158,50")));
    });
}

criterion_group!(
    benches,
    bench_price_board,
    bench_chart,
    bench_rainfall,
    bench_production,
    bench_parse_decimal,
);
criterion_main!(benches);
