//! Adapters against a local fixture server.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, Query};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use tradeintel_models::{Catalogue, IntelConfig, Mode, Origin, SourceEndpoint};
use tradeintel_sources::{
    CensusAdapter, CommodityAdapter, FxAdapter, FxQuery, HttpFetcher, NewsAdapter, SourceAdapter,
    Sources, TradeQuery,
};

const FEED: &str = r#"<?xml version="1.0"?>
<rss version="2.0"><channel>
  <item>
    <title>Africa trade corridor expands</title>
    <link>https://example.com/corridor</link>
    <description>New shipping lanes open.</description>
  </item>
</channel></rss>"#;

async fn spawn(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

fn fixture_router() -> Router {
    Router::new()
        .route(
            "/fx/{base}",
            get(|Path(base): Path<String>| async move {
                Json(json!({
                    "base": base,
                    "date": "2025-08-30",
                    "rates": {"ETB": 58.1, "GHS": 15.4, "KES": 129.2}
                }))
            }),
        )
        .route(
            "/wb/country/WLD/indicator/{indicator}",
            get(|Path(indicator): Path<String>| async move {
                assert_eq!(indicator, "PCOCOUSD");
                Json(json!([
                    {"page": 1, "pages": 1},
                    [{"date": "2025M07", "value": 7250.0}]
                ]))
            }),
        )
        .route(
            "/census",
            get(|Query(q): Query<Vec<(String, String)>>| async move {
                let has = |k: &str, v: &str| q.iter().any(|(qk, qv)| qk == k && qv == v);
                assert!(has("time", "2024-06"));
                assert!(has("COMM_LVL", "HS4"));
                Json(json!([
                    ["CTY_CODE", "CTY_NAME", "GEN_VAL_MO", "CON_VAL_MO", "I_COMMODITY", "I_COMMODITY_LDESC"],
                    ["5300", "ETHIOPIA", "9100000", "8900000", "0901", "COFFEE"]
                ]))
            }),
        )
        .route("/census-empty", get(|| async { StatusCode::NO_CONTENT }))
        .route("/news", get(|| async { FEED }))
        .route("/broken", get(|| async { StatusCode::INTERNAL_SERVER_ERROR }))
        .route("/garbage", get(|| async { "not json" }))
        .route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Json(Value::Null)
            }),
        )
}

fn http() -> HttpFetcher {
    HttpFetcher::new().unwrap()
}

fn ethiopia_coffee() -> TradeQuery {
    TradeQuery {
        hs_code: "0901".to_string(),
        country_code: "5300".to_string(),
        year: 2024,
        month: 6,
    }
}

#[tokio::test]
async fn fx_live_fetch() {
    let addr = spawn(fixture_router()).await;
    let fx = FxAdapter::new(
        SourceEndpoint::new(format!("http://{addr}/fx"), 5),
        http(),
        Mode::live(),
        Catalogue::default().fallback_fx,
    );

    let result = fx.fetch(&FxQuery::new("USD", &["ETB".into()])).await;
    assert_eq!(result.origin, Origin::Live);
    assert_eq!(result.value.rates.len(), 1);
    assert_eq!(result.value.rates["ETB"], dec!(58.1));
}

#[tokio::test]
async fn commodity_live_fetch_scales_indicator() {
    let addr = spawn(fixture_router()).await;
    let adapter = CommodityAdapter::new(
        SourceEndpoint::new(format!("http://{addr}/wb"), 5),
        http(),
        Mode::live(),
    );
    let cocoa = Catalogue::default().commodity("cocoa").unwrap().clone();

    let result = adapter.fetch(&cocoa).await;
    assert_eq!(result.origin, Origin::Live);
    // 7250 USD/mt
    assert_eq!(result.value.price, dec!(7.25));
    assert_eq!(result.value.period.as_deref(), Some("2025M07"));
}

#[tokio::test]
async fn census_live_fetch() {
    let addr = spawn(fixture_router()).await;
    let census = CensusAdapter::new(
        SourceEndpoint::new(format!("http://{addr}/census"), 5),
        http(),
        Mode::live(),
        Vec::new(),
    );

    let result = census.fetch(&ethiopia_coffee()).await;
    assert_eq!(result.origin, Origin::Live);
    assert_eq!(result.value.len(), 1);
    assert_eq!(result.value[0].general_value, dec!(9100000));
}

#[tokio::test]
async fn census_no_content_is_empty_live_result() {
    let addr = spawn(fixture_router()).await;
    let census = CensusAdapter::new(
        SourceEndpoint::new(format!("http://{addr}/census-empty"), 5),
        http(),
        Mode::live(),
        Catalogue::default().sample_trade,
    );

    let result = census.fetch(&ethiopia_coffee()).await;
    assert_eq!(result.origin, Origin::Live);
    assert!(result.value.is_empty());
}

#[tokio::test]
async fn news_live_fetch() {
    let addr = spawn(fixture_router()).await;
    let news = NewsAdapter::new(
        SourceEndpoint::new(format!("http://{addr}/news"), 5),
        http(),
        Mode::live(),
        Vec::new(),
    );

    let result = news.fetch(&()).await;
    assert_eq!(result.origin, Origin::Live);
    assert_eq!(result.value[0].link, "https://example.com/corridor");
}

#[tokio::test]
async fn error_status_falls_back() {
    let addr = spawn(fixture_router()).await;
    let news = NewsAdapter::new(
        SourceEndpoint::new(format!("http://{addr}/broken"), 5),
        http(),
        Mode::live(),
        Catalogue::default().default_news,
    );

    let result = news.fetch(&()).await;
    assert_eq!(result.origin, Origin::Fallback);
    assert!(result.error.unwrap().contains("500"));
    assert_eq!(result.value.len(), 2);
}

#[tokio::test]
async fn malformed_body_falls_back() {
    let addr = spawn(fixture_router()).await;
    let fx = FxAdapter::new(
        SourceEndpoint::new(format!("http://{addr}/garbage"), 5),
        http(),
        Mode::live(),
        Catalogue::default().fallback_fx,
    );

    let result = fx.fetch(&FxQuery::all("USD")).await;
    assert_eq!(result.origin, Origin::Fallback);
    assert_eq!(result.value.rates["ETB"], dec!(57.45));
}

#[tokio::test]
async fn timeout_falls_back_within_budget() {
    let addr = spawn(fixture_router()).await;
    let census = CensusAdapter::new(
        SourceEndpoint::new(format!("http://{addr}/slow"), 1),
        http(),
        Mode::live(),
        Catalogue::default().sample_trade,
    );

    let started = std::time::Instant::now();
    let result = census.fetch(&ethiopia_coffee()).await;
    assert!(started.elapsed() < Duration::from_secs(3));
    assert_eq!(result.origin, Origin::Fallback);
    assert!(result.error.unwrap().contains("timed out"));
    assert_eq!(result.value[0].country_name, "ETHIOPIA");
}

#[tokio::test]
async fn unreachable_upstream_falls_back() {
    // Bind then drop to get a port nothing listens on
    let addr = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };
    let fx = FxAdapter::new(
        SourceEndpoint::new(format!("http://{addr}"), 2),
        http(),
        Mode::live(),
        Catalogue::default().fallback_fx,
    );

    let result = fx.fetch(&FxQuery::all("USD")).await;
    assert_eq!(result.origin, Origin::Fallback);
    assert!(result.error.is_some());
}

#[tokio::test]
async fn simulated_mode_makes_no_network_calls() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let connections = Arc::new(AtomicUsize::new(0));
    {
        let connections = connections.clone();
        tokio::spawn(async move {
            while listener.accept().await.is_ok() {
                connections.fetch_add(1, Ordering::SeqCst);
            }
        });
    }

    let mut config = IntelConfig::default();
    config.mode = Mode::simulated();
    let url = format!("http://{addr}");
    config.sources.census.base_url = url.clone();
    config.sources.world_bank.base_url = url.clone();
    config.sources.fx.base_url = url.clone();
    config.sources.news.base_url = url;

    let catalogue = Catalogue::default();
    let sources = Sources::from_config(&config, &catalogue).unwrap();

    let fx = sources.fx.fetch(&FxQuery::all("USD")).await;
    let coffee = sources
        .commodity
        .fetch(catalogue.commodity("coffee").unwrap())
        .await;
    let trade = sources.trade.fetch(&ethiopia_coffee()).await;
    let news = sources.news.fetch(&()).await;
    let weather = sources.weather.fetch(&"ET".to_string()).await;

    for origin in [fx.origin, coffee.origin, trade.origin, news.origin, weather.origin] {
        assert_eq!(origin, Origin::Fallback);
    }
    assert_eq!(coffee.value.price, dec!(7.80));

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(connections.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn fallback_is_deterministic() {
    let sources = Sources::from_config(&IntelConfig::default(), &Catalogue::default()).unwrap();
    let a = sources.fx.fetch(&FxQuery::all("GHS")).await;
    let b = sources.fx.fetch(&FxQuery::all("GHS")).await;
    assert_eq!(a, b);
}
