use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tradeintel::cache::TtlCache;
use tradeintel::models::{Catalogue, IntelConfig, Mode};
use tradeintel::sources::test_support::SlowAdapter;
use tradeintel::sources::Sources;
use tradeintel::tools::{Aggregator, Dispatcher, ToolRegistry};

struct Server {
    base: String,
    cancel: CancellationToken,
    handle: JoinHandle<std::io::Result<()>>,
}

async fn start(dispatcher: Dispatcher) -> Server {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    let cancel = CancellationToken::new();
    let handle = tokio::spawn(tradeintel::http::serve(
        listener,
        dispatcher,
        Mode::simulated(),
        cancel.clone(),
    ));
    Server {
        base: format!("http://{addr}"),
        cancel,
        handle,
    }
}

async fn start_default() -> Server {
    start(tradeintel::build_dispatcher(&IntelConfig::default()).unwrap()).await
}

#[tokio::test]
async fn health_reports_mode_and_tool_count() {
    let server = start_default().await;
    let body: Value = reqwest::get(format!("{}/health", server.base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["mode"], "simulated");
    assert_eq!(body["tools"], 11);
}

#[tokio::test]
async fn lists_tools() {
    let server = start_default().await;
    let body: Value = reqwest::get(format!("{}/tools", server.base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["tools"].as_array().unwrap().len(), 11);
}

#[tokio::test]
async fn calls_tool_with_json_body() {
    let server = start_default().await;
    let response = reqwest::Client::new()
        .post(format!("{}/tools/get_weather", server.base))
        .json(&json!({"country_code": "gh"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["isError"], false);
    assert_eq!(body["content"]["country_code"], "GH");
}

#[tokio::test]
async fn empty_body_means_no_arguments() {
    let server = start_default().await;
    let response = reqwest::Client::new()
        .post(format!("{}/tools/get_exchange_rates", server.base))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["content"]["base"], "USD");
}

#[tokio::test]
async fn error_kinds_map_to_status_codes() {
    let server = start_default().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/tools/nope", server.base))
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["isError"], true);
    assert_eq!(body["content"]["kind"], "unknown_operation");

    let response = client
        .post(format!("{}/tools/scan_arbitrage_opportunities", server.base))
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 422);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["content"]["field"], "min_margin");

    let response = client
        .post(format!("{}/tools/get_weather", server.base))
        .body("country_code=GH")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 422);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["content"]["field"], "arguments");
}

#[tokio::test]
async fn slow_call_returns_gateway_timeout() {
    let config = IntelConfig::default();
    let catalogue = Catalogue::default();
    let mut sources = Sources::from_config(&config, &catalogue).unwrap();
    sources.fx = Arc::new(SlowAdapter::new(sources.fx.clone(), Duration::from_secs(5)));
    let aggregator = Aggregator::new(
        sources,
        Arc::new(TtlCache::new(config.cache.max_entries)),
        config.cache.ttl_seconds.clone(),
        Arc::new(catalogue.clone()),
    );
    let registry = ToolRegistry::standard(&catalogue).unwrap();
    let server = start(Dispatcher::new(registry, aggregator, Duration::from_millis(200))).await;

    let response = reqwest::Client::new()
        .post(format!("{}/tools/get_exchange_rates", server.base))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 504);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["content"]["kind"], "timeout");
}

#[tokio::test]
async fn market_analysis_runs_overview() {
    let server = start_default().await;
    let response = reqwest::get(format!("{}/market_analysis", server.base))
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["content"]["opportunity_count"], 6);
}

#[tokio::test]
async fn shuts_down_on_cancel() {
    let server = start_default().await;
    server.cancel.cancel();
    tokio::time::timeout(Duration::from_secs(5), server.handle)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
}
