use std::collections::HashMap;

use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream, Lines, ReadHalf, WriteHalf};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tradeintel::models::IntelConfig;
use tradeintel::stdio;

struct Session {
    input: WriteHalf<DuplexStream>,
    output: Lines<BufReader<ReadHalf<DuplexStream>>>,
    cancel: CancellationToken,
    server: JoinHandle<std::io::Result<()>>,
}

impl Session {
    fn start() -> Self {
        let dispatcher = tradeintel::build_dispatcher(&IntelConfig::default()).unwrap();
        let (client, server) = tokio::io::duplex(256 * 1024);
        let (server_read, server_write) = tokio::io::split(server);
        let (client_read, client_write) = tokio::io::split(client);
        let cancel = CancellationToken::new();
        let server = tokio::spawn(stdio::serve(
            dispatcher,
            server_read,
            server_write,
            cancel.clone(),
        ));
        Self {
            input: client_write,
            output: BufReader::new(client_read).lines(),
            cancel,
            server,
        }
    }

    async fn send(&mut self, line: &str) {
        self.input.write_all(line.as_bytes()).await.unwrap();
        self.input.write_all(b"\n").await.unwrap();
    }

    async fn request(&mut self, request: Value) -> Value {
        self.send(&request.to_string()).await;
        self.recv().await
    }

    async fn recv(&mut self) -> Value {
        let line = self.output.next_line().await.unwrap().expect("response line");
        serde_json::from_str(&line).unwrap()
    }
}

#[tokio::test]
async fn initialize_reports_server_info() {
    let mut session = Session::start();
    let response = session
        .request(json!({"jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {}}))
        .await;

    assert_eq!(response["id"], 1);
    assert_eq!(response["result"]["protocolVersion"], stdio::PROTOCOL_VERSION);
    assert_eq!(response["result"]["serverInfo"]["name"], "tradeintel");
    assert!(response["result"]["capabilities"]["tools"].is_object());
}

#[tokio::test]
async fn tools_list_returns_catalogue() {
    let mut session = Session::start();
    let response = session
        .request(json!({"jsonrpc": "2.0", "id": "list", "method": "tools/list"}))
        .await;

    assert_eq!(response["id"], "list");
    let tools = response["result"]["tools"].as_array().unwrap();
    assert_eq!(tools.len(), 11);
    assert_eq!(tools[0]["name"], "get_exchange_rates");
    assert_eq!(tools[0]["inputSchema"]["type"], "object");
}

#[tokio::test]
async fn tools_call_returns_text_and_structured_content() {
    let mut session = Session::start();
    let response = session
        .request(json!({
            "jsonrpc": "2.0",
            "id": 7,
            "method": "tools/call",
            "params": {"name": "get_exchange_rates", "arguments": {"symbols": ["ETB"]}}
        }))
        .await;

    let result = &response["result"];
    assert_eq!(result["isError"], false);
    assert_eq!(result["structuredContent"]["rates"]["ETB"], "57.45");
    assert_eq!(result["content"][0]["type"], "text");
    let text: Value = serde_json::from_str(result["content"][0]["text"].as_str().unwrap()).unwrap();
    assert_eq!(text, result["structuredContent"]);
}

#[tokio::test]
async fn tool_failures_are_results_not_protocol_errors() {
    let mut session = Session::start();
    let response = session
        .request(json!({
            "jsonrpc": "2.0",
            "id": 2,
            "method": "tools/call",
            "params": {"name": "no_such_tool", "arguments": {}}
        }))
        .await;

    assert!(response.get("error").is_none());
    assert_eq!(response["result"]["isError"], true);
    assert_eq!(response["result"]["structuredContent"]["kind"], "unknown_operation");
}

#[tokio::test]
async fn protocol_errors_use_json_rpc_codes() {
    let mut session = Session::start();

    session.send("{not json").await;
    let response = session.recv().await;
    assert_eq!(response["error"]["code"], stdio::PARSE_ERROR);
    assert!(response["id"].is_null());

    let response = session
        .request(json!({"jsonrpc": "2.0", "id": 3, "method": "resources/list"}))
        .await;
    assert_eq!(response["error"]["code"], stdio::METHOD_NOT_FOUND);

    let response = session
        .request(json!({"jsonrpc": "2.0", "id": 4, "method": "tools/call"}))
        .await;
    assert_eq!(response["error"]["code"], stdio::INVALID_PARAMS);
    assert_eq!(response["id"], 4);
}

#[tokio::test]
async fn invalid_utf8_line_does_not_stop_the_server() {
    let mut session = Session::start();
    session
        .input
        .write_all(b"{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"ping\",\"x\":\"\xff\"}\n")
        .await
        .unwrap();

    let response = session.recv().await;
    assert_eq!(response["error"]["code"], stdio::PARSE_ERROR);
    assert!(response["id"].is_null());

    let response = session
        .request(json!({"jsonrpc": "2.0", "id": 2, "method": "ping"}))
        .await;
    assert_eq!(response["id"], 2);
    assert_eq!(response["result"], json!({}));
    assert!(!session.server.is_finished());
}

#[tokio::test]
async fn notifications_get_no_response() {
    let mut session = Session::start();
    session
        .send(&json!({"jsonrpc": "2.0", "method": "notifications/initialized"}).to_string())
        .await;
    let response = session
        .request(json!({"jsonrpc": "2.0", "id": 9, "method": "ping"}))
        .await;
    assert_eq!(response["id"], 9);
}

#[tokio::test]
async fn concurrent_requests_all_answered() {
    let mut session = Session::start();
    for id in 0..5 {
        let request = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": "tools/call",
            "params": {"name": "get_weather", "arguments": {"country_code": "GH"}}
        });
        session.send(&request.to_string()).await;
    }

    let mut seen = HashMap::new();
    for _ in 0..5 {
        let response = session.recv().await;
        seen.insert(response["id"].as_i64().unwrap(), response);
    }
    assert_eq!(seen.len(), 5);
    assert!(seen
        .values()
        .all(|r| r["result"]["structuredContent"]["country_code"] == "GH"));
}

#[tokio::test]
async fn server_stops_on_eof_after_answering() {
    let mut session = Session::start();
    session
        .send(&json!({"jsonrpc": "2.0", "id": 1, "method": "ping"}).to_string())
        .await;
    session.input.shutdown().await.unwrap();

    let response = session.recv().await;
    assert_eq!(response["result"], json!({}));
    session.server.await.unwrap().unwrap();
}

#[tokio::test]
async fn server_stops_on_cancel() {
    let session = Session::start();
    session.cancel.cancel();
    session.server.await.unwrap().unwrap();
}
