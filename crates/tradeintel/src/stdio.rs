//! Newline-delimited JSON-RPC 2.0 over a byte stream.
//!
//! Each input line is one request. Requests run concurrently; responses are
//! funnelled through a single writer task so lines never interleave.
//! Notifications (requests without an `id`) never receive a response.

use std::io;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use tradeintel_models::ToolCallResult;
use tradeintel_tools::Dispatcher;

pub const PROTOCOL_VERSION: &str = "2024-11-05";

pub const PARSE_ERROR: i64 = -32700;
pub const INVALID_REQUEST: i64 = -32600;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;

#[derive(Debug, Deserialize)]
struct RpcRequest {
    #[serde(default)]
    id: Option<Value>,
    method: String,
    #[serde(default)]
    params: Value,
}

#[derive(Debug, Serialize)]
struct RpcResponse {
    jsonrpc: &'static str,
    id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<RpcError>,
}

#[derive(Debug, Serialize)]
struct RpcError {
    code: i64,
    message: String,
}

impl RpcResponse {
    fn result(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: Some(result),
            error: None,
        }
    }

    fn error(id: Value, code: i64, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: None,
            error: Some(RpcError {
                code,
                message: message.into(),
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CallParams {
    name: String,
    #[serde(default)]
    arguments: Value,
}

/// Serve requests from `reader` until EOF or cancellation.
///
/// On EOF, requests already in flight are allowed to finish and their
/// responses are written. On cancellation they are aborted.
pub async fn serve<R, W>(
    dispatcher: Dispatcher,
    reader: R,
    writer: W,
    cancel: CancellationToken,
) -> io::Result<()>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();

    let writer_task = tokio::spawn(async move {
        let mut writer = writer;
        while let Some(line) = rx.recv().await {
            writer.write_all(line.as_bytes()).await?;
            writer.write_all(b"\n").await?;
            writer.flush().await?;
        }
        Ok::<_, io::Error>(())
    });

    info!("JSON-RPC server reading from stream");
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    let mut in_flight = JoinSet::new();

    loop {
        buf.clear();
        let read = tokio::select! {
            _ = cancel.cancelled() => {
                info!("Shutdown requested, stopping JSON-RPC server");
                break;
            }
            read = reader.read_until(b'\n', &mut buf) => read?,
        };
        if read == 0 {
            debug!("Input closed");
            break;
        }

        // Bytes are decoded per line so one bad line cannot end the stream
        let line = match String::from_utf8(std::mem::take(&mut buf)) {
            Ok(line) => line,
            Err(e) => {
                warn!(error = %e, "Request line is not valid UTF-8");
                let response =
                    RpcResponse::error(Value::Null, PARSE_ERROR, format!("Parse error: {e}"));
                send(&tx, &response);
                continue;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let dispatcher = dispatcher.clone();
        let tx = tx.clone();
        in_flight.spawn(async move {
            if let Some(response) = handle_line(&dispatcher, &line).await {
                send(&tx, &response);
            }
        });

        while in_flight.try_join_next().is_some() {}
    }

    if cancel.is_cancelled() {
        in_flight.abort_all();
    }
    while let Some(joined) = in_flight.join_next().await {
        if let Err(e) = joined {
            if e.is_panic() {
                error!(error = %e, "Request handler panicked");
            }
        }
    }

    drop(tx);
    writer_task.await.map_err(io::Error::other)?
}

fn send(tx: &mpsc::UnboundedSender<String>, response: &RpcResponse) {
    match serde_json::to_string(response) {
        Ok(encoded) => {
            // Receiver only closes once the server is shutting down
            let _ = tx.send(encoded);
        }
        Err(e) => error!(error = %e, "Failed to encode response"),
    }
}

async fn handle_line(dispatcher: &Dispatcher, line: &str) -> Option<RpcResponse> {
    let raw: Value = match serde_json::from_str(line) {
        Ok(raw) => raw,
        Err(e) => {
            warn!(error = %e, "Unparseable request line");
            return Some(RpcResponse::error(
                Value::Null,
                PARSE_ERROR,
                format!("Parse error: {e}"),
            ));
        }
    };

    let request: RpcRequest = match serde_json::from_value(raw.clone()) {
        Ok(request) => request,
        Err(e) => {
            let id = raw.get("id").cloned().unwrap_or(Value::Null);
            return Some(RpcResponse::error(
                id,
                INVALID_REQUEST,
                format!("Invalid request: {e}"),
            ));
        }
    };

    let Some(id) = request.id else {
        debug!(method = %request.method, "Notification received");
        return None;
    };

    Some(match dispatch(dispatcher, &request.method, request.params).await {
        Ok(result) => RpcResponse::result(id, result),
        Err(e) => RpcResponse::error(id, e.code, e.message),
    })
}

async fn dispatch(dispatcher: &Dispatcher, method: &str, params: Value) -> Result<Value, RpcError> {
    match method {
        "initialize" => Ok(json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": { "tools": {} },
            "serverInfo": {
                "name": env!("CARGO_PKG_NAME"),
                "version": env!("CARGO_PKG_VERSION"),
            },
        })),
        "ping" => Ok(json!({})),
        "tools/list" => Ok(json!({ "tools": dispatcher.list() })),
        "tools/call" => {
            let params: CallParams = serde_json::from_value(params).map_err(|e| RpcError {
                code: INVALID_PARAMS,
                message: format!("Invalid params: {e}"),
            })?;
            let result = dispatcher.call(&params.name, &params.arguments).await;
            Ok(call_result(result))
        }
        other => Err(RpcError {
            code: METHOD_NOT_FOUND,
            message: format!("Method not found: {other}"),
        }),
    }
}

/// Tool results carry a text rendering alongside the structured payload.
fn call_result(result: ToolCallResult) -> Value {
    let text = serde_json::to_string_pretty(&result.content)
        .unwrap_or_else(|_| result.content.to_string());
    json!({
        "content": [{ "type": "text", "text": text }],
        "structuredContent": result.content,
        "isError": result.is_error,
    })
}
