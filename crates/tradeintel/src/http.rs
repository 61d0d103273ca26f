use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tradeintel_models::{Mode, ToolCallResult};
use tradeintel_tools::{Dispatcher, ToolError};

struct AppState {
    dispatcher: Dispatcher,
    mode: Mode,
}

/// Routes:
///
/// - `GET /health`
/// - `GET /tools`
/// - `POST /tools/{name}` with an optional JSON object body
/// - `GET /market_analysis`, shorthand for `market_overview`
pub fn router(dispatcher: Dispatcher, mode: Mode) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/tools", get(list_tools))
        .route("/tools/{name}", post(call_tool))
        .route("/market_analysis", get(market_analysis))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(Arc::new(AppState { dispatcher, mode }))
}

/// Serve on `listener` until `cancel` fires, then drain open connections.
pub async fn serve(
    listener: TcpListener,
    dispatcher: Dispatcher,
    mode: Mode,
    cancel: CancellationToken,
) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, mode = mode.label(), "HTTP server listening");
    }
    axum::serve(listener, router(dispatcher, mode))
        .with_graceful_shutdown(async move {
            cancel.cancelled().await;
            info!("Shutdown requested, stopping HTTP server");
        })
        .await
}

async fn health(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "mode": state.mode.label(),
        "tools": state.dispatcher.registry().len(),
    }))
}

async fn list_tools(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({ "tools": state.dispatcher.list() }))
}

async fn call_tool(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    body: Bytes,
) -> Response {
    let args = if body.iter().all(u8::is_ascii_whitespace) {
        Value::Null
    } else {
        match serde_json::from_slice::<Value>(&body) {
            Ok(args) => args,
            Err(e) => {
                return reply(Err(ToolError::invalid(
                    "arguments",
                    format!("body is not valid JSON: {e}"),
                )))
            }
        }
    };
    reply(state.dispatcher.try_call(&name, &args).await)
}

async fn market_analysis(State(state): State<Arc<AppState>>) -> Response {
    reply(state.dispatcher.try_call("market_overview", &Value::Null).await)
}

fn reply(outcome: Result<Value, ToolError>) -> Response {
    match outcome {
        Ok(content) => (StatusCode::OK, Json(ToolCallResult::success(content))).into_response(),
        Err(e) => (status_for(&e), Json(ToolCallResult::failure(e.to_content()))).into_response(),
    }
}

fn status_for(error: &ToolError) -> StatusCode {
    match error {
        ToolError::UnknownOperation(_) => StatusCode::NOT_FOUND,
        ToolError::InvalidArguments { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        ToolError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        ToolError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn error_kinds_map_to_statuses() {
        assert_eq!(
            status_for(&ToolError::UnknownOperation("x".into())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_for(&ToolError::invalid("year", "out of range")),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_for(&ToolError::Timeout(Duration::from_secs(1))),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(status_for(&ToolError::Internal), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
