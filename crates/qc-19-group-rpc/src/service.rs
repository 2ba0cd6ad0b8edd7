//! Group RPC service - HTTP JSON-RPC server.
//!
//! Requests are decoded on the async runtime and executed on the blocking
//! pool. A semaphore sized `worker_threads` bounds how many calls run in
//! the synchronous core at once.

use std::future::Future;
use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tokio::sync::Semaphore;
use tower::ServiceBuilder;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, instrument};

use crate::domain::{CallContext, GatewayError, RpcConfig, RpcError};
use crate::ports::GroupRpcApi;
use crate::router::route_method;

/// Longest accepted string request id.
const MAX_ID_LEN: usize = 256;

/// HTTP front end over a [`GroupRpcApi`].
pub struct GroupRpcService {
    config: RpcConfig,
    api: Arc<dyn GroupRpcApi>,
    workers: Arc<Semaphore>,
}

impl GroupRpcService {
    /// Create the service; fails on invalid configuration.
    pub fn new(config: RpcConfig, api: Arc<dyn GroupRpcApi>) -> Result<Self, GatewayError> {
        config
            .validate()
            .map_err(|e| GatewayError::Config(e.to_string()))?;
        let workers = Arc::new(Semaphore::new(config.worker_threads));
        Ok(Self {
            config,
            api,
            workers,
        })
    }

    /// Active configuration.
    pub fn config(&self) -> &RpcConfig {
        &self.config
    }

    /// Build the HTTP router.
    pub fn router(&self) -> Router {
        let state = AppState {
            api: Arc::clone(&self.api),
            workers: Arc::clone(&self.workers),
            max_batch_size: self.config.limits.max_batch_size,
        };

        let middleware = ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(RequestBodyLimitLayer::new(self.config.limits.max_request_size));

        Router::new()
            .route("/", post(handle_json_rpc))
            .route("/health", get(health_check))
            .layer(middleware)
            .with_state(state)
    }

    /// Serve until `shutdown` resolves.
    pub async fn serve<F>(self, shutdown: F) -> Result<(), GatewayError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if !self.config.http.enabled {
            info!("[qc-19] HTTP server disabled");
            return Ok(());
        }

        let addr = self.config.http_addr();
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| GatewayError::Bind(format!("{}: {}", addr, e)))?;
        info!(addr = %addr, "[qc-19] group RPC listening");

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| GatewayError::Server(e.to_string()))?;

        info!("[qc-19] group RPC stopped");
        Ok(())
    }
}

/// Application state shared across handlers
#[derive(Clone)]
struct AppState {
    api: Arc<dyn GroupRpcApi>,
    workers: Arc<Semaphore>,
    max_batch_size: usize,
}

async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "qc-19-group-rpc",
        "version": crate::VERSION,
    }))
}

/// Handle JSON-RPC request
#[instrument(skip(state, body), fields(len = body.len()))]
async fn handle_json_rpc(State(state): State<AppState>, body: String) -> impl IntoResponse {
    let request: Value = match serde_json::from_str(&body) {
        Ok(v) => v,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(error_response(Value::Null, &RpcError::parse_error(e.to_string()))),
            );
        }
    };

    let response = match request {
        Value::Array(requests) => {
            if requests.is_empty() {
                error_response(Value::Null, &RpcError::invalid_request("empty batch"))
            } else if requests.len() > state.max_batch_size {
                error_response(
                    Value::Null,
                    &RpcError::limit_exceeded(format!(
                        "batch of {} exceeds {}",
                        requests.len(),
                        state.max_batch_size
                    )),
                )
            } else {
                // Spawn every call first so a batch runs in parallel.
                let handles: Vec<_> = requests
                    .into_iter()
                    .map(|req| {
                        let state = state.clone();
                        tokio::spawn(async move { run_blocking(&state, req).await })
                    })
                    .collect();

                let mut responses = Vec::with_capacity(handles.len());
                for handle in handles {
                    responses.push(handle.await.unwrap_or_else(|e| {
                        error!("[qc-19] batch task failed: {}", e);
                        error_response(Value::Null, &RpcError::internal())
                    }));
                }
                Value::Array(responses)
            }
        }
        single => run_blocking(&state, single).await,
    };

    (StatusCode::OK, Json(response))
}

/// Run one request on the blocking pool.
async fn run_blocking(state: &AppState, request: Value) -> Value {
    let id = request.get("id").cloned().unwrap_or(Value::Null);
    let permit = match Arc::clone(&state.workers).acquire_owned().await {
        Ok(permit) => permit,
        Err(e) => {
            error!("[qc-19] worker pool closed: {}", e);
            return error_response(id, &RpcError::internal());
        }
    };

    let api = Arc::clone(&state.api);
    let handle = tokio::task::spawn_blocking(move || {
        let _permit = permit;
        process_single_request(api.as_ref(), &request)
    });

    match handle.await {
        Ok(response) => response,
        Err(e) => {
            // The call context was dropped while unwinding.
            error!("[qc-19] request worker failed: {}", e);
            error_response(id, &RpcError::internal())
        }
    }
}

/// Process a single JSON-RPC request
fn process_single_request(api: &dyn GroupRpcApi, request: &Value) -> Value {
    if !request.is_object() {
        return error_response(
            Value::Null,
            &RpcError::invalid_request("request must be an object"),
        );
    }

    let id = request.get("id").cloned();

    // Validate request ID (JSON-RPC 2.0)
    if let Some(ref id_val) = id {
        if id_val.is_null() {
            return error_response(
                Value::Null,
                &RpcError::invalid_request("null id (notifications not supported)"),
            );
        }

        if let Some(s) = id_val.as_str() {
            if s.is_empty() {
                return error_response(Value::Null, &RpcError::invalid_request("empty string id"));
            }
            if s.len() > MAX_ID_LEN {
                return error_response(
                    Value::Null,
                    &RpcError::invalid_request(format!(
                        "id string too long (max {} chars)",
                        MAX_ID_LEN
                    )),
                );
            }
        }

        if !id_val.is_string() && !id_val.is_number() {
            return error_response(
                Value::Null,
                &RpcError::invalid_request("id must be string or number"),
            );
        }
    }
    let id = id.unwrap_or(Value::Null);

    if request.get("jsonrpc").and_then(Value::as_str) != Some("2.0") {
        return error_response(id, &RpcError::invalid_request("jsonrpc must be \"2.0\""));
    }

    let Some(method) = request.get("method").and_then(Value::as_str) else {
        return error_response(id, &RpcError::invalid_request("missing method"));
    };
    let params = request.get("params");

    // One context per call; released when this frame exits.
    let mut ctx = CallContext::new();
    match route_method(api, method, params, &mut ctx) {
        Ok(result) => json!({
            "jsonrpc": "2.0",
            "id": id,
            "result": result,
        }),
        Err(e) => error_response(id, &e),
    }
}

fn error_response(id: Value, error: &RpcError) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": error,
    })
}
