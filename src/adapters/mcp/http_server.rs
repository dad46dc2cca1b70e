//! HTTP transport: health, metrics, JSON-RPC envelope, direct tool calls,
//! and discovery documents.
//!
//! The transport validates envelopes, enforces CORS and per-IP rate
//! limits, and translates dispatcher errors into HTTP shapes. It never
//! executes business logic.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::{
    extract::{ConnectInfo, Path, State},
    http::{HeaderValue, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::domain::models::OverallStatus;
use crate::server::Server;
use crate::services::tools::capabilities_document;

use super::rate_limiter::IpRateLimiter;

/// Shared state for every HTTP handler.
#[derive(Clone)]
pub struct AppState {
    server: Arc<Server>,
    limiter: Arc<IpRateLimiter>,
}

/// Build the router with CORS, tracing, and rate limiting applied.
pub fn router(server: Arc<Server>) -> Router {
    let state = AppState { server: Arc::clone(&server), limiter: Arc::new(IpRateLimiter::default_budget()) };

    let cors = if server.ctx.env.is_production() {
        let origins: Vec<HeaderValue> = server
            .ctx
            .env
            .cors_allowed_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();
        CorsLayer::new().allow_origin(origins).allow_methods(Any).allow_headers(Any)
    } else {
        CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
    };

    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .route("/rpc", post(rpc))
        .route("/tools/{name}", post(call_tool))
        .route("/.well-known/mcp", get(discovery))
        .route("/registry", get(registry_entry))
        .layer(middleware::from_fn_with_state(state.clone(), rate_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until the shutdown channel fires.
pub async fn serve(
    server: Arc<Server>,
    port: u16,
    mut shutdown: tokio::sync::broadcast::Receiver<()>,
) -> anyhow::Result<()> {
    let app = router(server);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "HTTP transport listening");

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
        })
        .await?;
    tracing::info!("HTTP transport closed");
    Ok(())
}

/// Token-bucket middleware: 1000 requests per 15 minutes per client IP.
async fn rate_limit(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    request: axum::extract::Request,
    next: Next,
) -> Response {
    let client: IpAddr = peer.ip();
    if !state.limiter.try_acquire(client) {
        return (
            StatusCode::TOO_MANY_REQUESTS,
            Json(json!({ "error": "rate limit exceeded", "retryAfterSecs": 60 })),
        )
            .into_response();
    }
    next.run(request).await
}

async fn health(State(state): State<AppState>) -> Response {
    let status = state.server.ctx.health.status().await;
    let code = if status.status == OverallStatus::Healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (code, Json(status)).into_response()
}

async fn metrics(State(state): State<AppState>) -> Response {
    Json(state.server.ctx.metrics.snapshot()).into_response()
}

/// JSON-RPC envelope endpoint; only `tools/call` is accepted.
async fn rpc(State(state): State<AppState>, Json(request): Json<Value>) -> Response {
    let id = request.get("id").cloned().unwrap_or(Value::Null);
    let method = request.get("method").and_then(Value::as_str).unwrap_or("");

    if method != "tools/call" {
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "error": { "code": -32600, "message": format!("unsupported method: {method}") }
        });
        return (StatusCode::BAD_REQUEST, Json(body)).into_response();
    }

    let params = request.get("params").cloned().unwrap_or_else(|| json!({}));
    let name = params.get("name").and_then(Value::as_str).unwrap_or("");
    let arguments = params.get("arguments").cloned().unwrap_or_else(|| json!({}));

    match state.server.dispatcher.call_envelope(name, arguments).await {
        Ok(result) => Json(json!({ "jsonrpc": "2.0", "id": id, "result": result })).into_response(),
        Err(err) => {
            let body = json!({
                "jsonrpc": "2.0",
                "id": id,
                "error": { "code": err.code(), "message": err.to_string(), "data": err.data() }
            });
            (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
        }
    }
}

/// Direct tool invocation: the body is the argument object.
async fn call_tool(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(arguments): Json<Value>,
) -> Response {
    match state.server.dispatcher.call(&name, arguments).await {
        Ok(result) => Json(result).into_response(),
        Err(err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": err.to_string(), "timestamp": Utc::now() })),
        )
            .into_response(),
    }
}

async fn discovery(State(state): State<AppState>) -> Response {
    let env = &state.server.ctx.env;
    Json(json!({
        "name": "aoma-mesh",
        "version": env.version,
        "endpoints": {
            "health": "/health",
            "metrics": "/metrics",
            "rpc": "/rpc",
            "tools": "/tools/{name}",
            "registry": "/registry",
        },
        "capabilities": {
            "tools": true,
            "resources": true,
            "transports": ["stdio", "http"],
        },
        "lastUpdated": Utc::now(),
    }))
    .into_response()
}

async fn registry_entry(State(state): State<AppState>) -> Response {
    let env = &state.server.ctx.env;
    let capabilities = capabilities_document(env, false);
    Json(json!({
        "name": "aoma-mesh",
        "version": env.version,
        "description": capabilities["description"],
        "toolCount": capabilities["tools"].as_array().map(Vec::len).unwrap_or(0),
        "capabilities": capabilities["capabilities"],
        "health": "/health",
        "lastUpdated": Utc::now(),
    }))
    .into_response()
}
