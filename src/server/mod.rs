//! HTTP transport for glass-mind
//!
//! Axum router serving `POST /api/think` plus plain JSON health, info, and
//! metrics endpoints.

use axum::{
    Router,
    body::Body,
    extract::{Request, State},
    http::{StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::json;
use std::{cmp::Ordering, sync::Arc, time::Instant};
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};

use crate::clients::ModelClient;
use crate::config::Config;
use crate::error::{GlassMindError, Result};
use crate::prompts::PromptRegistry;

pub mod think;

pub use think::{ThinkRequest, ThinkResponse, answer_question, think_handler};

pub const THINK_PATH: &str = "/api/think";

const LATENCY_WINDOW: usize = 256;

/// Shared state for HTTP server
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub client: Arc<dyn ModelClient>,
    pub prompts: Arc<PromptRegistry>,
    pub metrics: Arc<Mutex<HttpMetrics>>,
}

impl AppState {
    pub fn new(config: Config, client: Arc<dyn ModelClient>) -> Self {
        Self {
            config: Arc::new(config),
            client,
            prompts: Arc::new(PromptRegistry::new()),
            metrics: Arc::new(Mutex::new(HttpMetrics::new())),
        }
    }
}

/// Metrics for the think endpoint
#[derive(Debug, Clone)]
pub struct HttpMetrics {
    pub total_requests: u64,
    pub last_request_unix: u64,
    pub errors_total: u64,
    pub latencies: Vec<f64>, // ring buffer for p95
}

impl Default for HttpMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpMetrics {
    pub fn new() -> Self {
        Self {
            total_requests: 0,
            last_request_unix: unix_now(),
            errors_total: 0,
            latencies: Vec::with_capacity(LATENCY_WINDOW),
        }
    }

    pub fn record(&mut self, latency_ms: f64, success: bool) {
        if latency_ms > 0.0 {
            self.latencies.push(latency_ms);
            if self.latencies.len() > LATENCY_WINDOW {
                self.latencies.remove(0);
            }
        }
        if !success {
            self.errors_total = self.errors_total.saturating_add(1);
        }
        self.total_requests = self.total_requests.saturating_add(1);
        self.last_request_unix = unix_now();
    }

    /// Average and p95 latency in milliseconds
    pub fn latency_stats(&self) -> (Option<f64>, Option<f64>) {
        if self.latencies.is_empty() {
            return (None, None);
        }
        let sum: f64 = self.latencies.iter().sum();
        let avg = sum / self.latencies.len() as f64;
        let mut sorted = self.latencies.clone();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
        let p95_idx = ((sorted.len() as f64 * 0.95) as usize).min(sorted.len() - 1);
        (Some(avg), sorted.get(p95_idx).copied())
    }
}

fn unix_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Health check endpoint
pub async fn health_handler() -> impl IntoResponse {
    "ok"
}

/// Info endpoint
pub async fn info_handler(State(state): State<AppState>) -> impl IntoResponse {
    let templates: Vec<_> = state
        .prompts
        .list()
        .iter()
        .map(|t| {
            json!({
                "id": t.id,
                "analysis_type": t.analysis_type,
                "version": t.version,
                "checksum": t.checksum
            })
        })
        .collect();

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        json!({
            "model": {
                "provider": state.client.provider(),
                "model": state.config.model.model,
                "temperature": state.config.model.temperature,
                "max_tokens": state.config.model.max_tokens
            },
            "label": {
                "enabled": state.config.label.enabled
            },
            "prompts": templates,
            "server": {
                "bind": state.config.runtime.http_bind.to_string(),
                "think_path": THINK_PATH
            }
        })
        .to_string(),
    )
}

/// Metrics endpoint
pub async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    let metrics = state.metrics.lock().await.clone();
    let (avg_latency_ms, p95_latency_ms) = metrics.latency_stats();

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        json!({
            "metrics_version": "1",
            "total_requests": metrics.total_requests,
            "last_request_unix": metrics.last_request_unix,
            "errors_total": metrics.errors_total,
            "avg_latency_ms": avg_latency_ms,
            "p95_latency_ms": p95_latency_ms
        })
        .to_string(),
    )
}

async fn track_think_metrics(
    State(metrics): State<Arc<Mutex<HttpMetrics>>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    if req.uri().path() != THINK_PATH {
        return next.run(req).await;
    }
    let start = Instant::now();
    let resp = next.run(req).await;
    let latency_ms = start.elapsed().as_millis() as f64;
    metrics
        .lock()
        .await
        .record(latency_ms, resp.status().is_success());
    resp
}

/// Build the application router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/info", get(info_handler))
        .route("/metrics", get(metrics_handler))
        .route(THINK_PATH, post(think_handler))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(middleware::from_fn_with_state(
            state.metrics.clone(),
            track_think_metrics,
        ))
        .with_state(state)
}

/// Start the HTTP server
pub async fn start_http_server(state: AppState) -> Result<()> {
    let bind = state.config.runtime.http_bind;
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .map_err(|e| GlassMindError::Internal {
            message: format!("Failed to bind HTTP listener on {bind}: {e}"),
        })?;

    tracing::info!("Starting HTTP server on {} (think at {})", bind, THINK_PATH);

    axum::serve(listener, app)
        .await
        .map_err(|e| GlassMindError::Internal {
            message: format!("HTTP server error: {e}"),
        })?;

    Ok(())
}
