//! Axum-based HTTP gateway with body limits and request timeouts.
//!
//! Thin boundary over the review pipeline: handlers deserialize,
//! delegate, and map [`ReviewError`] onto status codes. No review
//! logic lives here.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;

use crate::config::Config;
use crate::error::ReviewError;
use crate::history::ReviewHistory;
use crate::pipeline::ReviewPipeline;
use crate::review::{BatchReviewRequest, Language, ReviewRequest};
use crate::tools::{tool_available, TOOLS};

/// Request timeout — covers the slowest provider-chain path.
pub const REQUEST_TIMEOUT_SECS: u64 = 180;
/// Envelope slack on top of the configured code size limit.
const BODY_OVERHEAD_BYTES: usize = 65_536;

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<ReviewPipeline>,
    pub history: Arc<ReviewHistory>,
    pub config: Arc<Config>,
}

impl IntoResponse for ReviewError {
    fn into_response(self) -> Response {
        let status = match &self {
            ReviewError::Validation(_) => StatusCode::BAD_REQUEST,
            ReviewError::NotFound => StatusCode::NOT_FOUND,
            ReviewError::Internal(e) => {
                tracing::error!(error = %e, "internal error");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        let body = serde_json::json!({ "error": self.to_string() });
        (status, Json(body)).into_response()
    }
}

/// Run the HTTP gateway until the process is stopped.
pub async fn run_gateway(config: Config) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "gateway listening");

    let max_body = config.limits.max_code_bytes + BODY_OVERHEAD_BYTES;
    let history = Arc::new(ReviewHistory::new());
    let state = AppState {
        pipeline: Arc::new(ReviewPipeline::new(&config, Arc::clone(&history))),
        history,
        config: Arc::new(config),
    };

    let app = build_router(state, max_body);
    axum::serve(listener, app).await?;
    Ok(())
}

/// Assemble the router. Split out so tests can drive it in-process.
pub fn build_router(state: AppState, max_body: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([axum::http::Method::GET, axum::http::Method::POST])
        .allow_headers([header::CONTENT_TYPE])
        .max_age(Duration::from_secs(3600));

    Router::new()
        .route("/health", get(handle_health))
        .route("/api/review", post(handle_review))
        .route("/api/review/batch", post(handle_review_batch))
        .route("/api/review/{id}", get(handle_review_lookup))
        .route("/api/dashboard/metrics", get(handle_metrics))
        .route("/api/languages", get(handle_languages))
        .route("/api/config", get(handle_config))
        .with_state(state)
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(max_body))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(REQUEST_TIMEOUT_SECS),
        ))
}

// ── Handlers ─────────────────────────────────────────────────────

/// GET /health — tool availability and configured providers.
async fn handle_health(State(state): State<AppState>) -> impl IntoResponse {
    let tools: serde_json::Map<String, serde_json::Value> = TOOLS
        .iter()
        .map(|spec| (spec.name.to_string(), tool_available(spec).into()))
        .collect();

    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "tools": tools,
        "providers": state.config.providers.configured_names(),
    }))
}

/// POST /api/review — review one code sample.
async fn handle_review(
    State(state): State<AppState>,
    Json(request): Json<ReviewRequest>,
) -> Result<impl IntoResponse, ReviewError> {
    let review = state.pipeline.review(request).await?;
    Ok(Json(review))
}

/// POST /api/review/batch — review an ordered batch.
async fn handle_review_batch(
    State(state): State<AppState>,
    Json(request): Json<BatchReviewRequest>,
) -> Result<impl IntoResponse, ReviewError> {
    let response = state.pipeline.review_batch(request).await?;
    Ok(Json(response))
}

/// GET /api/review/{id} — look up a past review.
async fn handle_review_lookup(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ReviewError> {
    let review = state.history.get(&id).ok_or(ReviewError::NotFound)?;
    Ok(Json(review))
}

/// GET /api/dashboard/metrics — aggregate history metrics.
async fn handle_metrics(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.history.metrics())
}

/// GET /api/languages — supported languages and their extensions.
async fn handle_languages() -> impl IntoResponse {
    let languages: Vec<_> = Language::ALL
        .iter()
        .map(|lang| {
            serde_json::json!({
                "name": lang.label(),
                "extension": lang.extension(),
            })
        })
        .collect();
    Json(serde_json::json!({ "languages": languages }))
}

/// GET /api/config — effective configuration. API keys carry
/// `skip_serializing`, so this view is safe to expose.
async fn handle_config(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.config.as_ref().clone())
}

// ── Tests ────────────────────────────────────────────────────────
