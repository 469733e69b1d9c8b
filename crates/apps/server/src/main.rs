use std::env;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod model;
mod vector;

use model::{GeminiBackend, GeminiConfig, ModelBackend, DEFAULT_GEMINI_API_URL, DEFAULT_GEMINI_MODEL};
use vector::{rag_prompt, VectorIndex, DEFAULT_SEARCH_LIMIT, RAG_CONTEXT_LIMIT};

const HEALTH_MESSAGE: &str = "MigrateWatch relay is running";

#[derive(Clone)]
struct AppState {
    model: Arc<dyn ModelBackend>,
    index: Arc<VectorIndex>,
}

#[derive(Debug, Default, Deserialize)]
struct GenerateRequest {
    #[serde(default)]
    prompt: Option<String>,
    /// Accepted for compatibility; the configured backend model is used.
    #[serde(default)]
    model: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct QueryRequest {
    #[serde(default)]
    query: Option<String>,
    #[serde(default)]
    limit: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let port = env_var_u16("PORT", 3001);
    let bind = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0".to_string());
    let addr: SocketAddr = format!("{bind}:{port}").parse()?;

    let gemini = GeminiConfig {
        api_key: env::var("GEMINI_API_KEY").ok().filter(|k| !k.is_empty()),
        model: env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_GEMINI_MODEL.to_string()),
        api_url: env::var("GEMINI_API_URL").unwrap_or_else(|_| DEFAULT_GEMINI_API_URL.to_string()),
        timeout: Duration::from_millis(env_var_u64("GEMINI_TIMEOUT_MS", 30_000)),
        ..GeminiConfig::default()
    };
    if gemini.api_key.is_none() {
        warn!("GEMINI_API_KEY not set; generation routes will answer 500");
    }
    let backend = GeminiBackend::new(gemini)?;

    let state = AppState {
        model: Arc::new(backend),
        index: Arc::new(VectorIndex::empty()),
    };

    info!(model = state.model.name(), "relay listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app(state)).await?;
    Ok(())
}

fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_headers(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS]);

    Router::new()
        .route("/health", get(health))
        .route("/generate", post(generate))
        .route("/api/gemini/generate", post(gemini_generate))
        .route("/api/gemini/rag", post(gemini_rag))
        .route("/api/vector/search", post(vector_search))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn api_error(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}

fn required(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

async fn health() -> Response {
    (
        StatusCode::OK,
        Json(json!({ "status": "ok", "message": HEALTH_MESSAGE })),
    )
        .into_response()
}

/// Runs the prompt through the backend, mapping failures to a 500.
async fn run_model(state: &AppState, prompt: String) -> Result<String, Response> {
    state.model.generate(prompt).await.map_err(|e| {
        error!(error = %e, backend = state.model.name(), "generation failed");
        api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })
}

/// Dashboard relay: answers in `content`.
async fn generate(State(state): State<AppState>, Json(req): Json<GenerateRequest>) -> Response {
    let Some(prompt) = required(req.prompt) else {
        return api_error(StatusCode::BAD_REQUEST, "Prompt is required");
    };
    if let Some(requested) = req.model.as_deref() {
        if requested != state.model.name() {
            info!(requested, serving = state.model.name(), "ignoring requested model");
        }
    }
    match run_model(&state, prompt).await {
        Ok(text) => Json(json!({ "content": text })).into_response(),
        Err(resp) => resp,
    }
}

async fn gemini_generate(
    State(state): State<AppState>,
    Json(req): Json<GenerateRequest>,
) -> Response {
    let Some(prompt) = required(req.prompt) else {
        return api_error(StatusCode::BAD_REQUEST, "Prompt is required");
    };
    match run_model(&state, prompt).await {
        Ok(text) => Json(json!({ "response": text })).into_response(),
        Err(resp) => resp,
    }
}

async fn gemini_rag(State(state): State<AppState>, Json(req): Json<QueryRequest>) -> Response {
    let Some(query) = required(req.query) else {
        return api_error(StatusCode::BAD_REQUEST, "Query is required");
    };
    let sources = state.index.search(&query, RAG_CONTEXT_LIMIT);
    let prompt = rag_prompt(&query, &sources);
    match run_model(&state, prompt).await {
        Ok(text) => Json(json!({ "response": text, "sources": sources })).into_response(),
        Err(resp) => resp,
    }
}

async fn vector_search(State(state): State<AppState>, Json(req): Json<QueryRequest>) -> Response {
    let Some(query) = required(req.query) else {
        return api_error(StatusCode::BAD_REQUEST, "Query is required");
    };
    let limit = req.limit.unwrap_or(DEFAULT_SEARCH_LIMIT);
    let results = state.index.search(&query, limit);
    Json(json!({ "results": results })).into_response()
}

fn env_var_u16(key: &str, default: u16) -> u16 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_var_u64(key: &str, default: u64) -> u64 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
