use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use serde::{Deserialize, Serialize};

use scribe_core::ChatOverrides;
use scribe_index::SearchResult;
use scribe_index::indexer::IndexReport;
use scribe_llm::provider::{Message, Role, Usage};

use super::error::ApiError;
use super::server::AppState;

#[derive(Serialize)]
struct IndexStatus {
    loaded: bool,
    size: usize,
}

#[derive(Serialize)]
pub(crate) struct RootResponse {
    name: &'static str,
    version: &'static str,
    endpoints: serde_json::Value,
    index_status: IndexStatus,
}

#[derive(Serialize)]
pub(crate) struct HealthResponse {
    status: &'static str,
    index_loaded: bool,
    index_size: usize,
    metadata_size: usize,
}

#[derive(Deserialize)]
pub(crate) struct QueryRequest {
    pub query: String,
    #[serde(default)]
    pub max_results: Option<usize>,
}

#[derive(Serialize)]
pub(crate) struct QueryResponse {
    query: String,
    results: Vec<SearchResult>,
}

#[derive(Deserialize)]
pub(crate) struct ChatMessage {
    pub role: Role,
    pub content: String,
}

#[derive(Deserialize)]
pub(crate) struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
}

#[derive(Serialize)]
struct ReplyMessage {
    role: Role,
    content: String,
}

#[derive(Serialize)]
pub(crate) struct ChatResponse {
    id: String,
    model: String,
    message: ReplyMessage,
    usage: Usage,
}

pub(crate) async fn root_handler(State(state): State<AppState>) -> Json<RootResponse> {
    let (size, _) = state.ctx.index.counts();
    Json(RootResponse {
        name: "Scribe Markdown Notes RAG",
        version: env!("CARGO_PKG_VERSION"),
        endpoints: serde_json::json!({
            "/query": "POST - Direct query endpoint (non-agentic)",
            "/chat": "POST - Chat endpoint with agentic retrieval",
            "/reindex": "POST - Rebuild the index from the configured notes folder",
            "/health": "GET - Health check",
        }),
        index_status: IndexStatus {
            loaded: state.ctx.index.is_loaded(),
            size,
        },
    })
}

pub(crate) async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let (index_size, metadata_size) = state.ctx.index.counts();
    Json(HealthResponse {
        status: "healthy",
        index_loaded: state.ctx.index.is_loaded(),
        index_size,
        metadata_size,
    })
}

pub(crate) async fn query_handler(
    State(state): State<AppState>,
    payload: Result<Json<QueryRequest>, JsonRejection>,
) -> Result<Json<QueryResponse>, ApiError> {
    let Json(req) = payload?;
    let results = state.ctx.query(&req.query, req.max_results).await?;
    Ok(Json(QueryResponse {
        query: req.query,
        results,
    }))
}

pub(crate) async fn chat_handler(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let Json(req) = payload?;
    let history = req
        .messages
        .into_iter()
        .map(|m| Message::new(m.role, m.content))
        .collect();
    let overrides = ChatOverrides {
        model: req.model,
        temperature: req.temperature,
        max_tokens: req.max_tokens,
    };
    let reply = state.ctx.chat(history, &overrides).await?;
    tracing::debug!(
        state = ?reply.state,
        iterations = reply.iterations,
        total_tokens = reply.usage.total_tokens,
        "chat finished"
    );
    Ok(Json(ChatResponse {
        id: reply.id,
        model: reply.model,
        message: ReplyMessage {
            role: reply.message.role,
            content: reply.message.content,
        },
        usage: reply.usage,
    }))
}

/// Rebuilds from the configured notes folder only; any request body is ignored.
pub(crate) async fn reindex_handler(
    State(state): State<AppState>,
) -> Result<Json<IndexReport>, ApiError> {
    let report = state.ctx.reindex().await?;
    Ok(Json(report))
}
