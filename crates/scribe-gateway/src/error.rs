use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use scribe_core::agent::AgentError;
use scribe_index::IndexError;
use scribe_llm::LlmError;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("failed to bind {0}: {1}")]
    Bind(String, std::io::Error),
    #[error("server error: {0}")]
    Server(String),
}

/// Handler failure rendered as `{"error": "<message>"}`.
#[derive(Debug, Error)]
pub(crate) enum ApiError {
    #[error("{}", .0.body_text())]
    Request(#[from] JsonRejection),
    #[error(transparent)]
    Index(#[from] IndexError),
    #[error(transparent)]
    Agent(#[from] AgentError),
}

fn llm_status(e: &LlmError) -> StatusCode {
    match e {
        LlmError::MissingApiKey => StatusCode::INTERNAL_SERVER_ERROR,
        _ => StatusCode::BAD_GATEWAY,
    }
}

impl ApiError {
    pub(crate) fn status(&self) -> StatusCode {
        match self {
            Self::Request(rejection) => rejection.status(),
            Self::Index(IndexError::IndexNotLoaded | IndexError::ArtifactNotFound(_)) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            Self::Index(IndexError::Llm(e)) | Self::Agent(AgentError::Llm(e)) => llm_status(e),
            Self::Index(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), "request failed: {self}");
        }
        (
            status,
            Json(serde_json::json!({ "error": self.to_string() })),
        )
            .into_response()
    }
}
