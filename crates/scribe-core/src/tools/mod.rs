//! Tool declarations and execution for the agent loop.

mod notes;
mod registry;

pub use notes::{NotesSearchExecutor, QUERY_NOTES_TOOL, QueryNotesParams, format_results};
pub use registry::{ToolDef, ToolRegistry};

use std::future::Future;

use scribe_llm::provider::ToolCallRequest;

#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("invalid tool parameters: {message}")]
    InvalidParams { message: String },

    #[error(transparent)]
    Retrieval(#[from] scribe_index::IndexError),

    #[error("Unknown tool: {name}")]
    UnknownTool { name: String },
}

/// Result of one tool call, already rendered as the text the model will see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolOutcome {
    Success(String),
    Failure(String),
}

impl ToolOutcome {
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::Success(t) | Self::Failure(t) => t,
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

/// Parse the model's raw argument string into a typed parameter struct.
///
/// # Errors
///
/// Returns `ToolError::InvalidParams` when the payload is not valid JSON or
/// does not match `T`.
pub fn deserialize_params<T: serde::de::DeserializeOwned>(arguments: &str) -> Result<T, ToolError> {
    let raw = if arguments.trim().is_empty() {
        "{}"
    } else {
        arguments
    };
    serde_json::from_str(raw).map_err(|e| ToolError::InvalidParams {
        message: e.to_string(),
    })
}

/// Backend that can run some set of structured tool calls.
pub trait ToolExecutor: Send + Sync {
    /// Tools this executor handles.
    fn tool_definitions(&self) -> Vec<ToolDef>;

    /// Run `call`. Returns `Ok(None)` if the tool name is not handled here.
    fn execute_tool_call(
        &self,
        call: &ToolCallRequest,
    ) -> impl Future<Output = Result<Option<String>, ToolError>> + Send;
}

/// Resolve `call` against `registry`, run it, and fold every failure into
/// tool-result text.
///
/// Names missing from the registry never reach the executor and become
/// `Unknown tool: <name>`; argument or execution errors become
/// `Error executing <name>: <message>`. Nothing here aborts the loop.
pub async fn run_tool_call<T: ToolExecutor>(
    registry: &ToolRegistry,
    executor: &T,
    call: &ToolCallRequest,
) -> ToolOutcome {
    if registry.find(&call.name).is_none() {
        return ToolOutcome::Failure(
            ToolError::UnknownTool {
                name: call.name.clone(),
            }
            .to_string(),
        );
    }
    match executor.execute_tool_call(call).await {
        Ok(Some(text)) => ToolOutcome::Success(text),
        Ok(None) => ToolOutcome::Failure(
            ToolError::UnknownTool {
                name: call.name.clone(),
            }
            .to_string(),
        ),
        Err(e @ ToolError::UnknownTool { .. }) => ToolOutcome::Failure(e.to_string()),
        Err(e) => {
            tracing::warn!(tool = %call.name, "tool call failed: {e}");
            ToolOutcome::Failure(format!("Error executing {}: {e}", call.name))
        }
    }
}
