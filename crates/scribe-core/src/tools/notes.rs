use std::fmt::Write;

use schemars::JsonSchema;
use serde::Deserialize;

use scribe_index::{Retriever, SearchResult};
use scribe_llm::provider::{LlmProvider, ToolCallRequest};

use super::{ToolDef, ToolError, ToolExecutor, deserialize_params};

pub const QUERY_NOTES_TOOL: &str = "query_my_notes";

const QUERY_NOTES_DESCRIPTION: &str = "Search your personal knowledge base of indexed Markdown notes. \
Use this tool when the user asks questions that might be answered by your notes. \
You can call this tool multiple times with different queries to gather comprehensive information. \
The tool returns the most relevant text chunks along with their source file paths and similarity scores.";

#[derive(Debug, Deserialize, JsonSchema)]
pub struct QueryNotesParams {
    /// The search query. Formulate this as a question or keyword search that
    /// would help find relevant information in the notes. Be specific and targeted.
    pub query: String,
    /// Maximum number of results to return (default: 5)
    #[serde(default)]
    pub max_results: Option<usize>,
}

/// Render search hits the way the model expects to read them.
#[must_use]
pub fn format_results(query: &str, results: &[SearchResult]) -> String {
    if results.is_empty() {
        return format!("No results found for query: '{query}'");
    }
    let mut out = format!("Search results for query: '{query}'\n\n");
    for (i, r) in results.iter().enumerate() {
        let _ = write!(
            out,
            "Result {} (similarity: {:.4}):\nSource: {}\nChunk {}/{}\nContent: {}\n\n",
            i + 1,
            r.score,
            r.file_path,
            r.chunk_index + 1,
            r.total_chunks,
            r.text
        );
    }
    out
}

/// Executes `query_my_notes` against the shared index.
pub struct NotesSearchExecutor<P: LlmProvider> {
    retriever: Retriever<P>,
    default_max_results: usize,
}

impl<P: LlmProvider> NotesSearchExecutor<P> {
    #[must_use]
    pub fn new(retriever: Retriever<P>, default_max_results: usize) -> Self {
        Self {
            retriever,
            default_max_results,
        }
    }

    #[must_use]
    pub fn tool_def() -> ToolDef {
        ToolDef {
            name: QUERY_NOTES_TOOL,
            description: QUERY_NOTES_DESCRIPTION,
            schema: schemars::schema_for!(QueryNotesParams),
        }
    }
}

impl<P: LlmProvider> ToolExecutor for NotesSearchExecutor<P> {
    fn tool_definitions(&self) -> Vec<ToolDef> {
        vec![Self::tool_def()]
    }

    async fn execute_tool_call(&self, call: &ToolCallRequest) -> Result<Option<String>, ToolError> {
        if call.name != QUERY_NOTES_TOOL {
            return Ok(None);
        }
        let params: QueryNotesParams = deserialize_params(&call.arguments)?;
        let max_results = params.max_results.unwrap_or(self.default_max_results);
        tracing::debug!(query = %params.query, max_results, "query_my_notes");

        let results = self.retriever.retrieve(&params.query, max_results).await?;
        Ok(Some(format_results(&params.query, &results)))
    }
}
