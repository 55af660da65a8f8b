//! Bounded tool-calling loop over the notes search tool.

mod error;
mod tool_execution;

pub use error::AgentError;

use std::sync::Arc;

use serde::Serialize;

use scribe_llm::provider::{
    ChatCompletion, ChatOptions, LlmProvider, Message, Role, ToolDefinition, Usage,
};

use crate::tools::{ToolExecutor, ToolRegistry};

pub const DEFAULT_MAX_ITERATIONS: usize = 5;

pub const EXHAUSTED_FALLBACK: &str = "Maximum iterations reached. Please try a simpler query.";

pub const SYSTEM_PROMPT: &str = "You are a helpful AI assistant with access to a personal knowledge base \
of Markdown notes. When users ask questions that might be answered by their notes, you should \
autonomously use the query_my_notes tool to search for relevant information.

Guidelines for using query_my_notes:
1. When a question relates to information that might be in the notes, automatically search without asking
2. You can make multiple searches with different queries to gather comprehensive information
3. If initial results aren't sufficient, refine your search queries based on what you learned
4. Always cite the source file paths when referencing information from notes
5. If the notes don't contain relevant information, say so clearly
6. Combine information from multiple sources when answering complex questions

Your goal is to be a research assistant that proactively searches the knowledge base to provide \
accurate, well-sourced answers.";

/// Where a conversation stands between model turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentState {
    AwaitingModel,
    ExecutingTools,
    Done,
    Exhausted,
}

/// Final answer of one loop invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentReply {
    pub id: String,
    pub model: String,
    pub message: Message,
    /// Usage of the last model response.
    pub usage: Usage,
    /// `Done` or `Exhausted`.
    pub state: AgentState,
    /// Completed tool rounds.
    pub iterations: usize,
}

impl AgentReply {
    fn done(completion: ChatCompletion, iterations: usize) -> Self {
        Self {
            id: completion.id,
            model: completion.model,
            message: Message::new(completion.message.role, completion.message.content),
            usage: completion.usage,
            state: AgentState::Done,
            iterations,
        }
    }

    fn exhausted(last: Option<ChatCompletion>, iterations: usize) -> Self {
        let (id, model, content, usage) = match last {
            Some(c) => (c.id, c.model, c.message.content, c.usage),
            None => (String::new(), String::new(), String::new(), Usage::default()),
        };
        let content = if content.is_empty() {
            EXHAUSTED_FALLBACK.to_owned()
        } else {
            content
        };
        Self {
            id,
            model,
            message: Message::new(Role::Assistant, content),
            usage,
            state: AgentState::Exhausted,
            iterations,
        }
    }
}

/// Drives the model through at most `max_iterations` tool rounds.
///
/// The transcript lives only for the duration of [`Agent::run`].
pub struct Agent<P: LlmProvider, T: ToolExecutor> {
    provider: Arc<P>,
    executor: T,
    registry: ToolRegistry,
    tool_defs: Vec<ToolDefinition>,
    max_iterations: usize,
}

impl<P: LlmProvider, T: ToolExecutor> Agent<P, T> {
    #[must_use]
    pub fn new(provider: Arc<P>, executor: T, max_iterations: usize) -> Self {
        let registry = ToolRegistry::from_definitions(executor.tool_definitions());
        Self {
            provider,
            executor,
            tool_defs: registry.definitions(),
            registry,
            max_iterations,
        }
    }

    #[must_use]
    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    /// Answer the conversation in `history`, searching notes as the model asks.
    ///
    /// # Errors
    ///
    /// Returns `AgentError::Llm` if any chat call fails. Tool failures never
    /// abort the loop.
    pub async fn run(
        &self,
        history: Vec<Message>,
        options: &ChatOptions,
    ) -> Result<AgentReply, AgentError> {
        let mut messages = Vec::with_capacity(history.len() + 1);
        messages.push(Message::system(SYSTEM_PROMPT));
        messages.extend(history);

        let mut total = Usage::default();
        let mut last: Option<ChatCompletion> = None;

        for iteration in 0..self.max_iterations {
            tracing::debug!(iteration, state = ?AgentState::AwaitingModel, messages = messages.len());
            let completion = self
                .provider
                .chat_with_tools(&messages, &self.tool_defs, options)
                .await?;
            total.prompt_tokens += completion.usage.prompt_tokens;
            total.completion_tokens += completion.usage.completion_tokens;
            total.total_tokens += completion.usage.total_tokens;

            if !completion.message.has_tool_calls() {
                tracing::debug!(iteration, state = ?AgentState::Done, total_tokens = total.total_tokens);
                return Ok(AgentReply::done(completion, iteration));
            }

            tracing::debug!(
                iteration,
                state = ?AgentState::ExecutingTools,
                calls = completion.message.tool_calls.len(),
            );
            messages.push(completion.message.clone());
            self.handle_tool_calls(&mut messages, &completion.message.tool_calls, iteration)
                .await;
            last = Some(completion);
        }

        tracing::warn!(
            max_iterations = self.max_iterations,
            total_tokens = total.total_tokens,
            "agent loop hit the iteration cap"
        );
        Ok(AgentReply::exhausted(last, self.max_iterations))
    }
}
