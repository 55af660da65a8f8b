use scribe_llm::provider::{LlmProvider, Message, ToolCallRequest};

use super::Agent;
use crate::tools::{ToolExecutor, run_tool_call};

impl<P: LlmProvider, T: ToolExecutor> Agent<P, T> {
    /// Run each requested call in order and append one tool-result message per
    /// call id. Failures are reported to the model as text.
    pub(super) async fn handle_tool_calls(
        &self,
        messages: &mut Vec<Message>,
        tool_calls: &[ToolCallRequest],
        iteration: usize,
    ) {
        for call in tool_calls {
            let outcome = run_tool_call(&self.registry, &self.executor, call).await;
            tracing::debug!(
                iteration,
                tool = %call.name,
                call_id = %call.id,
                success = outcome.is_success(),
                "tool call finished"
            );
            messages.push(Message::tool_result(call.id.clone(), outcome.text()));
        }
    }
}
