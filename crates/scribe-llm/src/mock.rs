//! Test-only mock provider with scripted chat turns and deterministic embeddings.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::LlmError;
use crate::provider::{
    ChatCompletion, ChatOptions, LlmProvider, Message, ToolCallRequest, ToolDefinition, Usage,
};

#[derive(Debug, Clone)]
pub struct MockProvider {
    responses: Arc<Mutex<VecDeque<ChatCompletion>>>,
    transcripts: Arc<Mutex<Vec<Vec<Message>>>>,
    chat_calls: Arc<AtomicUsize>,
    embed_calls: Arc<AtomicUsize>,
    pub default_response: ChatCompletion,
    pub dimension: usize,
    pub fail_chat: bool,
    pub fail_embed: bool,
}

impl Default for MockProvider {
    fn default() -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::new())),
            transcripts: Arc::new(Mutex::new(Vec::new())),
            chat_calls: Arc::new(AtomicUsize::new(0)),
            embed_calls: Arc::new(AtomicUsize::new(0)),
            default_response: Self::text("mock response"),
            dimension: 64,
            fail_chat: false,
            fail_embed: false,
        }
    }
}

impl MockProvider {
    #[must_use]
    pub fn with_responses(responses: Vec<ChatCompletion>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses.into())),
            ..Self::default()
        }
    }

    /// A provider that answers every chat turn with `response`.
    #[must_use]
    pub fn repeating(response: ChatCompletion) -> Self {
        Self {
            default_response: response,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn failing() -> Self {
        Self {
            fail_chat: true,
            fail_embed: true,
            ..Self::default()
        }
    }

    /// Final-answer turn with the given content.
    #[must_use]
    pub fn text(content: &str) -> ChatCompletion {
        ChatCompletion {
            id: "mock-completion".into(),
            model: "mock-model".into(),
            message: Message::assistant(content),
            usage: Usage {
                prompt_tokens: 10,
                completion_tokens: 5,
                total_tokens: 15,
            },
        }
    }

    /// Tool-call turn requesting each `(id, name, arguments)` triple.
    #[must_use]
    pub fn tool_calls(calls: &[(&str, &str, &str)]) -> ChatCompletion {
        let calls = calls
            .iter()
            .map(|(id, name, arguments)| ToolCallRequest {
                id: (*id).to_owned(),
                name: (*name).to_owned(),
                arguments: (*arguments).to_owned(),
            })
            .collect();
        ChatCompletion {
            message: Message::assistant_tool_calls("", calls),
            ..Self::text("")
        }
    }

    #[must_use]
    pub fn chat_calls(&self) -> usize {
        self.chat_calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn embed_calls(&self) -> usize {
        self.embed_calls.load(Ordering::SeqCst)
    }

    /// Conversations received by `chat_with_tools`, in call order.
    #[must_use]
    pub fn transcripts(&self) -> Vec<Vec<Message>> {
        self.transcripts.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl LlmProvider for MockProvider {
    async fn chat_with_tools(
        &self,
        messages: &[Message],
        _tools: &[ToolDefinition],
        _options: &ChatOptions,
    ) -> Result<ChatCompletion, LlmError> {
        self.chat_calls.fetch_add(1, Ordering::SeqCst);
        self.transcripts.lock().unwrap_or_else(PoisonError::into_inner).push(messages.to_vec());
        if self.fail_chat {
            return Err(LlmError::Other("mock LLM error".into()));
        }
        let next = self.responses.lock().unwrap_or_else(PoisonError::into_inner).pop_front();
        Ok(next.unwrap_or_else(|| self.default_response.clone()))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, LlmError> {
        self.embed_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_embed {
            return Err(LlmError::Other("mock embedding error".into()));
        }
        Ok(texts
            .iter()
            .map(|t| hashed_embedding(t, self.dimension))
            .collect())
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "mock"
    }
}

/// Bag of character trigrams hashed into `dimension` buckets.
///
/// Identical texts map to identical vectors; texts sharing more trigrams map
/// to closer vectors.
#[must_use]
pub fn hashed_embedding(text: &str, dimension: usize) -> Vec<f32> {
    let dimension = dimension.max(1);
    let mut vector = vec![0.0; dimension];
    let chars: Vec<char> = text.to_lowercase().chars().collect();
    let window = chars.len().clamp(1, 3);
    if chars.is_empty() {
        return vector;
    }
    for gram in chars.windows(window) {
        let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
        for c in gram {
            hash ^= u64::from(u32::from(*c));
            hash = hash.wrapping_mul(0x0100_0000_01b3);
        }
        #[allow(clippy::cast_possible_truncation)]
        let bucket = (hash % dimension as u64) as usize;
        vector[bucket] += 1.0;
    }
    vector
}
