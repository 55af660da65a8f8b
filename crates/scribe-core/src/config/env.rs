use std::str::FromStr;

use super::{Config, Secret};

/// Parse `key` as `T`, warning and returning `None` on a malformed value.
fn parsed<T: FromStr>(key: &str) -> Option<T> {
    let v = std::env::var(key).ok()?;
    match v.trim().parse::<T>() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            tracing::warn!("ignoring invalid {key} value: {v}");
            None
        }
    }
}

impl Config {
    pub(crate) fn apply_env_overrides(&mut self) {
        self.apply_env_overrides_llm();
        self.apply_env_overrides_index();
        self.apply_env_overrides_serving();
        self.resolve_api_key();
    }

    fn apply_env_overrides_llm(&mut self) {
        if let Ok(v) = std::env::var("SCRIBE_LLM_BASE_URL") {
            self.llm.base_url = v;
        }
        if let Ok(v) = std::env::var("SCRIBE_CHAT_MODEL") {
            self.llm.chat_model = v;
        }
        if let Ok(v) = std::env::var("SCRIBE_EMBEDDING_MODEL") {
            self.llm.embedding_model = v;
        }
        if let Some(n) = parsed::<usize>("SCRIBE_EMBED_BATCH_SIZE") {
            self.llm.embed_batch_size = n;
        }
    }

    fn apply_env_overrides_index(&mut self) {
        if let Ok(v) = std::env::var("SCRIBE_INDEX_PATH") {
            self.index.index_path = v;
        }
        if let Ok(v) = std::env::var("SCRIBE_METADATA_PATH") {
            self.index.metadata_path = v;
        }
        if let Ok(v) = std::env::var("SCRIBE_NOTES_DIR") {
            self.index.notes_dir = v;
        }
        if let Some(n) = parsed::<usize>("SCRIBE_CHUNK_SIZE") {
            self.index.chunk_size = n;
        }
        if let Some(n) = parsed::<usize>("SCRIBE_CHUNK_OVERLAP") {
            self.index.chunk_overlap = n;
        }
    }

    fn apply_env_overrides_serving(&mut self) {
        if let Some(n) = parsed::<usize>("SCRIBE_MAX_ITERATIONS") {
            self.agent.max_iterations = n;
        }
        if let Ok(v) = std::env::var("SCRIBE_GATEWAY_BIND") {
            self.gateway.bind = v;
        }
        if let Some(port) = parsed::<u16>("SCRIBE_GATEWAY_PORT") {
            self.gateway.port = port;
        }
    }

    /// `SCRIBE_API_KEY` wins over the legacy `AI_BUILDER_TOKEN`.
    fn resolve_api_key(&mut self) {
        let key = ["SCRIBE_API_KEY", "AI_BUILDER_TOKEN"]
            .iter()
            .filter_map(|k| std::env::var(k).ok())
            .map(|v| v.trim().to_owned())
            .find(|v| !v.is_empty());
        if let Some(key) = key {
            self.secrets.api_key = Some(Secret::new(key));
        }
    }
}
