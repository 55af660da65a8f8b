//! Startup wiring: config path resolution, provider construction, and the
//! initial artifact load.

use std::path::{Path, PathBuf};

use anyhow::Context;

use scribe_index::IndexError;
use scribe_llm::LlmError;
use scribe_llm::any::AnyProvider;
use scribe_llm::openai::OpenAiProvider;

use crate::app::AppContext;
use crate::config::Config;

pub const DEFAULT_CONFIG_PATH: &str = "config/scribe.toml";

/// Priority: explicit `--config` > `SCRIBE_CONFIG` env > `config/scribe.toml`.
#[must_use]
pub fn resolve_config_path(cli: Option<&Path>) -> PathBuf {
    if let Some(path) = cli {
        return path.to_path_buf();
    }
    if let Ok(path) = std::env::var("SCRIBE_CONFIG") {
        return PathBuf::from(path);
    }
    PathBuf::from(DEFAULT_CONFIG_PATH)
}

/// Load and validate configuration from `path`.
///
/// # Errors
///
/// Returns an error if the file cannot be parsed or fails validation.
pub fn load_config(path: &Path) -> anyhow::Result<Config> {
    let config = Config::load(path)
        .with_context(|| format!("failed to load config from {}", path.display()))?;
    config.validate().context("invalid configuration")?;
    Ok(config)
}

/// Build the OpenAI-compatible provider described by `config`.
///
/// # Errors
///
/// Returns `LlmError::MissingApiKey` when no credential was resolved.
pub fn create_provider(config: &Config) -> Result<AnyProvider, LlmError> {
    let api_key = config
        .secrets
        .api_key
        .as_ref()
        .ok_or(LlmError::MissingApiKey)?
        .expose()
        .to_owned();
    Ok(AnyProvider::OpenAi(OpenAiProvider::new(
        api_key,
        config.llm.base_url.clone(),
        config.llm.chat_model.clone(),
        config.llm.embedding_model.clone(),
    )))
}

/// Load the persisted pair into `ctx` if one exists.
///
/// A missing pair is not fatal: the process starts unloaded and queries report
/// `IndexNotLoaded` until a rebuild succeeds. A corrupt pair is an error.
///
/// # Errors
///
/// Returns any load failure other than a missing artifact.
pub async fn load_index_if_present(ctx: &AppContext) -> Result<bool, IndexError> {
    match ctx.reload_index().await {
        Ok(()) => Ok(true),
        Err(IndexError::ArtifactNotFound(path)) => {
            tracing::warn!(
                path = %path.display(),
                "index artifacts not found, run `scribe index <folder>` first"
            );
            Ok(false)
        }
        Err(e) => Err(e),
    }
}
