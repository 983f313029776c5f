//! resolve_phrase tool implementation.
//!
//! Answers from the in-memory phrase index when possible, otherwise asks the
//! resolver agent and (by default) records and saves a found answer.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sitealias_core::{Error, ResolutionResult};

use super::{default_true, json_result};
use crate::state::ServerState;

/// Parameters for the resolve_phrase tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ResolvePhraseParams {
    /// Spoken phrase to resolve, e.g. "open apple".
    pub phrase: String,

    /// Answer from the cache when the phrase is already known (default: true).
    #[serde(default = "default_true")]
    pub use_cache: bool,

    /// Record a found answer in the cache and save it (default: true).
    #[serde(default = "default_true")]
    pub record: bool,
}

/// Output from the resolve_phrase tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ResolvePhraseOutput {
    pub phrase: String,
    /// Whether the answer came from the cache without contacting an agent.
    pub cached: bool,
    pub result: ResolutionResult,
}

pub async fn resolve_phrase(state: &ServerState, params: ResolvePhraseParams) -> Result<ResolvePhraseOutput, Error> {
    let phrase = params.phrase.trim().to_string();
    if phrase.is_empty() {
        return Err(Error::InvalidInput("phrase cannot be empty".into()));
    }

    if params.use_cache
        && let Some(urls) = state.cache.phrase_urls(&phrase).await
        && !urls.is_empty()
    {
        tracing::debug!(%phrase, "phrase served from cache");
        return Ok(ResolvePhraseOutput { phrase, cached: true, result: ResolutionResult::Found { urls } });
    }

    let resolver = &state.workflows()?.resolver;
    let result = if params.record {
        let result = resolver.resolve_and_record(&phrase, &state.cache).await?;
        if matches!(result, ResolutionResult::Found { .. }) {
            state.persist().await?;
        }
        result
    } else {
        resolver.resolve_url_with_search(&phrase).await?
    };

    Ok(ResolvePhraseOutput { phrase, cached: false, result })
}

/// Implementation of the resolve_phrase tool.
pub async fn resolve_phrase_impl(state: &ServerState, params: ResolvePhraseParams) -> Result<CallToolResult, McpError> {
    json_result(&resolve_phrase(state, params).await?)
}
