//! open_keyword tool implementation.
//!
//! Serves phrase lookups from the on-disk phrase index. No agent is
//! contacted, so this works with the platform unreachable.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sitealias_core::Error;

use super::json_result;
use crate::state::ServerState;

/// Parameters for the open_keyword tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct OpenKeywordParams {
    /// Spoken phrase, e.g. "open apple".
    pub keyword: String,
}

/// Output from the open_keyword tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct OpenKeywordOutput {
    pub keyword: String,
    /// URLs with an explicit scheme, or null when the phrase is unknown.
    pub urls: Option<Vec<String>>,
}

pub async fn open_keyword(state: &ServerState, params: OpenKeywordParams) -> Result<OpenKeywordOutput, Error> {
    if params.keyword.trim().is_empty() {
        return Err(Error::InvalidInput("keyword cannot be empty".into()));
    }

    let urls = state.keywords.resolve(&params.keyword).await?;
    tracing::debug!(keyword = %params.keyword, hit = urls.is_some(), "keyword lookup");
    Ok(OpenKeywordOutput { keyword: params.keyword, urls })
}

/// Implementation of the open_keyword tool.
pub async fn open_keyword_impl(state: &ServerState, params: OpenKeywordParams) -> Result<CallToolResult, McpError> {
    json_result(&open_keyword(state, params).await?)
}
