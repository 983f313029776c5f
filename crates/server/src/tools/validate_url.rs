//! validate_url tool implementation.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sitealias_core::{Error, ValidationResult};

use super::json_result;
use crate::state::ServerState;

/// Parameters for the validate_url tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ValidateUrlParams {
    /// The original spoken request, e.g. "open apple".
    pub utterance: String,
    /// URL the request was resolved to.
    pub url: String,
}

pub async fn validate_url(state: &ServerState, params: ValidateUrlParams) -> Result<ValidationResult, Error> {
    if params.utterance.trim().is_empty() || params.url.trim().is_empty() {
        return Err(Error::InvalidInput("utterance and url cannot be empty".into()));
    }
    state.workflows()?.validator.validate_url(&params.utterance, &params.url).await
}

/// Implementation of the validate_url tool.
pub async fn validate_url_impl(state: &ServerState, params: ValidateUrlParams) -> Result<CallToolResult, McpError> {
    json_result(&validate_url(state, params).await?)
}
