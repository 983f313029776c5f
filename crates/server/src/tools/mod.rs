//! MCP tool implementations.
//!
//! Each tool has a typed core returning its output struct and an `_impl`
//! wrapper that renders the output as pretty JSON text content.

pub mod discover_aliases;
pub mod open_keyword;
pub mod resolve_phrase;
pub mod validate_url;

pub use discover_aliases::DiscoverAliasesParams;
pub use open_keyword::OpenKeywordParams;
pub use resolve_phrase::ResolvePhraseParams;
pub use validate_url::ValidateUrlParams;

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use serde::Serialize;
use sitealias_core::Error;

fn json_result<T: Serialize>(output: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(output)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize output: {e}")))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

fn default_true() -> bool {
    true
}
