//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the appropriate implementations.
use std::sync::Arc;

use crate::state::ServerState;
use crate::tools::{
    DiscoverAliasesParams, OpenKeywordParams, ResolvePhraseParams, ValidateUrlParams,
    discover_aliases::discover_aliases_impl, open_keyword::open_keyword_impl, resolve_phrase::resolve_phrase_impl,
    validate_url::validate_url_impl,
};

use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};

/// The main MCP server handler for sitealias.
#[derive(Clone)]
pub struct SiteAliasServer {
    state: Arc<ServerState>,
    tool_router: ToolRouter<Self>,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// This macro generates the routing logic that maps tool names to handler methods.
#[tool_router]
impl SiteAliasServer {
    /// Create a new server handler.
    pub fn new(state: ServerState) -> Self {
        Self { state: Arc::new(state), tool_router: Self::tool_router() }
    }

    /// Look up a phrase in the local phrase index.
    ///
    /// No agent is contacted; works offline.
    #[tool(description = "Look up URLs for a spoken phrase such as \"open apple\" in the local phrase index. \
                          Returns null urls when the phrase is unknown. Makes no network calls.")]
    async fn open_keyword(&self, params: Parameters<OpenKeywordParams>) -> Result<CallToolResult, McpError> {
        open_keyword_impl(&self.state, params.0).await
    }

    /// Resolve a phrase to URLs, using the resolver agent on a cache miss.
    #[tool(description = "Resolve a spoken phrase to canonical URLs. Uses the cache first, then a web-search agent. \
                          Result status is found (with urls), rejected (content filter) or unresolved.")]
    async fn resolve_phrase(&self, params: Parameters<ResolvePhraseParams>) -> Result<CallToolResult, McpError> {
        resolve_phrase_impl(&self.state, params.0).await
    }

    /// Check that a URL matches the original request.
    #[tool(description = "Check, by fetching the page, that a URL matches the intent of a spoken request. \
                          Returns a verdict (valid, invalid or indeterminate) or unresolved.")]
    async fn validate_url(&self, params: Parameters<ValidateUrlParams>) -> Result<CallToolResult, McpError> {
        validate_url_impl(&self.state, params.0).await
    }

    /// Discover phrases for a domain and merge them into the cache.
    #[tool(description = "Discover branded keywords and \"open ...\" phrases for a domain, merge them into the \
                          phrase index and save the cache.")]
    async fn discover_aliases(&self, params: Parameters<DiscoverAliasesParams>) -> Result<CallToolResult, McpError> {
        discover_aliases_impl(&self.state, params.0).await
    }
}

impl ServerHandler for SiteAliasServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "sitealias-mcp".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::fixtures::offline_state;

    #[test]
    fn test_all_tools_are_listed() {
        let dir = tempfile::tempdir().unwrap();
        let server = SiteAliasServer::new(offline_state(dir.path()));

        let mut names: Vec<String> = server.tool_router.list_all().into_iter().map(|t| t.name.to_string()).collect();
        names.sort();

        assert_eq!(names, vec!["discover_aliases", "open_keyword", "resolve_phrase", "validate_url"]);
    }
}
