//! Phrase to URL resolution through the search-backed resolver agent.

use std::sync::Arc;

use serde::Deserialize;
use sitealias_core::normalize::ensure_scheme;
use sitealias_core::{AliasCache, Error, ResolutionResult};

use super::RoleAgent;
use crate::registry::AgentRegistry;
use crate::run::{Reply, RunDriver};

/// JSON object the resolver agent answers with.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResolverReply {
    #[serde(deserialize_with = "super::null_as_default")]
    pub original_request: String,
    pub url: Option<String>,
    #[serde(deserialize_with = "super::null_as_default")]
    pub urls_evaluated: Vec<String>,
    #[serde(deserialize_with = "super::null_as_default")]
    pub explanation: String,
    #[serde(deserialize_with = "super::null_as_default")]
    pub search_query_run: String,
}

impl ResolverReply {
    /// `url` followed by `urlsEvaluated`, scheme-normalized, without blanks or
    /// duplicates, in first-seen order.
    pub fn candidate_urls(&self) -> Vec<String> {
        let mut urls: Vec<String> = Vec::new();
        for raw in self.url.iter().chain(&self.urls_evaluated) {
            if raw.trim().is_empty() {
                continue;
            }
            let url = ensure_scheme(raw);
            if !urls.contains(&url) {
                urls.push(url);
            }
        }
        urls
    }
}

pub struct Resolver {
    registry: Arc<AgentRegistry>,
    driver: Arc<RunDriver>,
    agent: RoleAgent,
}

impl Resolver {
    pub fn new(registry: Arc<AgentRegistry>, driver: Arc<RunDriver>, agent: RoleAgent) -> Self {
        Self { registry, driver, agent }
    }

    /// Ask the resolver agent which URLs `phrase` refers to.
    ///
    /// A reply that parses but names no URL is `Unresolved`.
    ///
    /// # Errors
    ///
    /// `Error::InvalidInput` for a blank phrase and `Error::AgentLookup` when
    /// the resolver agent cannot be found or created. Everything else is
    /// reported through the result.
    pub async fn resolve_url_with_search(&self, phrase: &str) -> Result<ResolutionResult, Error> {
        let phrase = phrase.trim();
        if phrase.is_empty() {
            return Err(Error::InvalidInput("phrase must not be empty".into()));
        }

        let agent = self.agent.ensure(&self.registry).await?;

        let result = match self.driver.ask::<ResolverReply>(&agent.id, phrase).await {
            Reply::Answered(reply) => {
                let urls = reply.candidate_urls();
                if urls.is_empty() {
                    tracing::info!(phrase, explanation = %reply.explanation, "resolver found no URL");
                    ResolutionResult::Unresolved
                } else {
                    tracing::debug!(phrase, query = %reply.search_query_run, "resolver search query");
                    ResolutionResult::Found { urls }
                }
            }
            Reply::Rejected => ResolutionResult::Rejected,
            Reply::Unresolved => ResolutionResult::Unresolved,
        };

        tracing::info!(phrase, result = ?result, "resolved phrase");
        Ok(result)
    }

    /// Resolve `phrase` and record a `Found` answer in the cache's phrase
    /// index and URL map. The cache is not saved.
    pub async fn resolve_and_record(&self, phrase: &str, cache: &AliasCache) -> Result<ResolutionResult, Error> {
        let result = self.resolve_url_with_search(phrase).await?;
        if let ResolutionResult::Found { urls } = &result {
            let added = cache.record_resolution(phrase, urls).await;
            tracing::debug!(phrase, added, "recorded resolution");
        }
        Ok(result)
    }
}
