//! discover_aliases tool implementation.
//!
//! Runs the keyword extractor and the open-phrase generator for a domain,
//! merges what they find into the cache and saves it.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sitealias_core::cache::MergeReport;
use sitealias_core::normalize::domain_of;
use sitealias_core::{DiscoveryOutcome, Error};

use super::{default_true, json_result};
use crate::state::ServerState;

/// Parameters for the discover_aliases tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DiscoverAliasesParams {
    /// Domain or URL of the site, e.g. "apple.com".
    pub domain: String,

    /// Number of search results to generate phrases for (default: configured value).
    #[serde(default)]
    pub top_n: Option<u32>,

    /// Run the keyword extractor (default: true).
    #[serde(default = "default_true")]
    pub keywords: bool,

    /// Run the open-phrase generator (default: true).
    #[serde(default = "default_true")]
    pub phrases: bool,
}

/// How one discovery step ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Found,
    Rejected,
    Unresolved,
    Skipped,
}

impl<T> From<&DiscoveryOutcome<T>> for StepStatus {
    fn from(outcome: &DiscoveryOutcome<T>) -> Self {
        match outcome {
            DiscoveryOutcome::Found(_) => StepStatus::Found,
            DiscoveryOutcome::Rejected => StepStatus::Rejected,
            DiscoveryOutcome::Unresolved => StepStatus::Unresolved,
        }
    }
}

/// Output from the discover_aliases tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DiscoverAliasesOutput {
    pub domain: String,
    pub keywords: StepStatus,
    pub phrases: StepStatus,
    pub phrases_added: usize,
    pub urls_added: usize,
    pub links_added: usize,
    /// Whether the cache was saved.
    pub saved: bool,
}

impl DiscoverAliasesOutput {
    fn new(domain: String) -> Self {
        Self {
            domain,
            keywords: StepStatus::Skipped,
            phrases: StepStatus::Skipped,
            phrases_added: 0,
            urls_added: 0,
            links_added: 0,
            saved: false,
        }
    }

    fn absorb(&mut self, report: MergeReport) {
        self.phrases_added += report.phrases_added;
        self.urls_added += report.urls_added;
        self.links_added += report.links_added;
    }

    fn found_any(&self) -> bool {
        self.keywords == StepStatus::Found || self.phrases == StepStatus::Found
    }
}

pub async fn discover_aliases(
    state: &ServerState, params: DiscoverAliasesParams,
) -> Result<DiscoverAliasesOutput, Error> {
    let domain = domain_of(&params.domain);
    if domain.is_empty() {
        return Err(Error::InvalidInput("domain cannot be empty".into()));
    }
    if !params.keywords && !params.phrases {
        return Err(Error::InvalidInput("at least one of keywords or phrases must be enabled".into()));
    }

    let discoverer = &state.workflows()?.discoverer;
    let mut output = DiscoverAliasesOutput::new(domain.clone());

    if params.keywords {
        let outcome = discoverer.extract_keywords(&domain).await?;
        output.keywords = StepStatus::from(&outcome);
        if let DiscoveryOutcome::Found(report) = outcome {
            output.absorb(state.cache.merge(&report.into_batch(&domain), &state.merge).await);
        }
    }

    if params.phrases {
        let top_n = params.top_n.unwrap_or(state.discovery_top_n);
        let outcome = discoverer.generate_open_phrases(&domain, top_n).await?;
        output.phrases = StepStatus::from(&outcome);
        if let DiscoveryOutcome::Found(report) = outcome {
            output.absorb(state.cache.merge(&report.into_batch(&domain), &state.merge).await);
        }
    }

    if output.found_any() {
        state.persist().await?;
        output.saved = true;
    }

    tracing::info!(
        domain = %output.domain,
        keywords = ?output.keywords,
        phrases = ?output.phrases,
        phrases_added = output.phrases_added,
        "alias discovery finished"
    );
    Ok(output)
}

/// Implementation of the discover_aliases tool.
pub async fn discover_aliases_impl(
    state: &ServerState, params: DiscoverAliasesParams,
) -> Result<CallToolResult, McpError> {
    json_result(&discover_aliases(state, params).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::fixtures::{offline_state, scripted_state};
    use sitealias_client::testing::Script;

    const KEYWORDS: &str = r#"{"site": "apple.com", "brandedKeywords": ["Apple", "iPhone"], "topRankingKeywords": null}"#;

    const PHRASES: &str = r#"{"urls": [{"pageTitle": "Mac", "pageUrl": "https://www.apple.com/mac/",
        "openPhrases": ["open mac"]}], "searchQueryRun": "site:apple.com"}"#;

    fn params(domain: &str) -> DiscoverAliasesParams {
        DiscoverAliasesParams { domain: domain.into(), top_n: None, keywords: true, phrases: true }
    }

    #[tokio::test]
    async fn test_without_platform_is_not_configured() {
        let dir = tempfile::tempdir().unwrap();
        let state = offline_state(dir.path());
        assert!(matches!(discover_aliases(&state, params("apple.com")).await, Err(Error::NotConfigured(_))));
    }

    #[tokio::test]
    async fn test_input_validation() {
        let dir = tempfile::tempdir().unwrap();
        let state = offline_state(dir.path());

        assert!(matches!(discover_aliases(&state, params("")).await, Err(Error::InvalidInput(_))));

        let nothing = DiscoverAliasesParams { keywords: false, phrases: false, ..params("apple.com") };
        assert!(matches!(discover_aliases(&state, nothing).await, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_step_status_from_outcome() {
        assert_eq!(StepStatus::from(&DiscoveryOutcome::Found(())), StepStatus::Found);
        assert_eq!(StepStatus::from(&DiscoveryOutcome::<()>::Rejected), StepStatus::Rejected);

        let json = serde_json::to_value(StepStatus::Unresolved).unwrap();
        assert_eq!(json, "unresolved");
    }

    #[tokio::test]
    async fn test_found_steps_are_merged_and_saved() {
        let dir = tempfile::tempdir().unwrap();
        let (platform, state) = scripted_state(
            dir.path(),
            [Script::Complete(Some(KEYWORDS.into())), Script::Complete(Some(PHRASES.into()))],
        );

        let output = discover_aliases(&state, DiscoverAliasesParams { top_n: Some(3), ..params("apple.com") })
            .await
            .unwrap();

        assert_eq!(output.keywords, StepStatus::Found);
        assert_eq!(output.phrases, StepStatus::Found);
        assert_eq!(output.phrases_added, 3);
        assert_eq!(output.urls_added, 2);
        assert!(output.saved);
        assert!(dir.path().join("phrases.json").exists());
        assert_eq!(
            state.keywords.resolve("open mac").await.unwrap(),
            Some(vec!["https://www.apple.com/mac/".to_string()])
        );
        assert_eq!(state.keywords.resolve("iPhone").await.unwrap(), Some(vec!["https://apple.com".to_string()]));

        let prompt: serde_json::Value = serde_json::from_str(&platform.posted_prompts()[1]).unwrap();
        assert_eq!(prompt["topN"], 3);
    }

    #[tokio::test]
    async fn test_nothing_found_is_not_saved() {
        let dir = tempfile::tempdir().unwrap();
        let (_, state) = scripted_state(dir.path(), [Script::ContentFilter, Script::Fail]);

        let output = discover_aliases(&state, params("apple.com")).await.unwrap();

        assert_eq!(output.keywords, StepStatus::Rejected);
        assert_eq!(output.phrases, StepStatus::Unresolved);
        assert_eq!(output.phrases_added, 0);
        assert!(!output.saved);
        assert!(!dir.path().join("phrases.json").exists());
    }

    #[tokio::test]
    async fn test_skipped_step_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let (platform, state) = scripted_state(dir.path(), [Script::Complete(Some(PHRASES.into()))]);

        let output =
            discover_aliases(&state, DiscoverAliasesParams { keywords: false, ..params("apple.com") }).await.unwrap();

        assert_eq!(output.keywords, StepStatus::Skipped);
        assert_eq!(output.phrases, StepStatus::Found);
        assert!(output.saved);
        assert_eq!(platform.stats().runs_created, 1);
    }
}
