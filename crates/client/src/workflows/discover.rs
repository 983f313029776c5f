//! Alias discovery for a domain: branded keywords and "open ..." phrases.
//!
//! Both reports convert into a [`DiscoveryBatch`] that the caller merges
//! into the cache with a [`MergeStrategy`](sitealias_core::MergeStrategy).

use std::sync::Arc;

use serde::Deserialize;
use sitealias_core::normalize::{domain_of, ensure_scheme};
use sitealias_core::{DiscoveredPage, DiscoveryBatch, DiscoveryOutcome, Error};

use super::RoleAgent;
use crate::registry::AgentRegistry;
use crate::run::{Reply, RunDriver};

/// Upper bound on the number of search results a phrase scan covers.
pub const MAX_TOP_N: u32 = 50;

/// Keywords implicit in a domain's branding.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct KeywordReport {
    #[serde(deserialize_with = "super::null_as_default")]
    pub site: String,
    #[serde(deserialize_with = "super::null_as_default")]
    pub branded_keywords: Vec<String>,
    #[serde(deserialize_with = "super::null_as_default")]
    pub top_ranking_keywords: Vec<String>,
    #[serde(deserialize_with = "super::null_as_default")]
    pub extracted_keywords_by_click: Vec<String>,
}

impl KeywordReport {
    /// All keywords, blank entries dropped, first occurrence kept.
    pub fn keywords(&self) -> Vec<String> {
        let mut seen: Vec<String> = Vec::new();
        let all = self
            .branded_keywords
            .iter()
            .chain(&self.top_ranking_keywords)
            .chain(&self.extracted_keywords_by_click);
        for keyword in all.map(|k| k.trim()).filter(|k| !k.is_empty()) {
            if !seen.iter().any(|s| s.eq_ignore_ascii_case(keyword)) {
                seen.push(keyword.to_string());
            }
        }
        seen
    }

    /// One page for the site's home URL carrying every keyword as a phrase.
    pub fn into_batch(self, domain: &str) -> DiscoveryBatch {
        let site = if self.site.trim().is_empty() { domain } else { self.site.as_str() };
        let page = DiscoveredPage { url: ensure_scheme(site), title: None, phrases: self.keywords() };
        let pages = if page.phrases.is_empty() { Vec::new() } else { vec![page] };
        DiscoveryBatch::new(domain, pages)
    }
}

/// One search result and the phrases that should open it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PhrasePage {
    pub page_title: Option<String>,
    #[serde(deserialize_with = "super::null_as_default")]
    pub page_url: String,
    #[serde(deserialize_with = "super::null_as_default")]
    pub open_phrases: Vec<String>,
}

/// Open phrases for the top results of a site-restricted search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PhraseReport {
    #[serde(deserialize_with = "super::null_as_default")]
    pub urls: Vec<PhrasePage>,
    #[serde(deserialize_with = "super::null_as_default")]
    pub search_query_run: String,
}

impl PhraseReport {
    pub fn into_batch(self, domain: &str) -> DiscoveryBatch {
        let pages = self
            .urls
            .into_iter()
            .filter(|p| !p.page_url.trim().is_empty())
            .map(|p| DiscoveredPage {
                url: ensure_scheme(&p.page_url),
                title: p.page_title.filter(|t| !t.trim().is_empty()),
                phrases: p.open_phrases,
            })
            .collect();
        DiscoveryBatch::new(domain, pages)
    }
}

pub struct Discoverer {
    registry: Arc<AgentRegistry>,
    driver: Arc<RunDriver>,
    keyword_agent: RoleAgent,
    phrase_agent: RoleAgent,
}

impl Discoverer {
    pub fn new(
        registry: Arc<AgentRegistry>, driver: Arc<RunDriver>, keyword_agent: RoleAgent, phrase_agent: RoleAgent,
    ) -> Self {
        Self { registry, driver, keyword_agent, phrase_agent }
    }

    /// Ask the keyword extractor which keywords refer to `domain`.
    pub async fn extract_keywords(&self, domain: &str) -> Result<DiscoveryOutcome<KeywordReport>, Error> {
        let domain = require_domain(domain)?;
        let agent = self.keyword_agent.ensure(&self.registry).await?;

        let outcome = into_outcome(self.driver.ask::<KeywordReport>(&agent.id, &domain).await);
        if let DiscoveryOutcome::Found(report) = &outcome {
            tracing::info!(domain, keywords = report.keywords().len(), "extracted keywords");
        } else {
            tracing::info!(domain, outcome = ?outcome, "keyword extraction gave no report");
        }
        Ok(outcome)
    }

    /// Ask the phrase generator for open phrases of the top `top_n` pages of `domain`.
    pub async fn generate_open_phrases(&self, domain: &str, top_n: u32) -> Result<DiscoveryOutcome<PhraseReport>, Error> {
        let domain = require_domain(domain)?;
        if !(1..=MAX_TOP_N).contains(&top_n) {
            return Err(Error::InvalidInput(format!("top_n must be between 1 and {MAX_TOP_N}, got {top_n}")));
        }
        let agent = self.phrase_agent.ensure(&self.registry).await?;

        let request = serde_json::json!({ "domain": domain, "topN": top_n }).to_string();
        let outcome = into_outcome(self.driver.ask::<PhraseReport>(&agent.id, &request).await);
        if let DiscoveryOutcome::Found(report) = &outcome {
            tracing::info!(domain, pages = report.urls.len(), query = %report.search_query_run, "generated open phrases");
        } else {
            tracing::info!(domain, outcome = ?outcome, "phrase generation gave no report");
        }
        Ok(outcome)
    }
}

fn require_domain(domain: &str) -> Result<String, Error> {
    let domain = domain_of(domain);
    if domain.is_empty() {
        return Err(Error::InvalidInput("domain must not be empty".into()));
    }
    Ok(domain)
}

fn into_outcome<T>(reply: Reply<T>) -> DiscoveryOutcome<T> {
    match reply {
        Reply::Answered(value) => DiscoveryOutcome::Found(value),
        Reply::Rejected => DiscoveryOutcome::Rejected,
        Reply::Unresolved => DiscoveryOutcome::Unresolved,
    }
}
