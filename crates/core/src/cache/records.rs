//! Record types held by the alias cache.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Scan statistics for one domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainRecord {
    pub domain: String,
    pub date_indexed: DateTime<Utc>,
    pub urls_found: u64,
}

/// Metadata for one resolved or validated URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlRecord {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phrases: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl UrlRecord {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into(), phrases: None, title: None }
    }
}

pub type DomainMap = BTreeMap<String, DomainRecord>;
pub type UrlMap = BTreeMap<String, UrlRecord>;
/// Phrase → URLs, in the order they were associated.
pub type PhraseMap = BTreeMap<String, Vec<String>>;

/// The three maps owned by an [`AliasCache`](super::AliasCache).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheMaps {
    pub domains: DomainMap,
    pub urls: UrlMap,
    pub phrases: PhraseMap,
}

impl CacheMaps {
    pub fn is_empty(&self) -> bool {
        self.domains.is_empty() && self.urls.is_empty() && self.phrases.is_empty()
    }
}
