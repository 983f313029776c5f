//! Merging discovered aliases into the cache maps.
//!
//! The write policy is pluggable through [`MergeStrategy`]. [`DedupMerge`]
//! is the default: phrases are normalized and de-duplicated, a phrase's URL
//! list never holds the same URL twice, and the two knobs below decide
//! ordering and domain statistics on re-scans.

use chrono::{DateTime, Utc};

use super::records::{CacheMaps, DomainRecord, UrlRecord};
use crate::normalize::{domain_of, ensure_scheme, normalize_phrase};

/// One page and the phrases that should open it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredPage {
    pub url: String,
    pub title: Option<String>,
    pub phrases: Vec<String>,
}

/// Output of one discovery scan of a domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryBatch {
    pub domain: String,
    pub scanned_at: DateTime<Utc>,
    pub pages: Vec<DiscoveredPage>,
}

impl DiscoveryBatch {
    pub fn new(domain: impl Into<String>, pages: Vec<DiscoveredPage>) -> Self {
        Self { domain: domain.into(), scanned_at: Utc::now(), pages }
    }
}

/// Counts of what a merge changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeReport {
    pub phrases_added: usize,
    pub urls_added: usize,
    pub links_added: usize,
    pub domain_updated: bool,
}

/// Where a URL re-discovered for an existing phrase ends up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PhrasePrecedence {
    /// Existing order is kept; new URLs are appended.
    #[default]
    KeepExisting,
    /// The most recently discovered URL moves to the front.
    PreferLatest,
}

/// When a domain's `dateIndexed`/`urlsFound` are written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ScanStats {
    /// Only the first scan of a domain records statistics.
    FirstScan,
    /// Every scan overwrites the statistics.
    #[default]
    EveryScan,
}

/// Policy for folding a [`DiscoveryBatch`] into [`CacheMaps`].
pub trait MergeStrategy: Send + Sync {
    fn merge(&self, maps: &mut CacheMaps, batch: &DiscoveryBatch) -> MergeReport;
}

/// Default de-duplicating merge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DedupMerge {
    pub precedence: PhrasePrecedence,
    pub scan_stats: ScanStats,
}

impl MergeStrategy for DedupMerge {
    fn merge(&self, maps: &mut CacheMaps, batch: &DiscoveryBatch) -> MergeReport {
        let mut report = MergeReport::default();

        let mut distinct_urls: Vec<String> = Vec::new();
        for page in &batch.pages {
            if page.url.trim().is_empty() {
                continue;
            }
            let url = ensure_scheme(&page.url);
            if !distinct_urls.contains(&url) {
                distinct_urls.push(url.clone());
            }

            let phrases = clean_phrases(&page.phrases);
            if upsert_url(maps, &url, page.title.as_deref(), &phrases) {
                report.urls_added += 1;
            }
            for phrase in &phrases {
                if !maps.phrases.contains_key(phrase) {
                    report.phrases_added += 1;
                }
                if link(maps, phrase, &url, self.precedence) {
                    report.links_added += 1;
                }
            }
        }

        let domain = domain_of(&batch.domain);
        if !domain.is_empty() {
            let exists = maps.domains.contains_key(&domain);
            if !exists || self.scan_stats == ScanStats::EveryScan {
                maps.domains.insert(
                    domain.clone(),
                    DomainRecord { domain, date_indexed: batch.scanned_at, urls_found: distinct_urls.len() as u64 },
                );
                report.domain_updated = true;
            }
        }

        report
    }
}

/// Normalize, drop empties and de-duplicate while keeping first-seen order.
pub(crate) fn clean_phrases(phrases: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(phrases.len());
    for phrase in phrases.iter().map(|p| normalize_phrase(p)) {
        if !phrase.is_empty() && !out.contains(&phrase) {
            out.push(phrase);
        }
    }
    out
}

/// Associate `url` with `phrase`. Returns true if the pair is new.
pub(crate) fn link(maps: &mut CacheMaps, phrase: &str, url: &str, precedence: PhrasePrecedence) -> bool {
    let urls = maps.phrases.entry(phrase.to_string()).or_default();
    match urls.iter().position(|u| u == url) {
        Some(idx) => {
            if precedence == PhrasePrecedence::PreferLatest && idx != 0 {
                let existing = urls.remove(idx);
                urls.insert(0, existing);
            }
            false
        }
        None => {
            match precedence {
                PhrasePrecedence::KeepExisting => urls.push(url.to_string()),
                PhrasePrecedence::PreferLatest => urls.insert(0, url.to_string()),
            }
            true
        }
    }
}

/// Insert or update a URL record. Returns true if the record is new.
///
/// An existing title is kept; phrases are unioned in first-seen order.
pub(crate) fn upsert_url(maps: &mut CacheMaps, url: &str, title: Option<&str>, phrases: &[String]) -> bool {
    let mut created = false;
    let record = maps.urls.entry(url.to_string()).or_insert_with(|| {
        created = true;
        UrlRecord::new(url)
    });

    if record.title.is_none() {
        record.title = title.map(str::trim).filter(|t| !t.is_empty()).map(str::to_string);
    }

    if !phrases.is_empty() {
        let known = record.phrases.get_or_insert_with(Vec::new);
        for phrase in phrases {
            if !known.contains(phrase) {
                known.push(phrase.clone());
            }
        }
    }

    created
}
