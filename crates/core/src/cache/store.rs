//! The alias cache: domain stats, URL metadata and the phrase index.
//!
//! All state sits behind one async mutex, so mutations and `save` are
//! serialized. Nothing is persisted until the caller invokes `save`.

use std::path::{Path, PathBuf};

use tokio::sync::Mutex;

use super::artifact::{Artifact, read_artifact, write_artifact};
use super::merge::{self, DiscoveryBatch, MergeReport, MergeStrategy, PhrasePrecedence};
use super::records::{CacheMaps, DomainMap, DomainRecord, PhraseMap, UrlMap, UrlRecord};
use crate::Error;
use crate::normalize::{ensure_scheme, normalize_phrase};

/// Persisted alias/URL cache.
#[derive(Debug)]
pub struct AliasCache {
    dir: PathBuf,
    compressed: bool,
    maps: Mutex<CacheMaps>,
}

impl AliasCache {
    /// Create an empty cache bound to `dir`.
    ///
    /// `compressed` applies to every artifact written by [`save`](Self::save).
    pub fn new(dir: impl Into<PathBuf>, compressed: bool) -> Self {
        Self { dir: dir.into(), compressed, maps: Mutex::new(CacheMaps::default()) }
    }

    /// Create a cache pre-populated with `maps`.
    pub fn with_maps(dir: impl Into<PathBuf>, compressed: bool, maps: CacheMaps) -> Self {
        Self { dir: dir.into(), compressed, maps: Mutex::new(maps) }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn is_compressed(&self) -> bool {
        self.compressed
    }

    /// Load all three maps from the cache directory.
    ///
    /// Creates the directory when it does not exist. A missing artifact
    /// leaves its map empty; a present but unreadable one is an error.
    pub async fn load(&self) -> Result<(), Error> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| Error::cache_io(&self.dir, e))?;

        let mut maps = self.maps.lock().await;
        let domains: DomainMap = read_artifact(&self.dir, Artifact::Domains).await?.unwrap_or_default();
        let urls: UrlMap = read_artifact(&self.dir, Artifact::Urls).await?.unwrap_or_default();
        let phrases: PhraseMap = read_artifact(&self.dir, Artifact::Phrases).await?.unwrap_or_default();

        tracing::info!(
            dir = %self.dir.display(),
            domains = domains.len(),
            urls = urls.len(),
            phrases = phrases.len(),
            "loaded alias cache"
        );

        *maps = CacheMaps { domains, urls, phrases };
        Ok(())
    }

    /// Refresh only the phrase index.
    ///
    /// A missing cache directory means there is nothing to load.
    pub async fn load_phrases(&self) -> Result<(), Error> {
        if !tokio::fs::try_exists(&self.dir)
            .await
            .map_err(|e| Error::cache_io(&self.dir, e))?
        {
            tracing::info!(dir = %self.dir.display(), "cache directory missing, no phrases to load");
            return Ok(());
        }

        let mut maps = self.maps.lock().await;
        let phrases: PhraseMap = read_artifact(&self.dir, Artifact::Phrases).await?.unwrap_or_default();
        tracing::debug!(phrases = phrases.len(), "refreshed phrase index");
        maps.phrases = phrases;
        Ok(())
    }

    /// Write all three maps to the cache directory.
    ///
    /// Each artifact is replaced atomically; the set of three is not.
    pub async fn save(&self) -> Result<(), Error> {
        let maps = self.maps.lock().await;

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| Error::cache_io(&self.dir, e))?;

        write_artifact(&self.dir, Artifact::Domains, &maps.domains, self.compressed).await?;
        write_artifact(&self.dir, Artifact::Urls, &maps.urls, self.compressed).await?;
        write_artifact(&self.dir, Artifact::Phrases, &maps.phrases, self.compressed).await?;

        tracing::info!(
            dir = %self.dir.display(),
            compressed = self.compressed,
            domains = maps.domains.len(),
            urls = maps.urls.len(),
            phrases = maps.phrases.len(),
            "saved alias cache"
        );
        Ok(())
    }

    /// Clone of the current maps.
    pub async fn snapshot(&self) -> CacheMaps {
        self.maps.lock().await.clone()
    }

    pub async fn domain(&self, domain: &str) -> Option<DomainRecord> {
        self.maps.lock().await.domains.get(domain).cloned()
    }

    pub async fn url_record(&self, url: &str) -> Option<UrlRecord> {
        self.maps.lock().await.urls.get(url).cloned()
    }

    /// URLs associated with a phrase, matched in normalized form.
    /// URLs indexed for `phrase`, scheme-normalized and de-duplicated.
    ///
    /// Artifacts written by other tools may hold bare hostnames; those never
    /// reach the caller.
    pub async fn phrase_urls(&self, phrase: &str) -> Option<Vec<String>> {
        let maps = self.maps.lock().await;
        let raw = maps
            .phrases
            .get(phrase)
            .or_else(|| maps.phrases.get(&normalize_phrase(phrase)))?;

        let mut urls: Vec<String> = Vec::with_capacity(raw.len());
        for url in raw.iter().filter(|u| !u.trim().is_empty()).map(|u| ensure_scheme(u)) {
            if !urls.contains(&url) {
                urls.push(url);
            }
        }
        Some(urls)
    }

    pub async fn phrase_count(&self) -> usize {
        self.maps.lock().await.phrases.len()
    }

    /// Fold a discovery batch into the maps using `strategy`.
    pub async fn merge(&self, batch: &DiscoveryBatch, strategy: &dyn MergeStrategy) -> MergeReport {
        let mut maps = self.maps.lock().await;
        let report = strategy.merge(&mut maps, batch);
        tracing::debug!(
            domain = %batch.domain,
            phrases_added = report.phrases_added,
            urls_added = report.urls_added,
            links_added = report.links_added,
            "merged discovery batch"
        );
        report
    }

    /// Record a resolved phrase → URLs answer.
    ///
    /// Returns the number of new phrase/URL associations.
    pub async fn record_resolution(&self, phrase: &str, urls: &[String]) -> usize {
        let phrase = normalize_phrase(phrase);
        if phrase.is_empty() {
            return 0;
        }

        let mut maps = self.maps.lock().await;
        let mut added = 0;
        for url in urls.iter().filter(|u| !u.trim().is_empty()).map(|u| ensure_scheme(u)) {
            merge::upsert_url(&mut maps, &url, None, std::slice::from_ref(&phrase));
            if merge::link(&mut maps, &phrase, &url, PhrasePrecedence::KeepExisting) {
                added += 1;
            }
        }
        added
    }
}
