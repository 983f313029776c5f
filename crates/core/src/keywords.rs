//! Offline keyword lookup over a phrase → URL table.
//!
//! The table is read lazily on first use and kept for the lifetime of the
//! [`KeywordLookup`] value. It never touches the network, so it keeps
//! answering when the agent platform is unreachable.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::Error;
use crate::cache::artifact::{Artifact, read_artifact, read_json_file};
use crate::normalize::{ensure_scheme, normalize_phrase};

/// In-memory phrase → URLs table.
pub type KeywordTable = HashMap<String, Vec<String>>;

/// Where the keyword table is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeywordSource {
    /// The phrases artifact of a cache directory (`.json.gz` preferred).
    CacheDir(PathBuf),
    /// A single JSON file; decompressed when the name ends in `.gz`.
    File(PathBuf),
}

/// Lazily loaded, process-scoped keyword table.
#[derive(Debug)]
pub struct KeywordLookup {
    source: KeywordSource,
    table: RwLock<Option<Arc<KeywordTable>>>,
}

impl KeywordLookup {
    pub fn new(source: KeywordSource) -> Self {
        Self { source, table: RwLock::new(None) }
    }

    pub fn from_cache_dir(dir: impl Into<PathBuf>) -> Self {
        Self::new(KeywordSource::CacheDir(dir.into()))
    }

    pub fn from_file(path: impl Into<PathBuf>) -> Self {
        Self::new(KeywordSource::File(path.into()))
    }

    pub fn source(&self) -> &KeywordSource {
        &self.source
    }

    /// URLs stored for `keyword`, each with an explicit scheme.
    ///
    /// Tries the keyword verbatim, then in normalized form. Returns
    /// `Ok(None)` when the keyword is not in the table.
    pub async fn resolve(&self, keyword: &str) -> Result<Option<Vec<String>>, Error> {
        let table = self.table().await?;
        let urls = table
            .get(keyword)
            .or_else(|| table.get(&normalize_phrase(keyword)));

        Ok(urls.map(|urls| urls.iter().map(|u| ensure_scheme(u)).collect()))
    }

    /// Whether the table has been read yet.
    pub async fn is_loaded(&self) -> bool {
        self.table.read().await.is_some()
    }

    /// Re-read the table now. Returns the number of entries.
    pub async fn reload(&self) -> Result<usize, Error> {
        let mut slot = self.table.write().await;
        let table = Arc::new(read_table(&self.source).await?);
        let len = table.len();
        *slot = Some(table);
        Ok(len)
    }

    /// Drop the loaded table; the next lookup reads it again.
    pub async fn invalidate(&self) {
        *self.table.write().await = None;
    }

    async fn table(&self) -> Result<Arc<KeywordTable>, Error> {
        if let Some(table) = self.table.read().await.as_ref() {
            return Ok(table.clone());
        }

        let mut slot = self.table.write().await;
        if let Some(table) = slot.as_ref() {
            return Ok(table.clone());
        }

        let table = Arc::new(read_table(&self.source).await?);
        tracing::info!(source = ?self.source, entries = table.len(), "loaded keyword table");
        *slot = Some(table.clone());
        Ok(table)
    }
}

async fn read_table(source: &KeywordSource) -> Result<KeywordTable, Error> {
    let raw: Option<HashMap<String, Option<Vec<String>>>> = match source {
        KeywordSource::CacheDir(dir) => read_artifact(dir, Artifact::Phrases).await?,
        KeywordSource::File(path) => read_json_file(path).await?,
    };

    let Some(raw) = raw else {
        tracing::debug!(source = ?source, "keyword table not found, starting empty");
        return Ok(KeywordTable::new());
    };

    Ok(raw.into_iter().filter_map(|(phrase, urls)| urls.map(|urls| (phrase, urls))).collect())
}

impl KeywordSource {
    pub fn path(&self) -> &Path {
        match self {
            KeywordSource::CacheDir(path) | KeywordSource::File(path) => path,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_phrases(dir: &Path, json: &str) {
        std::fs::write(Artifact::Phrases.plain_path(dir), json).unwrap();
    }

    #[tokio::test]
    async fn test_resolve_known_and_unknown_keyword() {
        let dir = tempfile::tempdir().unwrap();
        write_phrases(dir.path(), r#"{"open apple": ["https://apple.com"]}"#);

        let lookup = KeywordLookup::from_cache_dir(dir.path());
        assert_eq!(lookup.resolve("open apple").await.unwrap(), Some(vec!["https://apple.com".to_string()]));
        assert_eq!(lookup.resolve("open banana").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_resolve_adds_missing_scheme() {
        let dir = tempfile::tempdir().unwrap();
        write_phrases(dir.path(), r#"{"open docs": ["docs.rs", "http://example.org", "www.rust-lang.org/learn"]}"#);

        let lookup = KeywordLookup::from_cache_dir(dir.path());
        let urls = lookup.resolve("open docs").await.unwrap().unwrap();
        assert_eq!(urls, vec!["https://docs.rs", "http://example.org", "https://www.rust-lang.org/learn"]);
        assert!(urls.iter().all(|u| crate::normalize::has_scheme(u)));
    }

    #[tokio::test]
    async fn test_null_entries_are_absent() {
        let dir = tempfile::tempdir().unwrap();
        write_phrases(dir.path(), r#"{"open nothing": null, "open apple": ["apple.com"]}"#);

        let lookup = KeywordLookup::from_cache_dir(dir.path());
        assert_eq!(lookup.resolve("open nothing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_normalized_fallback() {
        let dir = tempfile::tempdir().unwrap();
        write_phrases(dir.path(), r#"{"open apple": ["https://apple.com"]}"#);

        let lookup = KeywordLookup::from_cache_dir(dir.path());
        assert!(lookup.resolve("  Open APPLE ").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_missing_table_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let lookup = KeywordLookup::from_file(dir.path().join("keywords.json"));
        assert_eq!(lookup.resolve("open apple").await.unwrap(), None);
        assert!(lookup.is_loaded().await);
    }

    #[tokio::test]
    async fn test_loaded_once_until_reload() {
        let dir = tempfile::tempdir().unwrap();
        write_phrases(dir.path(), r#"{"open apple": ["https://apple.com"]}"#);

        let lookup = KeywordLookup::from_cache_dir(dir.path());
        assert!(!lookup.is_loaded().await);
        lookup.resolve("open apple").await.unwrap();

        write_phrases(dir.path(), r#"{"open pear": ["https://pear.example"]}"#);
        assert_eq!(lookup.resolve("open pear").await.unwrap(), None);

        assert_eq!(lookup.reload().await.unwrap(), 1);
        assert!(lookup.resolve("open pear").await.unwrap().is_some());
        assert_eq!(lookup.resolve("open apple").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_invalidate_forces_reread() {
        let dir = tempfile::tempdir().unwrap();
        write_phrases(dir.path(), r#"{"open apple": ["https://apple.com"]}"#);

        let lookup = KeywordLookup::from_cache_dir(dir.path());
        lookup.resolve("open apple").await.unwrap();
        lookup.invalidate().await;
        assert!(!lookup.is_loaded().await);

        write_phrases(dir.path(), r#"{"open pear": ["pear.example"]}"#);
        assert_eq!(lookup.resolve("open pear").await.unwrap(), Some(vec!["https://pear.example".to_string()]));
    }

    #[tokio::test]
    async fn test_corrupt_table_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keywords.json");
        std::fs::write(&path, "[1, 2, 3]").unwrap();

        let lookup = KeywordLookup::from_file(&path);
        assert!(matches!(lookup.resolve("open apple").await, Err(Error::CacheIo { .. })));
    }
}
