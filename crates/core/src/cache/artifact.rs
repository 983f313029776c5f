//! On-disk artifacts: plain or gzip-compressed JSON, replaced atomically.
//!
//! A `.json.gz` artifact takes precedence over a `.json` one with the same
//! stem. Writes go to a temporary file in the same directory, are fsynced,
//! then renamed over the target.

use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::io::AsyncWriteExt;

use crate::Error;

/// Logical artifacts stored in a cache directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Artifact {
    Domains,
    Urls,
    Phrases,
}

impl Artifact {
    pub const ALL: [Artifact; 3] = [Artifact::Domains, Artifact::Urls, Artifact::Phrases];

    pub fn stem(&self) -> &'static str {
        match self {
            Artifact::Domains => "domains",
            Artifact::Urls => "urls",
            Artifact::Phrases => "phrases",
        }
    }

    pub fn plain_path(&self, dir: &Path) -> PathBuf {
        dir.join(format!("{}.json", self.stem()))
    }

    pub fn gz_path(&self, dir: &Path) -> PathBuf {
        dir.join(format!("{}.json.gz", self.stem()))
    }

    /// Path that would be read for this artifact, if any variant exists.
    pub async fn locate(&self, dir: &Path) -> Result<Option<PathBuf>, Error> {
        for path in [self.gz_path(dir), self.plain_path(dir)] {
            if tokio::fs::try_exists(&path).await.map_err(|e| Error::cache_io(&path, e))? {
                return Ok(Some(path));
            }
        }
        Ok(None)
    }
}

fn is_gzip_path(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "gz")
}

/// Read and parse an artifact from `dir`, preferring the compressed variant.
///
/// Returns `Ok(None)` when neither variant exists.
pub async fn read_artifact<T: DeserializeOwned>(dir: &Path, artifact: Artifact) -> Result<Option<T>, Error> {
    match artifact.locate(dir).await? {
        Some(path) => read_json_file(&path).await,
        None => Ok(None),
    }
}

/// Read and parse a JSON file, decompressing it when the name ends in `.gz`.
///
/// Returns `Ok(None)` when the file does not exist.
pub async fn read_json_file<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, Error> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(Error::cache_io(path, e)),
    };

    let text = if is_gzip_path(path) { gunzip(&bytes).map_err(|e| Error::cache_io(path, e))? } else { bytes };

    serde_json::from_slice(&text).map(Some).map_err(|e| Error::cache_io(path, e))
}

/// Serialize `value` into the artifact and atomically replace it on disk.
///
/// The variant of the other mode is removed afterwards so load precedence
/// cannot pick up stale data.
pub async fn write_artifact<T: Serialize>(
    dir: &Path, artifact: Artifact, value: &T, compressed: bool,
) -> Result<PathBuf, Error> {
    let (target, stale) = if compressed {
        (artifact.gz_path(dir), artifact.plain_path(dir))
    } else {
        (artifact.plain_path(dir), artifact.gz_path(dir))
    };

    let json = (if compressed { serde_json::to_vec(value) } else { serde_json::to_vec_pretty(value) })
        .map_err(|e| Error::cache_io(&target, e))?;
    let payload = if compressed { gzip(&json).map_err(|e| Error::cache_io(&target, e))? } else { json };

    write_atomic(&target, &payload).await?;

    match tokio::fs::remove_file(&stale).await {
        Ok(()) => tracing::debug!(path = %stale.display(), "removed stale artifact"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(Error::cache_io(&stale, e)),
    }

    Ok(target)
}

async fn write_atomic(target: &Path, payload: &[u8]) -> Result<(), Error> {
    let file_name = target.file_name().and_then(|n| n.to_str()).unwrap_or("artifact");
    let tmp = target.with_file_name(format!(".{file_name}.{}.tmp", std::process::id()));

    let result = async {
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(payload).await?;
        file.sync_all().await?;
        drop(file);
        tokio::fs::rename(&tmp, target).await
    }
    .await;

    if let Err(e) = result {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(Error::cache_io(target, e));
    }
    Ok(())
}

fn gzip(bytes: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(bytes)?;
    encoder.finish()
}

fn gunzip(bytes: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut out = Vec::new();
    GzDecoder::new(bytes).read_to_end(&mut out)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn sample() -> BTreeMap<String, Vec<String>> {
        BTreeMap::from([("open apple".to_string(), vec!["https://apple.com".to_string()])])
    }

    #[tokio::test]
    async fn test_missing_artifact_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let loaded: Option<BTreeMap<String, Vec<String>>> =
            read_artifact(dir.path(), Artifact::Phrases).await.unwrap();
        assert!(loaded.is_none());
    }

    #[tokio::test]
    async fn test_gz_takes_precedence() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(Artifact::Phrases.plain_path(dir.path()), r#"{"open old": ["https://old.example"]}"#).unwrap();
        std::fs::write(Artifact::Phrases.gz_path(dir.path()), gzip(&serde_json::to_vec(&sample()).unwrap()).unwrap())
            .unwrap();

        let loaded: BTreeMap<String, Vec<String>> =
            read_artifact(dir.path(), Artifact::Phrases).await.unwrap().unwrap();
        assert_eq!(loaded, sample());
    }

    #[tokio::test]
    async fn test_write_removes_other_variant() {
        let dir = tempfile::tempdir().unwrap();
        write_artifact(dir.path(), Artifact::Urls, &sample(), false).await.unwrap();
        assert!(Artifact::Urls.plain_path(dir.path()).exists());

        write_artifact(dir.path(), Artifact::Urls, &sample(), true).await.unwrap();
        assert!(Artifact::Urls.gz_path(dir.path()).exists());
        assert!(!Artifact::Urls.plain_path(dir.path()).exists());
    }

    #[tokio::test]
    async fn test_write_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        write_artifact(dir.path(), Artifact::Domains, &sample(), true).await.unwrap();

        let names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["domains.json.gz".to_string()]);
    }

    #[tokio::test]
    async fn test_corrupt_artifact_is_cache_io_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(Artifact::Urls.gz_path(dir.path()), b"definitely not gzip").unwrap();

        let result: Result<Option<BTreeMap<String, Vec<String>>>, Error> =
            read_artifact(dir.path(), Artifact::Urls).await;
        assert!(matches!(result, Err(Error::CacheIo { .. })));
    }
}
