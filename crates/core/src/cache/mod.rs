//! Persisted alias cache.
//!
//! Three JSON artifacts live in one cache directory:
//!
//! - `domains.json`: domain → scan statistics
//! - `urls.json`: URL → phrases and title
//! - `phrases.json`: phrase → URLs
//!
//! Each may be gzip-compressed (`.json.gz`); the compressed variant wins on
//! load. Compression is fixed per cache at construction.

pub mod artifact;
pub mod merge;
pub mod records;
pub mod store;

pub use artifact::Artifact;
pub use merge::{DedupMerge, DiscoveredPage, DiscoveryBatch, MergeReport, MergeStrategy, PhrasePrecedence, ScanStats};
pub use records::{CacheMaps, DomainRecord, UrlRecord};
pub use store::AliasCache;
