//! Core types and shared functionality for sitealias.
//!
//! This crate provides:
//! - The persisted alias cache (domains, URLs, phrase index)
//! - Offline keyword lookup over the phrase index
//! - Workflow outcome types
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod keywords;
pub mod normalize;
pub mod outcome;
pub mod role;

pub use cache::{AliasCache, CacheMaps, DedupMerge, DiscoveredPage, DiscoveryBatch, MergeStrategy};
pub use config::{AppConfig, ConfigError};
pub use error::Error;
pub use keywords::{KeywordLookup, KeywordSource};
pub use outcome::{DiscoveryOutcome, ResolutionResult, ValidationResult, Validity, ValidityField, ValidityVerdict};
pub use role::AgentRole;
