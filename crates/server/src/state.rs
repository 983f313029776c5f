//! Process-wide state shared by the tool handlers.

use std::sync::Arc;

use sitealias_client::{HttpPlatform, PlatformConfig, Workflows};
use sitealias_core::{AliasCache, AppConfig, DedupMerge, Error, KeywordLookup};

/// Cache, keyword table and (when a platform endpoint is configured) the
/// agent workflows.
pub struct ServerState {
    pub cache: AliasCache,
    pub keywords: KeywordLookup,
    pub workflows: Option<Workflows>,
    pub merge: DedupMerge,
    pub discovery_top_n: u32,
}

impl ServerState {
    pub fn new(cache: AliasCache, keywords: KeywordLookup, workflows: Option<Workflows>, discovery_top_n: u32) -> Self {
        Self { cache, keywords, workflows, merge: DedupMerge::default(), discovery_top_n }
    }

    /// Load the cache and connect the workflows.
    ///
    /// A missing endpoint is not an error: keyword lookup keeps working and
    /// the agent tools report `NOT_CONFIGURED`.
    pub async fn from_config(config: &AppConfig) -> Result<Self, Error> {
        let cache = AliasCache::new(&config.cache_dir, config.compressed);
        cache.load().await?;

        let keywords = KeywordLookup::from_cache_dir(&config.cache_dir);

        let workflows = match PlatformConfig::from_app_config(config).and_then(HttpPlatform::new) {
            Ok(platform) => Some(Workflows::from_config(config, Arc::new(platform))),
            Err(e) => {
                tracing::warn!(error = %e, "agent platform unavailable; only keyword lookup is served");
                None
            }
        };

        Ok(Self::new(cache, keywords, workflows, config.discovery_top_n))
    }

    /// Workflows, or `NotConfigured` when no platform endpoint is set.
    pub fn workflows(&self) -> Result<&Workflows, Error> {
        self.workflows
            .as_ref()
            .ok_or_else(|| Error::NotConfigured("agent platform endpoint is not set (SITEALIAS_ENDPOINT)".into()))
    }

    /// Save the cache and make the keyword table pick up the new phrases.
    pub async fn persist(&self) -> Result<(), Error> {
        self.cache.save().await?;
        self.keywords.invalidate().await;
        Ok(())
    }
}
