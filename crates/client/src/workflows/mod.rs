//! Agent-backed workflows.
//!
//! Every workflow follows the same shape: ensure the role agent exists, open
//! a thread, post the request, run and poll through [`RunDriver`], parse the
//! JSON reply and delete the thread. Transport and parse failures fold into
//! the tri-state outcomes; only a missing or unreachable agent is an error.

pub mod discover;
pub mod resolve;
pub mod validate;

pub use discover::{Discoverer, KeywordReport, PhrasePage, PhraseReport};
pub use resolve::{Resolver, ResolverReply};
pub use validate::{Validator, ValidatorReply};

use std::sync::Arc;

use serde::{Deserialize, Deserializer};
use sitealias_core::{AgentRole, AppConfig, Error};

use crate::platform::{Agent, AgentDefinition, AgentPlatform};
use crate::registry::AgentRegistry;
use crate::roles::{RoleSettings, definition};
use crate::run::{RunDriver, RunPolicy};

/// Read an explicit `null` the same as a missing field.
///
/// Agents emit `"explanation": null` and `"urlsEvaluated": null` freely.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A role, the identifier its agent is registered under and the definition
/// used if the agent has to be created.
#[derive(Debug, Clone)]
pub struct RoleAgent {
    role: AgentRole,
    id: Option<String>,
    definition: AgentDefinition,
}

impl RoleAgent {
    pub fn new(role: AgentRole, id: Option<String>, settings: &RoleSettings) -> Self {
        Self { role, id, definition: definition(role, settings) }
    }

    pub fn from_config(role: AgentRole, config: &AppConfig) -> Self {
        Self::new(role, config.agent_id(role).map(str::to_string), &RoleSettings::from_config(config))
    }

    pub fn role(&self) -> AgentRole {
        self.role
    }

    /// Resolve the platform agent for this role.
    ///
    /// # Errors
    ///
    /// Returns `Error::AgentLookup` if no identifier is configured or the
    /// platform cannot find or create the agent.
    pub async fn ensure(&self, registry: &AgentRegistry) -> Result<Agent, Error> {
        let id = self
            .id
            .as_deref()
            .ok_or_else(|| Error::AgentLookup(format!("no agent identifier configured for role {}", self.role)))?;
        registry.ensure_agent(id, &self.definition).await
    }
}

/// The four workflows sharing one registry and one run driver.
pub struct Workflows {
    pub resolver: Resolver,
    pub validator: Validator,
    pub discoverer: Discoverer,
    driver: Arc<RunDriver>,
}

impl Workflows {
    pub fn from_config(config: &AppConfig, platform: Arc<dyn AgentPlatform>) -> Self {
        let registry = Arc::new(AgentRegistry::new(platform.clone(), config.project.clone()));
        let driver = Arc::new(RunDriver::new(platform, RunPolicy::from_config(config)));

        Self {
            resolver: Resolver::new(
                registry.clone(),
                driver.clone(),
                RoleAgent::from_config(AgentRole::Resolver, config),
            ),
            validator: Validator::new(
                registry.clone(),
                driver.clone(),
                RoleAgent::from_config(AgentRole::Validator, config),
                config.max_validation_attempts,
            ),
            discoverer: Discoverer::new(
                registry,
                driver.clone(),
                RoleAgent::from_config(AgentRole::KeywordExtractor, config),
                RoleAgent::from_config(AgentRole::PhraseGenerator, config),
            ),
            driver,
        }
    }

    /// Run driver shared by the workflows; exposes the cleanup failure count.
    pub fn driver(&self) -> &RunDriver {
        &self.driver
    }
}
