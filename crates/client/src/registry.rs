//! Get-or-create of named remote agents.

use std::collections::HashMap;
use std::sync::Arc;

use sitealias_core::Error;
use tokio::sync::Mutex;

use crate::platform::{Agent, AgentDefinition, AgentPlatform};

/// Ensures role agents exist on the platform, creating them on first use.
///
/// Agents found or created are remembered for the lifetime of the registry,
/// so only the first call per identifier reaches the platform.
pub struct AgentRegistry {
    platform: Arc<dyn AgentPlatform>,
    project: String,
    agents: Mutex<HashMap<String, Agent>>,
}

impl AgentRegistry {
    pub fn new(platform: Arc<dyn AgentPlatform>, project: impl Into<String>) -> Self {
        Self { platform, project: project.into(), agents: Mutex::new(HashMap::new()) }
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    /// Return the agent registered under `id`, creating it from `definition` if absent.
    ///
    /// # Errors
    ///
    /// Returns `Error::AgentLookup` if `id` is blank or the platform fails to
    /// look up or create the agent.
    pub async fn ensure_agent(&self, id: &str, definition: &AgentDefinition) -> Result<Agent, Error> {
        let id = id.trim();
        if id.is_empty() {
            return Err(Error::AgentLookup(format!("no agent identifier configured for role {}", definition.name)));
        }

        let mut agents = self.agents.lock().await;
        if let Some(agent) = agents.get(id) {
            return Ok(agent.clone());
        }

        let found = self
            .platform
            .find_agent(id)
            .await
            .map_err(|e| Error::AgentLookup(format!("looking up agent {id}: {e}")))?;

        let agent = match found {
            Some(agent) => {
                tracing::debug!(id, agent_id = %agent.id, "found existing agent");
                agent
            }
            None => {
                let mut definition = definition.clone();
                definition.metadata.insert("project".to_string(), self.project.clone());
                tracing::info!(id, project = %self.project, role = %definition.name, "creating agent");
                self.platform
                    .create_agent(id, &definition)
                    .await
                    .map_err(|e| Error::AgentLookup(format!("creating agent {id}: {e}")))?
            }
        };

        agents.insert(id.to_string(), agent.clone());
        Ok(agent)
    }

    /// Forget remembered agents; the next `ensure_agent` asks the platform again.
    pub async fn clear(&self) {
        self.agents.lock().await.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roles::{RoleSettings, definition};
    use crate::testing::ScriptedPlatform;
    use sitealias_core::AgentRole;

    fn resolver_definition() -> AgentDefinition {
        let settings = RoleSettings {
            model: "gpt-4o".into(),
            project: "demo".into(),
            search_connection_id: None,
            fetch_connection_id: None,
        };
        definition(AgentRole::Resolver, &settings)
    }

    #[tokio::test]
    async fn test_existing_agent_is_never_created() {
        let platform = Arc::new(ScriptedPlatform::new());
        platform.add_agent("url-resolver");

        let registry = AgentRegistry::new(platform.clone(), "demo");
        registry.ensure_agent("url-resolver", &resolver_definition()).await.unwrap();
        registry.ensure_agent("url-resolver", &resolver_definition()).await.unwrap();

        assert_eq!(platform.stats().agents_created, 0);
    }

    #[tokio::test]
    async fn test_missing_agent_created_once() {
        let platform = Arc::new(ScriptedPlatform::new());
        let registry = AgentRegistry::new(platform.clone(), "demo");

        let first = registry.ensure_agent("url-resolver", &resolver_definition()).await.unwrap();
        let second = registry.ensure_agent("url-resolver", &resolver_definition()).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(platform.stats().agents_created, 1);
        assert_eq!(platform.stats().agent_lookups, 1);
    }

    #[tokio::test]
    async fn test_fresh_registry_finds_created_agent() {
        let platform = Arc::new(ScriptedPlatform::new());
        AgentRegistry::new(platform.clone(), "demo")
            .ensure_agent("url-resolver", &resolver_definition())
            .await
            .unwrap();

        AgentRegistry::new(platform.clone(), "demo")
            .ensure_agent("url-resolver", &resolver_definition())
            .await
            .unwrap();

        assert_eq!(platform.stats().agents_created, 1);
    }

    #[tokio::test]
    async fn test_blank_identifier_is_lookup_error() {
        let platform = Arc::new(ScriptedPlatform::new());
        let registry = AgentRegistry::new(platform.clone(), "demo");

        let result = registry.ensure_agent("  ", &resolver_definition()).await;
        assert!(matches!(result, Err(Error::AgentLookup(_))));
        assert_eq!(platform.stats().agent_lookups, 0);
    }

    #[tokio::test]
    async fn test_platform_failure_is_lookup_error() {
        let platform = Arc::new(ScriptedPlatform::new());
        platform.fail_agent_lookups();
        let registry = AgentRegistry::new(platform, "demo");

        let result = registry.ensure_agent("url-resolver", &resolver_definition()).await;
        assert!(matches!(result, Err(Error::AgentLookup(msg)) if msg.contains("url-resolver")));
    }
}
