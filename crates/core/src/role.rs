//! Remote agent roles.

use serde::{Deserialize, Serialize};

/// The four role-specific agents the workflows talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    /// Turns a phrase into URLs using a web-search tool.
    Resolver,
    /// Confirms a URL matches a request using an HTTP-fetch tool.
    Validator,
    /// Extracts branded keywords implicit in a domain.
    KeywordExtractor,
    /// Generates "open ..." phrases for a domain's top pages.
    PhraseGenerator,
}

impl AgentRole {
    pub const ALL: [AgentRole; 4] =
        [AgentRole::Resolver, AgentRole::Validator, AgentRole::KeywordExtractor, AgentRole::PhraseGenerator];

    pub fn as_str(&self) -> &'static str {
        match self {
            AgentRole::Resolver => "resolver",
            AgentRole::Validator => "validator",
            AgentRole::KeywordExtractor => "keyword_extractor",
            AgentRole::PhraseGenerator => "phrase_generator",
        }
    }
}

impl std::fmt::Display for AgentRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
