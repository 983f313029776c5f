//! Role definitions for the four remote agents.
//!
//! Each role fixes its instructions, tool binding and the JSON shape it must
//! answer with. Definitions are only used when the agent does not exist yet.

use std::collections::BTreeMap;

use sitealias_core::{AgentRole, AppConfig};

use crate::platform::{AgentDefinition, ToolBinding};

const RESOLVER_INSTRUCTIONS: &str = "\
You turn a short spoken request such as \"open apple\" into the canonical URL of the site the user means.
Use the web search tool. Only return URLs that you have seen in search results and can verify exist; never invent or guess a URL.
Reply with a single JSON object and nothing else:
{\"originalRequest\": string, \"url\": string | null, \"urlsEvaluated\": [string], \"explanation\": string, \"searchQueryRun\": string}
Every URL must include its scheme (https://).";

const VALIDATOR_INSTRUCTIONS: &str = "\
You receive a JSON object {\"originalRequest\": string, \"url\": string}.
Fetch the URL with the http_fetch tool and decide, from the fetched page content, whether the page matches the intent of the original request.
Reply with a single JSON object and nothing else:
{\"originalRequest\": string, \"url\": string, \"validity\": \"valid\" | \"invalid\" | \"indeterminate\", \"explanation\": string}
Use \"indeterminate\" when the page cannot be fetched or its content does not allow a decision.";

const KEYWORD_INSTRUCTIONS: &str = "\
You receive a site domain. Using web search, find the keywords people use to refer to this site: brand names, product names and the terms that rank the site highest.
Reply with a single JSON object and nothing else:
{\"site\": string, \"brandedKeywords\": [string], \"topRankingKeywords\": [string], \"extractedKeywordsByClick\": [string]}";

const PHRASE_INSTRUCTIONS: &str = "\
You receive a site domain and a number N. Run a site-restricted web search for the domain and take the top N results.
For each result, write 5 to 10 short natural phrases a user might say to open that page, for example \"open apple\" or \"open iphone maker\".
Reply with a single JSON object and nothing else:
{\"urls\": [{\"pageTitle\": string, \"pageUrl\": string, \"openPhrases\": [string]}], \"searchQueryRun\": string}
Every pageUrl must include its scheme (https://).";

/// Settings shared by all role definitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleSettings {
    pub model: String,
    pub project: String,
    pub search_connection_id: Option<String>,
    pub fetch_connection_id: Option<String>,
}

impl RoleSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            model: config.model.clone(),
            project: config.project.clone(),
            search_connection_id: config.search_connection_id.clone(),
            fetch_connection_id: config.fetch_connection_id.clone(),
        }
    }
}

/// Definition used to create the agent for `role`.
pub fn definition(role: AgentRole, settings: &RoleSettings) -> AgentDefinition {
    let search = ToolBinding::WebSearch { connection_id: settings.search_connection_id.clone() };
    let (instructions, temperature, tools) = match role {
        AgentRole::Resolver => (RESOLVER_INSTRUCTIONS, 0.1, vec![search]),
        AgentRole::Validator => (
            VALIDATOR_INSTRUCTIONS,
            0.0,
            vec![ToolBinding::HttpFetch { connection_id: settings.fetch_connection_id.clone() }],
        ),
        AgentRole::KeywordExtractor => (KEYWORD_INSTRUCTIONS, 0.3, vec![search]),
        AgentRole::PhraseGenerator => (PHRASE_INSTRUCTIONS, 0.7, vec![search]),
    };

    AgentDefinition {
        name: role.as_str().to_string(),
        model: settings.model.clone(),
        temperature,
        instructions: instructions.to_string(),
        tools,
        metadata: BTreeMap::from([
            ("project".to_string(), settings.project.clone()),
            ("role".to_string(), role.as_str().to_string()),
        ]),
    }
}
