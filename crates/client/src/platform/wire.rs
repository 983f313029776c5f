//! Request and response bodies of the assistants-style REST API.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::{Agent, AgentDefinition, MessageRole, ThreadMessage, ToolBinding};

/// Paged list envelope.
#[derive(Debug, Deserialize)]
pub struct ListResponse<T> {
    pub data: Vec<T>,
    #[serde(default)]
    pub has_more: bool,
}

/// Raw agent object.
#[derive(Debug, Deserialize)]
pub struct AgentObject {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub model: String,
}

impl From<AgentObject> for Agent {
    fn from(raw: AgentObject) -> Self {
        Agent { id: raw.id, name: raw.name, model: raw.model }
    }
}

/// Body of `POST /assistants`.
#[derive(Debug, Serialize)]
pub struct CreateAgentRequest<'a> {
    pub name: &'a str,
    pub model: &'a str,
    pub instructions: &'a str,
    pub temperature: f32,
    pub tools: Vec<Value>,
    pub metadata: &'a BTreeMap<String, String>,
}

impl<'a> CreateAgentRequest<'a> {
    pub fn new(id: &'a str, definition: &'a AgentDefinition) -> Self {
        Self {
            name: id,
            model: &definition.model,
            instructions: &definition.instructions,
            temperature: definition.temperature,
            tools: definition.tools.iter().map(tool_json).collect(),
            metadata: &definition.metadata,
        }
    }
}

/// Wire form of a tool binding.
pub fn tool_json(tool: &ToolBinding) -> Value {
    match tool {
        ToolBinding::WebSearch { connection_id } => json!({
            "type": "bing_grounding",
            "bing_grounding": {
                "search_configurations": connection_id
                    .iter()
                    .map(|id| json!({ "connection_id": id }))
                    .collect::<Vec<_>>(),
            },
        }),
        ToolBinding::HttpFetch { connection_id } => json!({
            "type": "openapi",
            "openapi": {
                "name": "http_fetch",
                "description": "Fetch a web page and return its text content.",
                "spec": {
                    "openapi": "3.0.1",
                    "info": { "title": "http_fetch", "version": "1.0" },
                    "paths": {
                        "/fetch": {
                            "get": {
                                "operationId": "fetchPage",
                                "parameters": [{
                                    "name": "url",
                                    "in": "query",
                                    "required": true,
                                    "schema": { "type": "string" },
                                }],
                                "responses": { "200": { "description": "Page text" } },
                            },
                        },
                    },
                },
                "auth": match connection_id {
                    Some(id) => json!({ "type": "connection", "security_scheme": { "connection_id": id } }),
                    None => json!({ "type": "anonymous" }),
                },
            },
        }),
    }
}

/// Object carrying only an id (`POST /threads` and friends).
#[derive(Debug, Deserialize)]
pub struct IdObject {
    pub id: String,
}

#[derive(Debug, Serialize)]
pub struct CreateMessageRequest<'a> {
    pub role: &'static str,
    pub content: &'a str,
}

#[derive(Debug, Serialize)]
pub struct CreateRunRequest<'a> {
    pub assistant_id: &'a str,
}

/// Raw thread message.
#[derive(Debug, Deserialize)]
pub struct MessageObject {
    pub id: String,
    pub role: MessageRole,
    #[serde(default)]
    pub run_id: Option<String>,
    #[serde(default)]
    pub content: Vec<ContentPart>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: TextValue },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
pub struct TextValue {
    pub value: String,
}

impl From<MessageObject> for ThreadMessage {
    fn from(raw: MessageObject) -> Self {
        let text = raw
            .content
            .into_iter()
            .filter_map(|part| match part {
                ContentPart::Text { text } => Some(text.value),
                ContentPart::Other => None,
            })
            .collect();
        ThreadMessage { id: raw.id, role: raw.role, run_id: raw.run_id, text }
    }
}
