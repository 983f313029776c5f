//! Agent platform boundary.
//!
//! The workflows only see the [`AgentPlatform`] trait: named agents,
//! conversation threads, messages and runs. [`HttpPlatform`] implements it
//! over an assistants-style REST API.
//!
//! ### Operations consumed
//!
//! - find / create a named agent (model, instructions, temperature, tools)
//! - create a thread, post a user message
//! - create a run and poll its status (`incomplete_details.reason` included)
//! - list thread messages in ascending order
//! - cancel a run, delete a thread

pub mod error;
pub mod http;
pub mod wire;

pub use error::PlatformError;
pub use http::{HttpPlatform, PlatformConfig};

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Reason reported in `incomplete_details` when moderation blocked a run.
pub const CONTENT_FILTER_REASON: &str = "content_filter";

/// A remote agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Agent {
    pub id: String,
    pub name: Option<String>,
    pub model: String,
}

/// Tool made available to an agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolBinding {
    /// Web search / grounding tool.
    WebSearch { connection_id: Option<String> },
    /// HTTP page fetch reachable through a configured connector.
    HttpFetch { connection_id: Option<String> },
}

/// Role definition used when an agent has to be created.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentDefinition {
    pub name: String,
    pub model: String,
    pub temperature: f32,
    pub instructions: String,
    pub tools: Vec<ToolBinding>,
    pub metadata: BTreeMap<String, String>,
}

/// Lifecycle state of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Queued,
    InProgress,
    RequiresAction,
    Cancelling,
    Cancelled,
    Failed,
    Completed,
    Incomplete,
    Expired,
    #[serde(other)]
    Unknown,
}

impl RunStatus {
    /// Whether the run will not change state any more.
    ///
    /// `Cancelling` counts as terminal: nothing useful comes after it.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunStatus::Cancelling
                | RunStatus::Cancelled
                | RunStatus::Failed
                | RunStatus::Completed
                | RunStatus::Incomplete
                | RunStatus::Expired
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IncompleteDetails {
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LastError {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// One execution of an agent against a thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Run {
    pub id: String,
    pub thread_id: String,
    pub status: RunStatus,
    #[serde(default)]
    pub incomplete_details: Option<IncompleteDetails>,
    #[serde(default)]
    pub last_error: Option<LastError>,
}

impl Run {
    pub fn incomplete_reason(&self) -> Option<&str> {
        self.incomplete_details.as_ref().and_then(|d| d.reason.as_deref())
    }

    pub fn is_content_filtered(&self) -> bool {
        self.incomplete_reason() == Some(CONTENT_FILTER_REASON)
            || self.last_error.as_ref().and_then(|e| e.code.as_deref()) == Some(CONTENT_FILTER_REASON)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
    /// `system`, `tool` and anything newer; never read as a reply.
    #[serde(other)]
    Other,
}

/// A thread message reduced to its text parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadMessage {
    pub id: String,
    pub role: MessageRole,
    pub run_id: Option<String>,
    pub text: Vec<String>,
}

impl ThreadMessage {
    /// All text parts joined, or `None` if there is no non-blank text.
    pub fn joined_text(&self) -> Option<String> {
        let joined = self.text.join("\n");
        if joined.trim().is_empty() { None } else { Some(joined) }
    }
}

/// Remote agent hosting platform.
#[async_trait]
pub trait AgentPlatform: Send + Sync {
    /// Look up an agent by its stable identifier.
    async fn find_agent(&self, id: &str) -> Result<Option<Agent>, PlatformError>;

    /// Create an agent addressable by `id`.
    async fn create_agent(&self, id: &str, definition: &AgentDefinition) -> Result<Agent, PlatformError>;

    /// Create a conversation thread. Returns its id.
    async fn create_thread(&self) -> Result<String, PlatformError>;

    /// Post a user message to a thread.
    async fn post_message(&self, thread_id: &str, content: &str) -> Result<(), PlatformError>;

    /// Start a run of `agent_id` against the thread.
    async fn create_run(&self, thread_id: &str, agent_id: &str) -> Result<Run, PlatformError>;

    /// Current state of a run.
    async fn get_run(&self, thread_id: &str, run_id: &str) -> Result<Run, PlatformError>;

    /// Thread messages, oldest first.
    async fn list_messages(&self, thread_id: &str) -> Result<Vec<ThreadMessage>, PlatformError>;

    /// Request cancellation of a run. Not guaranteed to take effect immediately.
    async fn cancel_run(&self, thread_id: &str, run_id: &str) -> Result<(), PlatformError>;

    async fn delete_thread(&self, thread_id: &str) -> Result<(), PlatformError>;
}
