//! Scripted in-memory agent platform for tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use sitealias_core::AppConfig;

use crate::platform::{
    Agent, AgentDefinition, AgentPlatform, IncompleteDetails, LastError, MessageRole, PlatformError, Run, RunStatus,
    ThreadMessage,
};

/// What a scripted run does.
#[derive(Debug, Clone)]
pub enum Script {
    /// One in-progress poll, then completed; the assistant posts `reply` if any.
    Complete(Option<String>),
    /// Ends incomplete with `incomplete_details.reason = "content_filter"`.
    ContentFilter,
    /// Reports the content filter while in progress, then fails.
    FilterThenFail,
    /// Ends failed with a server error.
    Fail,
    /// Never leaves in-progress.
    Hang,
    /// `create_run` itself returns a 503.
    Unavailable,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    pub agent_lookups: usize,
    pub agents_created: usize,
    pub threads_created: usize,
    pub messages_posted: usize,
    pub runs_created: usize,
    pub runs_cancelled: usize,
    pub threads_deleted: usize,
    pub delete_attempts: usize,
}

#[derive(Debug)]
struct RunState {
    script: Script,
    polls: usize,
    thread_id: String,
}

#[derive(Debug, Default)]
struct State {
    agents: HashMap<String, Agent>,
    scripts: VecDeque<Script>,
    runs: HashMap<String, RunState>,
    threads: HashMap<String, Vec<ThreadMessage>>,
    prompts: Vec<String>,
    stats: Stats,
    fail_lookups: bool,
    fail_deletes: bool,
    fail_threads: bool,
    next_id: usize,
}

impl State {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}_{}", self.next_id)
    }
}

/// In-memory [`AgentPlatform`] driven by a queue of [`Script`]s.
///
/// Each `create_run` consumes the next script; the last one repeats.
#[derive(Debug, Default)]
pub struct ScriptedPlatform {
    state: Mutex<State>,
}

impl ScriptedPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_scripts(scripts: impl IntoIterator<Item = Script>) -> Self {
        let platform = Self::new();
        platform.state.lock().unwrap().scripts = scripts.into_iter().collect();
        platform
    }

    pub fn add_agent(&self, id: &str) {
        let agent = Agent { id: id.to_string(), name: Some(id.to_string()), model: "gpt-4o".to_string() };
        self.state.lock().unwrap().agents.insert(id.to_string(), agent);
    }

    pub fn fail_agent_lookups(&self) {
        self.state.lock().unwrap().fail_lookups = true;
    }

    pub fn fail_thread_deletes(&self) {
        self.state.lock().unwrap().fail_deletes = true;
    }

    pub fn fail_thread_creation(&self) {
        self.state.lock().unwrap().fail_threads = true;
    }

    pub fn stats(&self) -> Stats {
        self.state.lock().unwrap().stats
    }

    pub fn live_threads(&self) -> usize {
        self.state.lock().unwrap().threads.len()
    }

    /// Messages the caller posted, in order, across all threads.
    pub fn posted_prompts(&self) -> Vec<String> {
        self.state.lock().unwrap().prompts.clone()
    }

    fn run_view(id: &str, run: &RunState) -> Run {
        let in_progress = Run {
            id: id.to_string(),
            thread_id: run.thread_id.clone(),
            status: RunStatus::InProgress,
            incomplete_details: None,
            last_error: None,
        };
        match (&run.script, run.polls) {
            (Script::Hang, _) | (_, 0) => in_progress,
            (Script::Complete(_), _) => Run { status: RunStatus::Completed, ..in_progress },
            (Script::ContentFilter, _) => Run {
                status: RunStatus::Incomplete,
                incomplete_details: Some(IncompleteDetails { reason: Some("content_filter".into()) }),
                ..in_progress
            },
            (Script::FilterThenFail, 1) => Run {
                incomplete_details: Some(IncompleteDetails { reason: Some("content_filter".into()) }),
                ..in_progress
            },
            (Script::FilterThenFail, _) | (Script::Fail, _) => Run {
                status: RunStatus::Failed,
                last_error: Some(LastError { code: Some("server_error".into()), message: Some("tool 503".into()) }),
                ..in_progress
            },
            (Script::Unavailable, _) => in_progress,
        }
    }
}

#[async_trait]
impl AgentPlatform for ScriptedPlatform {
    async fn find_agent(&self, id: &str) -> Result<Option<Agent>, PlatformError> {
        let mut state = self.state.lock().unwrap();
        state.stats.agent_lookups += 1;
        if state.fail_lookups {
            return Err(PlatformError::HttpError { status: 500 });
        }
        Ok(state.agents.get(id).cloned())
    }

    async fn create_agent(&self, id: &str, definition: &AgentDefinition) -> Result<Agent, PlatformError> {
        let mut state = self.state.lock().unwrap();
        state.stats.agents_created += 1;
        let agent = Agent { id: id.to_string(), name: Some(id.to_string()), model: definition.model.clone() };
        state.agents.insert(id.to_string(), agent.clone());
        Ok(agent)
    }

    async fn create_thread(&self) -> Result<String, PlatformError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_threads {
            return Err(PlatformError::HttpError { status: 503 });
        }
        state.stats.threads_created += 1;
        let id = state.next_id("thread");
        state.threads.insert(id.clone(), Vec::new());
        Ok(id)
    }

    async fn post_message(&self, thread_id: &str, content: &str) -> Result<(), PlatformError> {
        let mut state = self.state.lock().unwrap();
        state.stats.messages_posted += 1;
        state.prompts.push(content.to_string());
        let id = state.next_id("msg");
        let messages = state
            .threads
            .get_mut(thread_id)
            .ok_or_else(|| PlatformError::NotFound(thread_id.to_string()))?;
        messages.push(ThreadMessage { id, role: MessageRole::User, run_id: None, text: vec![content.to_string()] });
        Ok(())
    }

    async fn create_run(&self, thread_id: &str, _agent_id: &str) -> Result<Run, PlatformError> {
        let mut state = self.state.lock().unwrap();
        let script = match state.scripts.len() {
            0 => Script::Complete(None),
            1 => state.scripts[0].clone(),
            _ => state.scripts.pop_front().unwrap_or(Script::Complete(None)),
        };
        if matches!(script, Script::Unavailable) {
            return Err(PlatformError::HttpError { status: 503 });
        }

        state.stats.runs_created += 1;
        let id = state.next_id("run");
        let run = RunState { script, polls: 0, thread_id: thread_id.to_string() };
        let view = Self::run_view(&id, &run);
        state.runs.insert(id, run);
        Ok(view)
    }

    async fn get_run(&self, _thread_id: &str, run_id: &str) -> Result<Run, PlatformError> {
        let mut state = self.state.lock().unwrap();
        let (view, reply) = {
            let run = state
                .runs
                .get_mut(run_id)
                .ok_or_else(|| PlatformError::NotFound(run_id.to_string()))?;
            run.polls += 1;
            let view = Self::run_view(run_id, run);
            let reply = match (&run.script, view.status) {
                (Script::Complete(Some(reply)), RunStatus::Completed) if run.polls == 1 => {
                    Some((run.thread_id.clone(), reply.clone()))
                }
                _ => None,
            };
            (view, reply)
        };

        if let Some((thread_id, reply)) = reply {
            let id = state.next_id("msg");
            if let Some(messages) = state.threads.get_mut(&thread_id) {
                messages.push(ThreadMessage {
                    id,
                    role: MessageRole::Assistant,
                    run_id: Some(run_id.to_string()),
                    text: vec![reply],
                });
            }
        }
        Ok(view)
    }

    async fn list_messages(&self, thread_id: &str) -> Result<Vec<ThreadMessage>, PlatformError> {
        let state = self.state.lock().unwrap();
        state
            .threads
            .get(thread_id)
            .cloned()
            .ok_or_else(|| PlatformError::NotFound(thread_id.to_string()))
    }

    async fn cancel_run(&self, _thread_id: &str, run_id: &str) -> Result<(), PlatformError> {
        let mut state = self.state.lock().unwrap();
        state.stats.runs_cancelled += 1;
        if let Some(run) = state.runs.get_mut(run_id) {
            run.script = Script::Fail;
        }
        Ok(())
    }

    async fn delete_thread(&self, thread_id: &str) -> Result<(), PlatformError> {
        let mut state = self.state.lock().unwrap();
        state.stats.delete_attempts += 1;
        if state.fail_deletes {
            return Err(PlatformError::HttpError { status: 500 });
        }
        state.threads.remove(thread_id);
        state.stats.threads_deleted += 1;
        Ok(())
    }
}

/// Configuration with every role configured and a fast run policy.
pub fn test_config() -> AppConfig {
    AppConfig {
        endpoint: Some("https://agents.example.net/api/projects/demo".into()),
        project: "demo".into(),
        resolver_agent_id: Some("url-resolver".into()),
        validator_agent_id: Some("url-validator".into()),
        keyword_agent_id: Some("keyword-extractor".into()),
        phrase_agent_id: Some("phrase-generator".into()),
        poll_interval_ms: 5,
        run_timeout_ms: 60,
        max_validation_attempts: 5,
        ..AppConfig::default()
    }
}
