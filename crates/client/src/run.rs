//! Conversation driver shared by every workflow.
//!
//! A workflow call opens a thread, posts its request, runs the agent and
//! polls at a fixed interval until the run is terminal or the wall-clock
//! budget is spent. On timeout the run is cancelled (best effort). The
//! assistant reply is read back, code fences are stripped, and the JSON is
//! parsed. The thread is deleted afterwards whatever the outcome.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, LazyLock};
use std::time::{Duration, Instant};

use regex::Regex;
use serde::de::DeserializeOwned;
use sitealias_core::{AppConfig, Error};

use crate::platform::{AgentPlatform, MessageRole, PlatformError, Run, RunStatus};

/// Attempts made to delete a thread before giving up.
const CLEANUP_ATTEMPTS: u32 = 2;

static CODE_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)^\s*```[A-Za-z0-9_+-]*[ \t]*\r?\n?(.*?)\s*```\s*$").unwrap());

/// Polling cadence and wall-clock budget for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunPolicy {
    pub poll_interval: Duration,
    pub timeout: Duration,
}

impl Default for RunPolicy {
    fn default() -> Self {
        Self { poll_interval: Duration::from_millis(500), timeout: Duration::from_secs(30) }
    }
}

impl RunPolicy {
    pub fn from_config(config: &AppConfig) -> Self {
        Self { poll_interval: config.poll_interval(), timeout: config.run_timeout() }
    }
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    /// Last observed state of the run.
    pub run: Run,
    /// The content filter was reported at some point while polling.
    pub content_filtered: bool,
}

impl RunOutcome {
    pub fn is_completed(&self) -> bool {
        self.run.status == RunStatus::Completed
    }
}

/// Why a run produced no outcome.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RunFailure {
    #[error(transparent)]
    Platform(#[from] PlatformError),

    #[error("run {run_id} still {status:?} after {elapsed:?}")]
    TimedOut { run_id: String, status: RunStatus, elapsed: Duration },
}

impl From<RunFailure> for Error {
    fn from(err: RunFailure) -> Self {
        match err {
            RunFailure::Platform(e) => e.into(),
            timeout @ RunFailure::TimedOut { .. } => Error::RunTimeout(timeout.to_string()),
        }
    }
}

/// Parsed answer of an agent, keeping content-filter rejections apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply<T> {
    Answered(T),
    Rejected,
    Unresolved,
}

/// Shared run machinery.
pub struct RunDriver {
    platform: Arc<dyn AgentPlatform>,
    policy: RunPolicy,
    cleanup_failures: AtomicU64,
}

impl RunDriver {
    pub fn new(platform: Arc<dyn AgentPlatform>, policy: RunPolicy) -> Self {
        Self { platform, policy, cleanup_failures: AtomicU64::new(0) }
    }

    pub fn platform(&self) -> &Arc<dyn AgentPlatform> {
        &self.platform
    }

    pub fn policy(&self) -> RunPolicy {
        self.policy
    }

    /// Number of threads this driver failed to delete.
    pub fn cleanup_failures(&self) -> u64 {
        self.cleanup_failures.load(Ordering::Relaxed)
    }

    /// Send `prompt` to the agent in a fresh thread and parse its JSON reply.
    ///
    /// Every failure folds into `Reply::Unresolved`, except a run blocked by
    /// the content filter, which is `Reply::Rejected`.
    pub async fn ask<T: DeserializeOwned>(&self, agent_id: &str, prompt: &str) -> Reply<T> {
        let thread_id = match self.platform.create_thread().await {
            Ok(id) => id,
            Err(e) => {
                tracing::warn!(agent_id, error = %e, "failed to create thread");
                return Reply::Unresolved;
            }
        };

        let reply = self.ask_in_thread(&thread_id, agent_id, prompt).await;
        self.close_thread(&thread_id).await;
        reply
    }

    async fn ask_in_thread<T: DeserializeOwned>(&self, thread_id: &str, agent_id: &str, prompt: &str) -> Reply<T> {
        if let Err(e) = self.platform.post_message(thread_id, prompt).await {
            tracing::warn!(thread_id, error = %e, "failed to post message");
            return Reply::Unresolved;
        }

        let outcome = match self.run_once(thread_id, agent_id).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!(thread_id, agent_id, error = %e, "run did not finish");
                return Reply::Unresolved;
            }
        };

        if !outcome.is_completed() {
            tracing::info!(
                thread_id,
                status = ?outcome.run.status,
                reason = outcome.run.incomplete_reason(),
                content_filtered = outcome.content_filtered,
                "run ended without completing"
            );
            return if outcome.content_filtered { Reply::Rejected } else { Reply::Unresolved };
        }

        match self.parse_run_reply(thread_id, &outcome.run).await {
            Ok(value) => Reply::Answered(value),
            Err(e) => {
                tracing::warn!(thread_id, error = %e, "unusable assistant reply");
                if outcome.content_filtered { Reply::Rejected } else { Reply::Unresolved }
            }
        }
    }

    /// Start a run and poll it until it is terminal or the budget is spent.
    ///
    /// On timeout a cancellation is requested and `RunFailure::TimedOut` is
    /// returned; a failed cancel request is only logged.
    pub async fn run_once(&self, thread_id: &str, agent_id: &str) -> Result<RunOutcome, RunFailure> {
        let started = Instant::now();
        let mut run = self.platform.create_run(thread_id, agent_id).await?;
        let mut content_filtered = run.is_content_filtered();

        loop {
            if run.status.is_terminal() {
                tracing::debug!(run_id = %run.id, status = ?run.status, elapsed = ?started.elapsed(), "run finished");
                return Ok(RunOutcome { run, content_filtered });
            }

            let elapsed = started.elapsed();
            if elapsed >= self.policy.timeout {
                if let Err(e) = self.platform.cancel_run(thread_id, &run.id).await {
                    tracing::warn!(run_id = %run.id, error = %e, "failed to cancel timed out run");
                }
                return Err(RunFailure::TimedOut { run_id: run.id, status: run.status, elapsed });
            }

            tokio::time::sleep(self.policy.poll_interval.min(self.policy.timeout - elapsed)).await;

            run = self.platform.get_run(thread_id, &run.id).await?;
            content_filtered |= run.is_content_filtered();
            tracing::debug!(run_id = %run.id, status = ?run.status, "polled run");
        }
    }

    /// Parse the reply `run` left in the thread.
    pub async fn parse_run_reply<T: DeserializeOwned>(&self, thread_id: &str, run: &Run) -> Result<T, Error> {
        let text = self
            .reply_text(thread_id, run)
            .await?
            .ok_or_else(|| Error::Parse(format!("run {} left no assistant text", run.id)))?;
        parse_reply(&text)
    }

    /// First assistant text, in chronological order, written by `run`.
    ///
    /// Messages without a run id are accepted as well.
    pub async fn reply_text(&self, thread_id: &str, run: &Run) -> Result<Option<String>, PlatformError> {
        let messages = self.platform.list_messages(thread_id).await?;
        Ok(messages
            .iter()
            .filter(|m| m.role == MessageRole::Assistant)
            .filter(|m| m.run_id.as_deref().is_none_or(|id| id == run.id))
            .find_map(|m| m.joined_text()))
    }

    /// Delete a thread, retrying once. Failures are logged and counted.
    pub async fn close_thread(&self, thread_id: &str) {
        for attempt in 1..=CLEANUP_ATTEMPTS {
            match self.platform.delete_thread(thread_id).await {
                Ok(()) => {
                    tracing::debug!(thread_id, "deleted thread");
                    return;
                }
                Err(e) => tracing::warn!(thread_id, attempt, error = %e, "failed to delete thread"),
            }
        }
        self.cleanup_failures.fetch_add(1, Ordering::Relaxed);
    }
}

/// Remove a surrounding Markdown code fence, if any.
pub fn strip_code_fences(text: &str) -> &str {
    match CODE_FENCE.captures(text).and_then(|c| c.get(1)) {
        Some(inner) => inner.as_str().trim(),
        None => text.trim(),
    }
}

/// Parse an assistant reply as JSON after stripping code fences.
pub fn parse_reply<T: DeserializeOwned>(text: &str) -> Result<T, Error> {
    let body = strip_code_fences(text);
    if body.is_empty() {
        return Err(Error::Parse("empty assistant reply".into()));
    }
    serde_json::from_str(body).map_err(|e| Error::Parse(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Script, ScriptedPlatform};
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Answer {
        url: String,
    }

    fn fast() -> RunPolicy {
        RunPolicy { poll_interval: Duration::from_millis(5), timeout: Duration::from_millis(60) }
    }

    fn driver(platform: &Arc<ScriptedPlatform>) -> RunDriver {
        RunDriver::new(platform.clone(), fast())
    }

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("```json\n{\"a\": 1}\n```"), "{\"a\": 1}");
        assert_eq!(strip_code_fences("```\n{\"a\": 1}```"), "{\"a\": 1}");
        assert_eq!(strip_code_fences("  {\"a\": 1}  "), "{\"a\": 1}");
        assert_eq!(strip_code_fences("```json {\"a\": 1} ```"), "{\"a\": 1}");
    }

    #[test]
    fn test_parse_reply_errors() {
        assert!(matches!(parse_reply::<Answer>(""), Err(Error::Parse(_))));
        assert!(matches!(parse_reply::<Answer>("```json\n```"), Err(Error::Parse(_))));
        assert!(matches!(parse_reply::<Answer>("I could not find it."), Err(Error::Parse(_))));
        assert_eq!(
            parse_reply::<Answer>("```json\n{\"url\": \"https://apple.com\"}\n```").unwrap(),
            Answer { url: "https://apple.com".into() }
        );
    }

    #[tokio::test]
    async fn test_ask_completed() {
        let platform = Arc::new(ScriptedPlatform::with_scripts([Script::Complete(Some(
            r#"{"url": "https://apple.com"}"#.into(),
        ))]));
        let reply: Reply<Answer> = driver(&platform).ask("agent", "open apple").await;

        assert_eq!(reply, Reply::Answered(Answer { url: "https://apple.com".into() }));
        assert_eq!(platform.live_threads(), 0);
        assert_eq!(platform.posted_prompts(), vec!["open apple".to_string()]);
    }

    #[tokio::test]
    async fn test_ask_content_filtered() {
        let platform = Arc::new(ScriptedPlatform::with_scripts([Script::ContentFilter]));
        let reply: Reply<Answer> = driver(&platform).ask("agent", "something blocked").await;
        assert_eq!(reply, Reply::Rejected);
        assert_eq!(platform.live_threads(), 0);
    }

    #[tokio::test]
    async fn test_filter_seen_while_polling_is_remembered() {
        let platform = Arc::new(ScriptedPlatform::with_scripts([Script::FilterThenFail]));
        let reply: Reply<Answer> = driver(&platform).ask("agent", "something blocked").await;
        assert_eq!(reply, Reply::Rejected);
    }

    #[tokio::test]
    async fn test_ask_failed_run_is_unresolved() {
        let platform = Arc::new(ScriptedPlatform::with_scripts([Script::Fail]));
        let reply: Reply<Answer> = driver(&platform).ask("agent", "open apple").await;
        assert_eq!(reply, Reply::Unresolved);
    }

    #[tokio::test]
    async fn test_ask_without_assistant_text_is_unresolved() {
        let platform = Arc::new(ScriptedPlatform::with_scripts([Script::Complete(None)]));
        let reply: Reply<Answer> = driver(&platform).ask("agent", "open apple").await;
        assert_eq!(reply, Reply::Unresolved);
    }

    #[tokio::test]
    async fn test_ask_thread_creation_failure_is_unresolved() {
        let platform = Arc::new(ScriptedPlatform::new());
        platform.fail_thread_creation();
        let reply: Reply<Answer> = driver(&platform).ask("agent", "open apple").await;
        assert_eq!(reply, Reply::Unresolved);
        assert_eq!(platform.stats().runs_created, 0);
    }

    #[tokio::test]
    async fn test_run_once_times_out_and_cancels() {
        let platform = Arc::new(ScriptedPlatform::with_scripts([Script::Hang]));
        let driver = driver(&platform);
        let thread_id = platform.create_thread().await.unwrap();

        let started = Instant::now();
        let result = driver.run_once(&thread_id, "agent").await;

        assert!(matches!(result, Err(RunFailure::TimedOut { .. })));
        assert!(started.elapsed() >= fast().timeout);
        assert!(started.elapsed() < fast().timeout + Duration::from_millis(500));
        assert_eq!(platform.stats().runs_cancelled, 1);
    }

    #[test]
    fn test_run_failure_into_error() {
        let timeout = RunFailure::TimedOut {
            run_id: "run_1".into(),
            status: RunStatus::InProgress,
            elapsed: Duration::from_secs(30),
        };
        assert!(matches!(Error::from(timeout), Error::RunTimeout(msg) if msg.contains("run_1")));
        assert!(matches!(Error::from(RunFailure::Platform(PlatformError::RateLimited)), Error::Platform(_)));
    }

    #[tokio::test]
    async fn test_hanging_ask_is_unresolved_and_cleaned_up() {
        let platform = Arc::new(ScriptedPlatform::with_scripts([Script::Hang]));
        let reply: Reply<Answer> = driver(&platform).ask("agent", "open apple").await;
        assert_eq!(reply, Reply::Unresolved);
        assert_eq!(platform.live_threads(), 0);
    }

    #[tokio::test]
    async fn test_cleanup_failures_are_counted() {
        let platform = Arc::new(ScriptedPlatform::with_scripts([Script::Complete(Some(
            r#"{"url": "https://apple.com"}"#.into(),
        ))]));
        platform.fail_thread_deletes();
        let driver = driver(&platform);

        let reply: Reply<Answer> = driver.ask("agent", "open apple").await;

        assert!(matches!(reply, Reply::Answered(_)));
        assert_eq!(driver.cleanup_failures(), 1);
        assert_eq!(platform.stats().delete_attempts, CLEANUP_ATTEMPTS as usize);
    }
}
