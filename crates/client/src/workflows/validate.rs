//! Confirms a resolved URL matches the original request.
//!
//! One thread carries the request. Up to `max_attempts` runs are made
//! against it, each bounded by the run timeout and cancelled when it
//! overruns. Only the reply written by the run that completed is read, so a
//! late answer from an earlier cancelled run is never picked up.

use std::sync::Arc;

use serde::Deserialize;
use sitealias_core::normalize::ensure_scheme;
use sitealias_core::{Error, ValidationResult, ValidityField, ValidityVerdict};

use super::RoleAgent;
use crate::registry::AgentRegistry;
use crate::run::{RunDriver, RunFailure};

/// JSON object the validator agent answers with.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatorReply {
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub original_request: String,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub url: String,
    pub validity: ValidityField,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub explanation: String,
}

impl ValidatorReply {
    fn into_verdict(self, utterance: &str, url: &str) -> ValidityVerdict {
        ValidityVerdict {
            original_request: if self.original_request.trim().is_empty() {
                utterance.to_string()
            } else {
                self.original_request
            },
            url: if self.url.trim().is_empty() { url.to_string() } else { ensure_scheme(&self.url) },
            validity: self.validity.0,
            explanation: self.explanation,
        }
    }
}

pub struct Validator {
    registry: Arc<AgentRegistry>,
    driver: Arc<RunDriver>,
    agent: RoleAgent,
    max_attempts: u32,
}

impl Validator {
    pub fn new(registry: Arc<AgentRegistry>, driver: Arc<RunDriver>, agent: RoleAgent, max_attempts: u32) -> Self {
        Self { registry, driver, agent, max_attempts: max_attempts.max(1) }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Check that `url` satisfies `utterance`.
    ///
    /// # Errors
    ///
    /// `Error::InvalidInput` for a blank utterance or URL and
    /// `Error::AgentLookup` when the validator agent is unavailable. Exhausted
    /// attempts and content-filtered runs give `ValidationResult::Unresolved`.
    pub async fn validate_url(&self, utterance: &str, url: &str) -> Result<ValidationResult, Error> {
        let utterance = utterance.trim();
        if utterance.is_empty() || url.trim().is_empty() {
            return Err(Error::InvalidInput("utterance and url are required".into()));
        }
        let url = ensure_scheme(url);

        let agent = self.agent.ensure(&self.registry).await?;
        let platform = self.driver.platform();

        let thread_id = match platform.create_thread().await {
            Ok(id) => id,
            Err(e) => {
                tracing::warn!(%url, error = %e, "failed to create validation thread");
                return Ok(ValidationResult::Unresolved);
            }
        };

        let request = serde_json::json!({ "originalRequest": utterance, "url": url }).to_string();
        let result = match platform.post_message(&thread_id, &request).await {
            Ok(()) => self.attempt_runs(&thread_id, &agent.id, utterance, &url).await,
            Err(e) => {
                tracing::warn!(thread_id, error = %e, "failed to post validation request");
                ValidationResult::Unresolved
            }
        };

        self.driver.close_thread(&thread_id).await;

        match &result {
            ValidationResult::Verdict(v) => tracing::info!(%url, validity = ?v.validity, "validated url"),
            ValidationResult::Unresolved => tracing::info!(%url, "validation unresolved"),
        }
        Ok(result)
    }

    async fn attempt_runs(&self, thread_id: &str, agent_id: &str, utterance: &str, url: &str) -> ValidationResult {
        let pause = self.driver.policy().poll_interval;
        for attempt in 1..=self.max_attempts {
            if attempt > 1 {
                // Give a cancelled run time to settle before the thread takes another.
                tokio::time::sleep(pause).await;
            }
            let outcome = match self.driver.run_once(thread_id, agent_id).await {
                Ok(outcome) => outcome,
                Err(RunFailure::TimedOut { run_id, elapsed, .. }) => {
                    tracing::warn!(attempt, %run_id, ?elapsed, "validation run timed out");
                    continue;
                }
                Err(RunFailure::Platform(e)) => {
                    tracing::warn!(attempt, error = %e, transient = e.is_transient(), "validation run failed");
                    continue;
                }
            };

            if outcome.content_filtered {
                tracing::info!(attempt, run_id = %outcome.run.id, "validation blocked by content filter");
                return ValidationResult::Unresolved;
            }

            if !outcome.is_completed() {
                tracing::warn!(
                    attempt,
                    run_id = %outcome.run.id,
                    status = ?outcome.run.status,
                    error = ?outcome.run.last_error,
                    "validation run did not complete"
                );
                continue;
            }

            match self.driver.parse_run_reply::<ValidatorReply>(thread_id, &outcome.run).await {
                Ok(reply) => return ValidationResult::Verdict(reply.into_verdict(utterance, url)),
                Err(e) => tracing::warn!(attempt, run_id = %outcome.run.id, error = %e, "unusable validation reply"),
            }
        }

        tracing::warn!(attempts = self.max_attempts, url, "validation attempts exhausted");
        ValidationResult::Unresolved
    }
}
