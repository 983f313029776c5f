//! Outcomes returned by the agent-backed workflows.
//!
//! Resolution keeps three distinct terminal answers. `Rejected` means the
//! platform's moderation layer refused the request and is not the same as
//! `Unresolved`, which covers every other failure.

use serde::{Deserialize, Serialize};

/// Result of turning a phrase into URLs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ResolutionResult {
    /// Deduplicated URLs, each with an explicit scheme.
    Found { urls: Vec<String> },
    /// Blocked by the platform's content filter.
    Rejected,
    /// Network, parse or agent failure.
    Unresolved,
}

impl ResolutionResult {
    pub fn urls(&self) -> Option<&[String]> {
        match self {
            ResolutionResult::Found { urls } => Some(urls),
            _ => None,
        }
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, ResolutionResult::Rejected)
    }
}

/// Validator judgement of a resolved URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Validity {
    Valid,
    Invalid,
    Indeterminate,
}

impl<'de> Deserialize<'de> for ValidityField {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        match raw.trim().to_ascii_lowercase().as_str() {
            "valid" => Ok(ValidityField(Validity::Valid)),
            "invalid" => Ok(ValidityField(Validity::Invalid)),
            "indeterminate" => Ok(ValidityField(Validity::Indeterminate)),
            other => Err(serde::de::Error::unknown_variant(other, &["valid", "invalid", "indeterminate"])),
        }
    }
}

/// Case-insensitive wire form of [`Validity`] used when parsing agent replies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidityField(pub Validity);

/// Verdict on whether a URL satisfies the original request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ValidityVerdict {
    pub original_request: String,
    pub url: String,
    pub validity: Validity,
    pub explanation: String,
}

/// Result of a validation call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ValidationResult {
    Verdict(ValidityVerdict),
    Unresolved,
}

impl ValidationResult {
    pub fn verdict(&self) -> Option<&ValidityVerdict> {
        match self {
            ValidationResult::Verdict(v) => Some(v),
            ValidationResult::Unresolved => None,
        }
    }
}

/// Tri-state result of an alias discovery call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryOutcome<T> {
    Found(T),
    Rejected,
    Unresolved,
}

impl<T> DiscoveryOutcome<T> {
    pub fn found(self) -> Option<T> {
        match self {
            DiscoveryOutcome::Found(value) => Some(value),
            _ => None,
        }
    }
}
