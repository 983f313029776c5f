//! Agent-backed workflows for sitealias.
//!
//! This crate provides the agent platform boundary and its HTTP client, the
//! agent registry, the shared run driver, and the resolution, validation and
//! discovery workflows used by the server.

pub mod platform;
pub mod registry;
pub mod roles;
pub mod run;
pub mod workflows;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use platform::{AgentPlatform, HttpPlatform, PlatformConfig, PlatformError};
pub use registry::AgentRegistry;
pub use roles::{RoleSettings, definition};
pub use run::{Reply, RunDriver, RunFailure, RunOutcome, RunPolicy};
pub use workflows::{
    Discoverer, KeywordReport, PhrasePage, PhraseReport, Resolver, ResolverReply, RoleAgent, Validator,
    ValidatorReply, Workflows,
};
