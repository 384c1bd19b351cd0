//! Agent model for weft.
//!
//! An agent is a named, role-tagged, scope-restricted unit of execution.
//! Agents are created by loading a registry file (see [`registry`]) and are
//! immutable for the duration of a run.

mod registry;

#[cfg(test)]
mod tests;

pub use registry::AgentRegistry;

use crate::error::{Result, WeftError};
use serde::{Deserialize, Serialize};

/// The role an agent plays in a pipeline.
///
/// Roles drive the workflow runtime's initialization hook: when two adjacent
/// steps run agents with different roles, the hook fires to re-establish role
/// context before the command runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Developer,
    Qa,
    Architect,
    Reviewer,
    Spec,
    Unknown,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Developer => write!(f, "developer"),
            Role::Qa => write!(f, "qa"),
            Role::Architect => write!(f, "architect"),
            Role::Reviewer => write!(f, "reviewer"),
            Role::Spec => write!(f, "spec"),
            Role::Unknown => write!(f, "unknown"),
        }
    }
}

/// File-path access rules attached to an agent.
///
/// `patterns` is a non-empty set of glob strings (`**` matches any depth,
/// `*` stays within one path segment). `read_only` forbids modification
/// regardless of pattern matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scope {
    pub patterns: Vec<String>,

    #[serde(default, rename = "readOnly")]
    pub read_only: bool,
}

impl Scope {
    /// Create a writable scope over the given patterns.
    pub fn new(patterns: Vec<String>) -> Self {
        Self {
            patterns,
            read_only: false,
        }
    }

    /// Create a read-only scope over the given patterns.
    pub fn read_only(patterns: Vec<String>) -> Self {
        Self {
            patterns,
            read_only: true,
        }
    }
}

/// A named, scoped command executor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
    pub name: String,
    pub role: Role,
    pub scope: Scope,
}

impl Agent {
    pub fn new(name: impl Into<String>, role: Role, scope: Scope) -> Self {
        Self {
            name: name.into(),
            role,
            scope,
        }
    }
}

/// Validate an agent definition before it enters the registry.
///
/// Checks that the name is non-empty after trimming and that the scope
/// carries at least one non-empty pattern. Violations are construction-time
/// errors; callers must handle them before proceeding.
pub fn validate_agent(agent: &Agent) -> Result<()> {
    if agent.name.trim().is_empty() {
        return Err(WeftError::AgentConfig(
            "agent name cannot be empty".to_string(),
        ));
    }

    if agent.scope.patterns.is_empty() {
        return Err(WeftError::AgentConfig(format!(
            "agent '{}' must have at least one scope pattern",
            agent.name
        )));
    }

    if agent.scope.patterns.iter().any(|p| p.trim().is_empty()) {
        return Err(WeftError::AgentConfig(format!(
            "agent '{}' has an empty scope pattern",
            agent.name
        )));
    }

    Ok(())
}
