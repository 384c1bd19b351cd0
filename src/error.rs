//! Error types for weft.
//!
//! Uses thiserror for derive macros and provides user-actionable error messages.
//!
//! Only construction-time and lifecycle failures surface as `WeftError`:
//! static flow findings are returned as a list by the validator, and
//! execution-time failures (non-zero exit, spawn failure, timeout) live in
//! `ExecutionResult::error` so iterating many results is never interrupted
//! by one bad execution.

use thiserror::Error;

/// Main error type for weft operations.
#[derive(Error, Debug)]
pub enum WeftError {
    /// A flow document could not be parsed into a `Flow`.
    #[error("Failed to parse flow: {0}")]
    FlowParse(String),

    /// An agent definition or registry file is malformed.
    #[error("Invalid agent configuration: {0}")]
    AgentConfig(String),

    /// A specification document is malformed.
    #[error("Invalid specification: {0}")]
    SpecDoc(String),

    /// The workflow step graph contains a dependency cycle.
    #[error("Cycle detected in workflow at step '{0}'")]
    WorkflowCycle(String),

    /// A step ran before one of its declared dependencies.
    #[error("Dependency '{dependency}' not executed before step '{step}'")]
    DependencyNotExecuted { step: String, dependency: String },

    /// A step references an agent that is not in the agent map.
    #[error("Agent '{0}' not found in workflow")]
    UnknownAgent(String),

    /// An artifact id was referenced during handoff but is not in the store.
    #[error("Artifact '{0}' not found")]
    ArtifactNotFound(String),

    /// Filesystem operation failed (registry load/save, temp directories).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for weft operations.
pub type Result<T> = std::result::Result<T, WeftError>;
