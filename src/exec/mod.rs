//! Execution subsystem: spawning, supervising, and fanning out agent
//! commands.
//!
//! [`ExecutionEngine`] owns a single execution at a time per call: it spawns
//! the command, streams output, enforces the timeout, and finalizes an
//! [`ExecutionResult`]. [`ConcurrentExecutor`] fans many agent executions
//! out over one engine with bounded parallelism. [`ContextIsolation`] gives
//! each agent an ephemeral scratch directory and a scoped environment.
//!
//! Execution failures (non-zero exit, spawn failure, timeout) are captured
//! in the result, never returned as errors, so callers iterating many
//! results are not interrupted by one bad execution.

mod concurrent;
mod engine;
mod isolation;

#[cfg(test)]
mod tests;

pub use concurrent::ConcurrentExecutor;
pub use engine::ExecutionEngine;
pub use isolation::{
    ContextIsolation, ENV_AGENT_NAME, ENV_SCOPE_BASE, ENV_SCOPE_TEMP, IsolatedContext,
};

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

/// Per-execution state machine: `Pending -> Running -> {Completed | Failed}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionState {
    Pending,
    Running,
    Completed,
    Failed,
}

impl std::fmt::Display for ExecutionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExecutionState::Pending => write!(f, "pending"),
            ExecutionState::Running => write!(f, "running"),
            ExecutionState::Completed => write!(f, "completed"),
            ExecutionState::Failed => write!(f, "failed"),
        }
    }
}

/// Outcome of one execution attempt. Immutable once the engine returns it.
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    pub execution_id: String,
    pub agent_name: String,
    pub state: ExecutionState,
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

impl ExecutionResult {
    fn pending(execution_id: &str, agent_name: &str) -> Self {
        Self {
            execution_id: execution_id.to_string(),
            agent_name: agent_name.to_string(),
            state: ExecutionState::Pending,
            exit_code: None,
            stdout: String::new(),
            stderr: String::new(),
            start_time: Utc::now(),
            end_time: None,
            error: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.state == ExecutionState::Completed
    }
}

/// Which stream a chunk of output arrived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

/// Observability notifications published by the engine.
///
/// Events are keyed by execution id; per execution they arrive in order and
/// every execution publishes a terminal event (`End` or `Error`). They are
/// not required for correctness; callers that want them subscribe and drain
/// a broadcast receiver.
#[derive(Debug, Clone)]
pub enum ExecutionEvent {
    Start {
        execution_id: String,
        agent_name: String,
    },
    Output {
        execution_id: String,
        agent_name: String,
        stream: OutputStream,
        chunk: String,
    },
    End {
        execution_id: String,
        agent_name: String,
        exit_code: Option<i32>,
    },
    Timeout {
        execution_id: String,
        agent_name: String,
    },
    Error {
        execution_id: String,
        agent_name: String,
        message: String,
    },
    Cancelled {
        execution_id: String,
    },
}

impl ExecutionEvent {
    /// Wire name of the event kind.
    pub fn kind(&self) -> &'static str {
        match self {
            ExecutionEvent::Start { .. } => "execution:start",
            ExecutionEvent::Output { .. } => "execution:output",
            ExecutionEvent::End { .. } => "execution:end",
            ExecutionEvent::Timeout { .. } => "execution:timeout",
            ExecutionEvent::Error { .. } => "execution:error",
            ExecutionEvent::Cancelled { .. } => "execution:cancelled",
        }
    }

    pub fn execution_id(&self) -> &str {
        match self {
            ExecutionEvent::Start { execution_id, .. }
            | ExecutionEvent::Output { execution_id, .. }
            | ExecutionEvent::End { execution_id, .. }
            | ExecutionEvent::Timeout { execution_id, .. }
            | ExecutionEvent::Error { execution_id, .. }
            | ExecutionEvent::Cancelled { execution_id } => execution_id,
        }
    }
}

/// Options for one execution.
#[derive(Debug, Clone, Default)]
pub struct ExecOptions {
    /// Kill the process and fail the result after this long.
    pub timeout: Option<Duration>,
    /// Working directory; inherited from the engine's process when unset.
    pub cwd: Option<PathBuf>,
    /// Extra environment variables layered over the ambient environment.
    pub env: HashMap<String, String>,
}

impl ExecOptions {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
            ..Self::default()
        }
    }

    /// Run inside an isolated context: its working directory and scoped
    /// environment.
    pub fn for_context(context: &IsolatedContext) -> Self {
        Self {
            timeout: None,
            cwd: Some(context.cwd.clone()),
            env: context.env.clone(),
        }
    }
}
