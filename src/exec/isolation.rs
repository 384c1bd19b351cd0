//! Per-agent ephemeral working environments.
//!
//! Each agent gets a uniquely named scratch directory and an environment
//! that layers agent-identifying and sandbox-path variables over the
//! ambient environment. The execution root stays at `base_dir`; the temp
//! directory is auxiliary scratch space.
//!
//! Teardown is best-effort: removal failures are logged and never
//! propagated, so cleanup can sit on exit paths without masking the real
//! outcome.

use crate::agent::Agent;
use crate::error::Result;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Environment variable naming the agent an execution belongs to.
pub const ENV_AGENT_NAME: &str = "AGENT_NAME";
/// Environment variable pointing at the agent's scratch directory.
pub const ENV_SCOPE_TEMP: &str = "AGENT_SCOPE_TEMP";
/// Environment variable pointing at the execution base directory.
pub const ENV_SCOPE_BASE: &str = "AGENT_SCOPE_BASE";

/// An agent's isolated working environment.
#[derive(Debug, Clone)]
pub struct IsolatedContext {
    /// Working directory for execution (the base dir, not the temp dir).
    pub cwd: PathBuf,
    /// Ambient environment plus agent-identifying variables.
    pub env: HashMap<String, String>,
    /// Scratch directory owned by this context.
    pub temp_dir: PathBuf,
}

/// Tracks one live temp directory per agent name.
///
/// Creating a second context for the same agent replaces the tracked
/// directory; the previous one is orphaned unless cleaned up first
/// (observed behavior, kept as-is).
#[derive(Debug, Default)]
pub struct ContextIsolation {
    temp_dirs: HashMap<String, PathBuf>,
}

impl ContextIsolation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh scratch directory and scoped environment for the
    /// agent. The working directory defaults to `base_dir`.
    pub fn create_context(&mut self, agent: &Agent, base_dir: &Path) -> Result<IsolatedContext> {
        let temp_dir = tempfile::Builder::new()
            .prefix(&format!("agent-{}-", agent.name))
            .tempdir()?
            .keep();

        debug!(agent = %agent.name, dir = %temp_dir.display(), "created isolated context");

        if let Some(previous) = self.temp_dirs.insert(agent.name.clone(), temp_dir.clone()) {
            warn!(
                agent = %agent.name,
                orphaned = %previous.display(),
                "replacing tracked temp dir; previous dir is orphaned"
            );
        }

        let mut env: HashMap<String, String> = std::env::vars().collect();
        env.insert(ENV_AGENT_NAME.to_string(), agent.name.clone());
        env.insert(
            ENV_SCOPE_TEMP.to_string(),
            temp_dir.to_string_lossy().into_owned(),
        );
        env.insert(
            ENV_SCOPE_BASE.to_string(),
            base_dir.to_string_lossy().into_owned(),
        );

        Ok(IsolatedContext {
            cwd: base_dir.to_path_buf(),
            env,
            temp_dir,
        })
    }

    pub fn is_read_only(&self, agent: &Agent) -> bool {
        agent.scope.read_only
    }

    /// The tracked temp directory for an agent, if any.
    pub fn temp_dir(&self, agent_name: &str) -> Option<&Path> {
        self.temp_dirs.get(agent_name).map(PathBuf::as_path)
    }

    /// Remove the agent's temp directory and forget it. Failures are
    /// logged, not returned.
    pub fn cleanup(&mut self, agent_name: &str) {
        let Some(temp_dir) = self.temp_dirs.remove(agent_name) else {
            return;
        };

        match std::fs::remove_dir_all(&temp_dir) {
            Ok(()) => debug!(agent = %agent_name, dir = %temp_dir.display(), "cleaned up"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(
                agent = %agent_name,
                dir = %temp_dir.display(),
                error = %e,
                "failed to clean up temp directory"
            ),
        }
    }

    /// Clean every tracked context. Intended for process-exit hooks.
    pub fn cleanup_all(&mut self) {
        let names: Vec<String> = self.temp_dirs.keys().cloned().collect();
        for name in names {
            self.cleanup(&name);
        }
    }
}
