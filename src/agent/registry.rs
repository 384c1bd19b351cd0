//! Agent registry file loading and persistence.
//!
//! The registry is a keyed collection of agent records loaded once per
//! invocation. Two on-disk formats are supported, dispatched by extension:
//!
//! ```json
//! { "agents": [ { "name": "dev", "role": "developer",
//!                 "scope": { "patterns": ["src/**"], "readOnly": false } } ] }
//! ```
//!
//! as `agents.json`, or the same shape as `agents.yaml`. A missing file is
//! not an error: it yields an empty registry so a fresh checkout can add
//! agents before the first save.

use super::{Agent, validate_agent};
use crate::error::{Result, WeftError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// On-disk shape of the registry file.
#[derive(Debug, Default, Serialize, Deserialize)]
struct RegistryFile {
    #[serde(default)]
    agents: Vec<Agent>,
}

/// In-memory agent registry backed by a config file.
#[derive(Debug)]
pub struct AgentRegistry {
    agents: BTreeMap<String, Agent>,
    config_path: PathBuf,
}

impl AgentRegistry {
    /// Create a registry bound to the given config path. No I/O happens
    /// until [`load`](Self::load) or [`save`](Self::save) is called.
    pub fn new(config_path: impl Into<PathBuf>) -> Self {
        Self {
            agents: BTreeMap::new(),
            config_path: config_path.into(),
        }
    }

    /// Load agents from the config file, replacing any in-memory state.
    ///
    /// Every record is validated on the way in; a malformed agent fails the
    /// whole load. A missing file clears the registry and succeeds.
    pub fn load(&mut self) -> Result<()> {
        let content = match std::fs::read_to_string(&self.config_path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                self.agents.clear();
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        let file = self.parse_registry(&content)?;

        self.agents.clear();
        for agent in file.agents {
            validate_agent(&agent)?;
            self.agents.insert(agent.name.clone(), agent);
        }

        Ok(())
    }

    /// Persist the registry back to its config file, creating parent
    /// directories as needed.
    pub fn save(&self) -> Result<()> {
        let file = RegistryFile {
            agents: self.agents.values().cloned().collect(),
        };

        if let Some(dir) = self.config_path.parent()
            && !dir.as_os_str().is_empty()
        {
            std::fs::create_dir_all(dir)?;
        }

        let content = if is_yaml(&self.config_path) {
            serde_yaml::to_string(&file)
                .map_err(|e| WeftError::AgentConfig(format!("failed to serialize registry: {e}")))?
        } else {
            let mut json = serde_json::to_string_pretty(&file)
                .map_err(|e| WeftError::AgentConfig(format!("failed to serialize registry: {e}")))?;
            json.push('\n');
            json
        };

        std::fs::write(&self.config_path, content)?;
        Ok(())
    }

    /// Add (or replace) an agent after validating it.
    pub fn add(&mut self, agent: Agent) -> Result<()> {
        validate_agent(&agent)?;
        self.agents.insert(agent.name.clone(), agent);
        Ok(())
    }

    /// Remove an agent by name. Returns whether it was present.
    pub fn remove(&mut self, name: &str) -> bool {
        self.agents.remove(name).is_some()
    }

    pub fn get(&self, name: &str) -> Option<&Agent> {
        self.agents.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.agents.contains_key(name)
    }

    pub fn list(&self) -> Vec<&Agent> {
        self.agents.values().collect()
    }

    /// Consume the registry, yielding an agent map keyed by name for the
    /// workflow runtime and concurrent executor.
    pub fn into_agent_map(self) -> BTreeMap<String, Agent> {
        self.agents
    }

    /// Walk ancestor directories of `start_dir` looking for `agents.json`
    /// or `agents.yaml`. Returns the first hit, nearest directory first.
    pub fn find_config_file(start_dir: &Path) -> Option<PathBuf> {
        let mut current = Some(start_dir);

        while let Some(dir) = current {
            for name in ["agents.json", "agents.yaml"] {
                let candidate = dir.join(name);
                if candidate.is_file() {
                    return Some(candidate);
                }
            }
            current = dir.parent();
        }

        None
    }

    fn parse_registry(&self, content: &str) -> Result<RegistryFile> {
        if is_yaml(&self.config_path) {
            serde_yaml::from_str(content).map_err(|e| {
                WeftError::AgentConfig(format!(
                    "failed to parse '{}': {}",
                    self.config_path.display(),
                    e
                ))
            })
        } else {
            serde_json::from_str(content).map_err(|e| {
                WeftError::AgentConfig(format!(
                    "failed to parse '{}': {}",
                    self.config_path.display(),
                    e
                ))
            })
        }
    }
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    )
}
