//! Context hand-off: transferring artifacts between agent contexts.
//!
//! Layers hand-off semantics on top of [`ArtifactManager`]: passing a set of
//! artifacts marks each one used and fails the whole operation if any id is
//! absent, and isolation produces a fresh id-to-data mapping with no shared
//! reference back into the store.

use super::{Artifact, ArtifactManager};
use crate::error::{Result, WeftError};
use std::collections::HashMap;

/// One artifact a receiving context requires, matched by id and kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequiredArtifact {
    pub id: String,
    pub name: String,
    pub kind: String,
}

/// What an agent declares it needs before its step runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextRequest {
    pub agent_name: String,
    pub required_artifacts: Vec<RequiredArtifact>,
}

/// Hand-off operations over an owned artifact manager.
#[derive(Default)]
pub struct ContextHandoff {
    manager: ArtifactManager,
}

impl ContextHandoff {
    pub fn new(manager: ArtifactManager) -> Self {
        Self { manager }
    }

    pub fn manager(&self) -> &ArtifactManager {
        &self.manager
    }

    pub fn manager_mut(&mut self) -> &mut ArtifactManager {
        &mut self.manager
    }

    /// Pass the named artifacts from one agent's context to another's.
    ///
    /// Every artifact is marked used; an unknown id fails the whole
    /// operation with [`WeftError::ArtifactNotFound`].
    pub fn pass_context(
        &mut self,
        _source_agent: &str,
        _target_agent: &str,
        artifact_ids: &[String],
    ) -> Result<Vec<Artifact>> {
        let mut artifacts = Vec::with_capacity(artifact_ids.len());

        for id in artifact_ids {
            let artifact = self
                .manager
                .use_artifact(id)
                .ok_or_else(|| WeftError::ArtifactNotFound(id.clone()))?;
            artifacts.push(artifact);
        }

        Ok(artifacts)
    }

    /// True iff every required `{id, kind}` pair is present among the
    /// available artifacts.
    pub fn validate_context(request: &ContextRequest, available: &[Artifact]) -> bool {
        request.required_artifacts.iter().all(|required| {
            available
                .iter()
                .any(|a| a.id == required.id && a.kind == required.kind)
        })
    }

    /// Produce a fresh id-to-data mapping visible only to the receiving
    /// logical context. Data is cloned, so the receiver cannot reach back
    /// into the artifact store.
    pub fn isolate_context(
        _agent_name: &str,
        artifacts: &[Artifact],
    ) -> HashMap<String, Option<serde_json::Value>> {
        artifacts
            .iter()
            .map(|a| (a.id.clone(), a.data.clone()))
            .collect()
    }
}
