//! Artifact lifecycle tracking and hand-off between agent contexts.
//!
//! An artifact is a lifecycle-tracked unit of data produced by one agent and
//! optionally consumed by another. Transitions are forward-only:
//! `created -> used -> archived`, with no way back. Storage is behind the
//! [`ArtifactStore`] trait; the in-memory implementation is the reference,
//! and any keyed store satisfying store/retrieve/delete/list-by-owner works.

mod handoff;
mod manager;


pub use handoff::{ContextHandoff, ContextRequest, RequiredArtifact};
pub use manager::{ArtifactManager, OwnershipInfo};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Where an artifact sits in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactLifecycle {
    Created,
    Used,
    Archived,
}

/// A lifecycle-tracked data hand-off unit with single-owner mutation rights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    pub id: String,
    pub name: String,
    pub owner: String,
    pub kind: String,
    pub lifecycle: ArtifactLifecycle,
    pub created_at: DateTime<Utc>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub used_at: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub archived_at: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

/// Pluggable keyed storage for artifacts.
pub trait ArtifactStore {
    fn store(&mut self, artifact: Artifact);
    fn retrieve(&self, id: &str) -> Option<Artifact>;
    fn delete(&mut self, id: &str);
    fn list_by_owner(&self, owner: &str) -> Vec<Artifact>;
}

/// Reference store: a plain in-process map. State lives only as long as the
/// store instance.
#[derive(Debug, Default)]
pub struct InMemoryArtifactStore {
    artifacts: BTreeMap<String, Artifact>,
}

impl InMemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ArtifactStore for InMemoryArtifactStore {
    fn store(&mut self, artifact: Artifact) {
        self.artifacts.insert(artifact.id.clone(), artifact);
    }

    fn retrieve(&self, id: &str) -> Option<Artifact> {
        self.artifacts.get(id).cloned()
    }

    fn delete(&mut self, id: &str) {
        self.artifacts.remove(id);
    }

    fn list_by_owner(&self, owner: &str) -> Vec<Artifact> {
        self.artifacts
            .values()
            .filter(|a| a.owner == owner)
            .cloned()
            .collect()
    }
}
