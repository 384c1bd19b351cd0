//! Artifact manager: lifecycle transitions over a pluggable store.

use super::{Artifact, ArtifactLifecycle, ArtifactStore, InMemoryArtifactStore};
use chrono::Utc;

/// Owner and lifecycle of an artifact, without its data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnershipInfo {
    pub owner: String,
    pub lifecycle: ArtifactLifecycle,
}

/// Drives artifact lifecycles on top of an [`ArtifactStore`].
///
/// Transitions only ever move forward: an archived artifact never becomes
/// `used` again, and a used artifact never becomes `created`.
pub struct ArtifactManager {
    store: Box<dyn ArtifactStore + Send>,
}

impl Default for ArtifactManager {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl ArtifactManager {
    pub fn new(store: Box<dyn ArtifactStore + Send>) -> Self {
        Self { store }
    }

    /// Manager backed by the in-memory reference store.
    pub fn in_memory() -> Self {
        Self::new(Box::new(InMemoryArtifactStore::new()))
    }

    /// Store a new artifact with lifecycle `created`.
    pub fn create(
        &mut self,
        id: impl Into<String>,
        name: impl Into<String>,
        owner: impl Into<String>,
        kind: impl Into<String>,
        data: Option<serde_json::Value>,
    ) -> Artifact {
        let artifact = Artifact {
            id: id.into(),
            name: name.into(),
            owner: owner.into(),
            kind: kind.into(),
            lifecycle: ArtifactLifecycle::Created,
            created_at: Utc::now(),
            used_at: None,
            archived_at: None,
            data,
        };

        self.store.store(artifact.clone());
        artifact
    }

    /// Mark an artifact consumed (`created -> used`) and return it.
    ///
    /// Returns `None` if the id is unknown. Calling again is harmless, and
    /// an archived artifact stays archived.
    pub fn use_artifact(&mut self, id: &str) -> Option<Artifact> {
        let mut artifact = self.store.retrieve(id)?;

        if artifact.lifecycle == ArtifactLifecycle::Created {
            artifact.lifecycle = ArtifactLifecycle::Used;
            artifact.used_at = Some(Utc::now());
            self.store.store(artifact.clone());
        }

        Some(artifact)
    }

    /// Retire an artifact (`-> archived`). There is no un-archive.
    pub fn archive(&mut self, id: &str) -> Option<Artifact> {
        let mut artifact = self.store.retrieve(id)?;

        if artifact.lifecycle != ArtifactLifecycle::Archived {
            artifact.lifecycle = ArtifactLifecycle::Archived;
            artifact.archived_at = Some(Utc::now());
            self.store.store(artifact.clone());
        }

        Some(artifact)
    }

    pub fn ownership_info(&self, id: &str) -> Option<OwnershipInfo> {
        let artifact = self.store.retrieve(id)?;
        Some(OwnershipInfo {
            owner: artifact.owner,
            lifecycle: artifact.lifecycle,
        })
    }

    /// Only the original creator may mutate an artifact.
    pub fn can_modify(&self, id: &str, requesting_agent: &str) -> bool {
        self.store
            .retrieve(id)
            .is_some_and(|artifact| artifact.owner == requesting_agent)
    }

    pub fn list_owned(&self, owner: &str) -> Vec<Artifact> {
        self.store.list_by_owner(owner)
    }

    pub fn get(&self, id: &str) -> Option<Artifact> {
        self.store.retrieve(id)
    }
}
