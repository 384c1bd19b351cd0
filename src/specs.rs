//! Specification documents: the declared inputs and outputs of an agent or
//! pipeline stage, as fed to the contract validator.

use crate::error::{Result, WeftError};
use serde::{Deserialize, Serialize};

/// A named port on a specification (input or output).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecPort {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl SpecPort {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
        }
    }
}

/// A producer's or consumer's declared interface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Specification {
    pub name: String,
    pub version: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inputs: Option<Vec<SpecPort>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outputs: Option<Vec<SpecPort>>,
}

impl Specification {
    /// Parse a serialized specification document.
    pub fn from_json(input: &str) -> Result<Self> {
        let spec: Specification = serde_json::from_str(input)
            .map_err(|e| WeftError::SpecDoc(format!("failed to parse: {e}")))?;
        spec.validate()?;
        Ok(spec)
    }

    /// Structural checks: non-empty name and version, non-empty port names.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(WeftError::SpecDoc(
                "specification must have a non-empty name".to_string(),
            ));
        }
        if self.version.trim().is_empty() {
            return Err(WeftError::SpecDoc(format!(
                "specification '{}' must have a version",
                self.name
            )));
        }

        let ports = self
            .inputs
            .iter()
            .flatten()
            .chain(self.outputs.iter().flatten());
        for port in ports {
            if port.name.trim().is_empty() {
                return Err(WeftError::SpecDoc(format!(
                    "specification '{}' has a port with an empty name",
                    self.name
                )));
            }
        }

        Ok(())
    }
}
