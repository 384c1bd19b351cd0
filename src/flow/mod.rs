//! Flow graph model for weft.
//!
//! A flow is a declarative directed graph: named nodes, each bound to an
//! agent, and edges describing artifact hand-off between them. Flows are
//! constructed once by the parser, never mutated, and consumed by the
//! validator and the workflow runtime.

pub mod parser;
pub mod validator;


pub use parser::{parse_json, serialize};
pub use validator::validate;

use std::collections::BTreeMap;

/// One node of a flow graph, bound to an agent by name.
///
/// `inputs` maps an input (artifact) name to the node id expected to produce
/// it. The mapping is advisory until the validator checks it against the
/// edge list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowNode {
    pub agent_name: String,
    pub inputs: Option<BTreeMap<String, String>>,
}

impl FlowNode {
    pub fn new(agent_name: impl Into<String>) -> Self {
        Self {
            agent_name: agent_name.into(),
            inputs: None,
        }
    }

    pub fn with_inputs(
        agent_name: impl Into<String>,
        inputs: impl IntoIterator<Item = (String, String)>,
    ) -> Self {
        Self {
            agent_name: agent_name.into(),
            inputs: Some(inputs.into_iter().collect()),
        }
    }
}

/// An artifact hand-off between two nodes.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Edge {
    pub from: String,
    pub to: String,
    pub artifact: String,
}

impl Edge {
    pub fn new(
        from: impl Into<String>,
        to: impl Into<String>,
        artifact: impl Into<String>,
    ) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            artifact: artifact.into(),
        }
    }
}

/// A parsed flow document.
///
/// Nodes keep the declaration order of the source document; validation
/// traverses them in that order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flow {
    pub name: String,
    pub version: String,
    pub nodes: Vec<(String, FlowNode)>,
    pub edges: Vec<Edge>,
}

impl Flow {
    /// Look up a node by id.
    pub fn node(&self, id: &str) -> Option<&FlowNode> {
        self.nodes
            .iter()
            .find(|(node_id, _)| node_id == id)
            .map(|(_, node)| node)
    }

    /// Node ids in declaration order.
    pub fn node_ids(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().map(|(id, _)| id.as_str())
    }
}

/// Kind of finding reported by the flow validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowErrorKind {
    /// The dependency graph induced by edges contains a cycle.
    Cycle,
    /// A declared input is not produced by its source node.
    MissingInput,
    /// A node has no usable agent name.
    MissingAgent,
}

impl std::fmt::Display for FlowErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FlowErrorKind::Cycle => write!(f, "cycle"),
            FlowErrorKind::MissingInput => write!(f, "missing_input"),
            FlowErrorKind::MissingAgent => write!(f, "missing_agent"),
        }
    }
}

/// One finding from static flow validation.
///
/// Findings are returned as a list, not raised: callers decide how to treat
/// them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowValidationError {
    pub kind: FlowErrorKind,
    pub message: String,
    pub node_id: Option<String>,
}
