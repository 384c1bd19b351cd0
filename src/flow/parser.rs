//! Strict structural parsing and serialization of flow documents.
//!
//! A flow document is a JSON object:
//!
//! ```json
//! {
//!   "name": "review-pipeline",
//!   "version": "1.0",
//!   "nodes": {
//!     "build": { "agentName": "dev" },
//!     "review": { "agentName": "reviewer", "inputs": { "diff": "build" } }
//!   },
//!   "edges": [ { "from": "build", "to": "review", "artifact": "diff" } ]
//! }
//! ```
//!
//! Structural problems in `name`, `version`, or `nodes` fail the parse with
//! a descriptive error. `edges` are advisory for validation rather than part
//! of any node definition, so an unknown or malformed edge list falls back
//! to empty instead of failing. `serialize` is the structural inverse:
//! `parse_json(&serialize(flow)?)? == flow` for any flow.

use super::{Edge, Flow, FlowNode};
use crate::error::{Result, WeftError};
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;

/// Parse a serialized flow document into a [`Flow`].
pub fn parse_json(input: &str) -> Result<Flow> {
    let value: Value = serde_json::from_str(input)
        .map_err(|e| WeftError::FlowParse(format!("invalid JSON: {e}")))?;

    let Value::Object(doc) = value else {
        return Err(WeftError::FlowParse("flow must be an object".to_string()));
    };

    let name = require_non_empty_string(&doc, "name")?;
    let version = require_non_empty_string(&doc, "version")?;

    let Some(Value::Object(raw_nodes)) = doc.get("nodes") else {
        return Err(WeftError::FlowParse("flow must have nodes".to_string()));
    };

    let mut nodes = Vec::with_capacity(raw_nodes.len());
    for (node_id, node_value) in raw_nodes {
        nodes.push((node_id.clone(), parse_node(node_id, node_value)?));
    }

    Ok(Flow {
        name,
        version,
        nodes,
        edges: parse_edges(doc.get("edges")),
    })
}

/// Serialize a [`Flow`] back to its document form, preserving node order.
pub fn serialize(flow: &Flow) -> Result<String> {
    let mut nodes = Map::new();
    for (id, node) in &flow.nodes {
        let mut entry = Map::new();
        entry.insert("agentName".to_string(), json!(node.agent_name));
        if let Some(inputs) = &node.inputs {
            entry.insert("inputs".to_string(), json!(inputs));
        }
        nodes.insert(id.clone(), Value::Object(entry));
    }

    let mut doc = Map::new();
    doc.insert("name".to_string(), json!(flow.name));
    doc.insert("version".to_string(), json!(flow.version));
    doc.insert("nodes".to_string(), Value::Object(nodes));
    doc.insert("edges".to_string(), json!(flow.edges));

    serde_json::to_string_pretty(&Value::Object(doc))
        .map_err(|e| WeftError::FlowParse(format!("failed to serialize flow: {e}")))
}

fn require_non_empty_string(doc: &Map<String, Value>, field: &str) -> Result<String> {
    match doc.get(field) {
        Some(Value::String(s)) if !s.is_empty() => Ok(s.clone()),
        _ => Err(WeftError::FlowParse(format!(
            "flow must have a non-empty {field}"
        ))),
    }
}

fn parse_node(node_id: &str, value: &Value) -> Result<FlowNode> {
    let Value::Object(node) = value else {
        return Err(WeftError::FlowParse(format!(
            "node '{node_id}' must be an object"
        )));
    };

    let agent_name = match node.get("agentName") {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        _ => {
            return Err(WeftError::FlowParse(format!(
                "node '{node_id}' must have a non-empty agentName"
            )));
        }
    };

    Ok(FlowNode {
        agent_name,
        inputs: parse_inputs(node.get("inputs")),
    })
}

/// Inputs must be an object of string values; anything else is dropped.
fn parse_inputs(value: Option<&Value>) -> Option<BTreeMap<String, String>> {
    let Some(Value::Object(raw)) = value else {
        return None;
    };

    Some(
        raw.iter()
            .filter_map(|(name, source)| {
                source
                    .as_str()
                    .map(|source| (name.clone(), source.to_string()))
            })
            .collect(),
    )
}

/// A missing, non-array, or structurally wrong edge list falls back to empty.
fn parse_edges(value: Option<&Value>) -> Vec<Edge> {
    value
        .and_then(|v| serde_json::from_value::<Vec<Edge>>(v.clone()).ok())
        .unwrap_or_default()
}
