//! Static validation of flow graphs.
//!
//! Three independent read-only checks whose findings are concatenated, so a
//! flow can surface errors of several kinds at once:
//!
//! 1. cycle detection over the dependency edges,
//! 2. input/output consistency between declared inputs and edges,
//! 3. agent-reference validity per node.
//!
//! Cycle detection uses an explicit stack over an adjacency index built once
//! from the edge list, so deep graphs cannot exhaust the call stack.

use super::{Flow, FlowErrorKind, FlowValidationError};
use std::collections::{HashMap, HashSet};

/// Validate a flow. Returns the empty list for a valid flow.
pub fn validate(flow: &Flow) -> Vec<FlowValidationError> {
    let mut errors = Vec::new();
    errors.extend(detect_cycles(flow));
    errors.extend(check_inputs(flow));
    errors.extend(check_agents(flow));
    errors
}

/// Node `n` depends on node `m` if any edge has `to = n, from = m`.
/// Traversal starts from each node in declaration order; one `cycle` error
/// is reported per node at which a cycle is first detected.
fn detect_cycles(flow: &Flow) -> Vec<FlowValidationError> {
    let mut dependencies: HashMap<&str, Vec<&str>> = HashMap::new();
    for edge in &flow.edges {
        dependencies
            .entry(edge.to.as_str())
            .or_default()
            .push(edge.from.as_str());
    }

    let known: HashSet<&str> = flow.node_ids().collect();
    let mut visited: HashSet<&str> = HashSet::new();
    let mut errors = Vec::new();

    for (root, _) in &flow.nodes {
        if visited.contains(root.as_str()) {
            continue;
        }
        if dfs_finds_cycle(root, &dependencies, &known, &mut visited) {
            errors.push(FlowValidationError {
                kind: FlowErrorKind::Cycle,
                message: format!("Cycle detected involving node {root}"),
                node_id: Some(root.clone()),
            });
        }
    }

    errors
}

/// Iterative three-color depth-first search from `root`. A back-edge into a
/// node still on the traversal stack is a cycle. Node ids that appear only
/// in edges (not in the node map) are treated as leaves.
fn dfs_finds_cycle<'a>(
    root: &'a str,
    dependencies: &HashMap<&'a str, Vec<&'a str>>,
    known: &HashSet<&'a str>,
    visited: &mut HashSet<&'a str>,
) -> bool {
    const NO_DEPS: &[&str] = &[];

    let mut visiting: HashSet<&str> = HashSet::new();
    let mut stack: Vec<(&str, usize)> = vec![(root, 0)];
    visited.insert(root);
    visiting.insert(root);

    while let Some((node, next_dep)) = stack.last_mut() {
        let deps = if known.contains(node) {
            dependencies.get(node).map(Vec::as_slice).unwrap_or(NO_DEPS)
        } else {
            NO_DEPS
        };

        if *next_dep < deps.len() {
            let dep = deps[*next_dep];
            *next_dep += 1;

            if visiting.contains(dep) {
                return true;
            }
            if visited.insert(dep) {
                visiting.insert(dep);
                stack.push((dep, 0));
            }
        } else {
            let (node, _) = stack.pop().expect("stack is non-empty");
            visiting.remove(node);
        }
    }

    false
}

/// Every declared `(input, source)` pair must be backed by an edge leaving
/// `source` with artifact name `input`.
fn check_inputs(flow: &Flow) -> Vec<FlowValidationError> {
    let mut outputs: HashMap<&str, HashSet<&str>> = HashMap::new();
    for edge in &flow.edges {
        outputs
            .entry(edge.from.as_str())
            .or_default()
            .insert(edge.artifact.as_str());
    }

    let mut errors = Vec::new();
    for (node_id, node) in &flow.nodes {
        let Some(inputs) = &node.inputs else {
            continue;
        };

        for (input_name, source_node) in inputs {
            let produced = outputs
                .get(source_node.as_str())
                .is_some_and(|artifacts| artifacts.contains(input_name.as_str()));

            if !produced {
                errors.push(FlowValidationError {
                    kind: FlowErrorKind::MissingInput,
                    message: format!(
                        "Node {node_id} requires input {input_name} from {source_node}, \
                         but {source_node} does not produce it"
                    ),
                    node_id: Some(node_id.clone()),
                });
            }
        }
    }

    errors
}

fn check_agents(flow: &Flow) -> Vec<FlowValidationError> {
    let mut errors = Vec::new();
    for (node_id, node) in &flow.nodes {
        if node.agent_name.trim().is_empty() {
            errors.push(FlowValidationError {
                kind: FlowErrorKind::MissingAgent,
                message: format!("Node {node_id} does not have a valid agent name"),
                node_id: Some(node_id.clone()),
            });
        }
    }
    errors
}
