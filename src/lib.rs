//! Weft: scoped multi-agent flow orchestrator for automated coding pipelines.
//!
//! Weft configures and runs short-lived agents (named, scoped command
//! executors) composed into multi-step workflows and flows: directed graphs
//! whose nodes are agents and whose edges describe artifact hand-off between
//! them.
//!
//! The usual pipeline is: parse a flow document ([`flow::parse_json`]),
//! gate it through static validation ([`flow::validate`]), then drive a
//! [`workflow::Workflow`] — or fan independent executions out through an
//! [`exec::ConcurrentExecutor`]. Cross-step data moves through the
//! [`artifact`] manager and context hand-off; [`contract`] checks
//! producer/consumer specifications independently, typically pre-deployment.
//!
//! Execution is single-process and event-driven: many subprocess executions
//! may be interleaved, but parallel CPU work happens in the spawned OS
//! processes, not here.

pub mod agent;
pub mod artifact;
pub mod contract;
pub mod error;
pub mod exec;
pub mod flow;
pub mod scope;
pub mod specs;
pub mod workflow;

pub use agent::{Agent, AgentRegistry, Role, Scope};
pub use error::{Result, WeftError};
