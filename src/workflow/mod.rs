//! Workflow runtime: an ordered list of steps with explicit dependency and
//! conditional-skip semantics, driven over the execution engine.
//!
//! Steps execute strictly in declaration order; the caller is responsible
//! for declaring them in an order consistent with `depends_on`. The runtime
//! verifies at construction time that the dependency graph is acyclic, and
//! at run time that every dependency has already executed.
//!
//! A failed step does not halt the workflow by itself; later steps run
//! unless they name it in `depends_on` and it was skipped. This
//! fire-and-continue behavior is deliberate (see DESIGN.md).


use crate::agent::{Agent, Role};
use crate::error::{Result, WeftError};
use crate::exec::{ExecOptions, ExecutionEngine, ExecutionEvent, ExecutionResult};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;

/// How a step participates in the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StepPattern {
    #[default]
    Sequential,
    Parallel,
    Conditional,
}

/// Opaque predicate over the results recorded so far. Returning false skips
/// the step: no execution, no result recorded.
pub type StepCondition = Arc<dyn Fn(&HashMap<String, ExecutionResult>) -> bool + Send + Sync>;

/// Hook invoked before a step whose agent's role differs from the previous
/// step's role, re-establishing role context before the command runs.
pub type RoleInitHook = Box<dyn Fn(&Agent) + Send + Sync>;

/// One step of a workflow, bound to an agent by name.
#[derive(Clone)]
pub struct WorkflowStep {
    pub agent_name: String,
    pub pattern: StepPattern,
    pub depends_on: Vec<String>,
    pub condition: Option<StepCondition>,
}

impl WorkflowStep {
    pub fn new(agent_name: impl Into<String>) -> Self {
        Self {
            agent_name: agent_name.into(),
            pattern: StepPattern::default(),
            depends_on: Vec::new(),
            condition: None,
        }
    }

    pub fn pattern(mut self, pattern: StepPattern) -> Self {
        self.pattern = pattern;
        self
    }

    pub fn depends_on(mut self, dependencies: impl IntoIterator<Item = String>) -> Self {
        self.depends_on = dependencies.into_iter().collect();
        self
    }

    pub fn condition(
        mut self,
        condition: impl Fn(&HashMap<String, ExecutionResult>) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.condition = Some(Arc::new(condition));
        self
    }
}

impl std::fmt::Debug for WorkflowStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowStep")
            .field("agent_name", &self.agent_name)
            .field("pattern", &self.pattern)
            .field("depends_on", &self.depends_on)
            .field("condition", &self.condition.is_some())
            .finish()
    }
}

/// Steps plus the agent map they draw from.
pub struct WorkflowDefinition {
    pub name: String,
    pub steps: Vec<WorkflowStep>,
    pub agents: BTreeMap<String, Agent>,
}

impl std::fmt::Debug for Workflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workflow")
            .field("name", &self.definition.name)
            .field("steps", &self.definition.steps)
            .field("results", &self.results)
            .field("init_hook", &self.init_hook.is_some())
            .finish()
    }
}

/// Drives a workflow definition over its own execution engine.
pub struct Workflow {
    definition: WorkflowDefinition,
    engine: ExecutionEngine,
    results: HashMap<String, ExecutionResult>,
    init_hook: Option<RoleInitHook>,
}

impl Workflow {
    /// Build a runtime, rejecting cyclic `depends_on` graphs.
    pub fn new(definition: WorkflowDefinition) -> Result<Self> {
        assert_acyclic(&definition.steps)?;
        Ok(Self {
            definition,
            engine: ExecutionEngine::new(),
            results: HashMap::new(),
            init_hook: None,
        })
    }

    /// Install the role-change initialization hook.
    pub fn with_init_hook(mut self, hook: RoleInitHook) -> Self {
        self.init_hook = Some(hook);
        self
    }

    /// Subscribe to the underlying engine's execution events.
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<ExecutionEvent> {
        self.engine.subscribe()
    }

    /// Run every step in declaration order.
    ///
    /// Per step: dependencies must already have executed, the condition (if
    /// any) decides whether the step runs at all, the agent is resolved from
    /// the agent map, the init hook fires on role changes, and the engine's
    /// result is recorded under the agent name.
    pub async fn execute(
        &mut self,
        command: &str,
        options: &ExecOptions,
    ) -> Result<&HashMap<String, ExecutionResult>> {
        let mut executed: HashSet<String> = HashSet::new();
        let mut last_role: Option<Role> = None;

        for step in &self.definition.steps {
            for dependency in &step.depends_on {
                if !executed.contains(dependency) {
                    return Err(WeftError::DependencyNotExecuted {
                        step: step.agent_name.clone(),
                        dependency: dependency.clone(),
                    });
                }
            }

            if let Some(condition) = &step.condition
                && !condition(&self.results)
            {
                debug!(step = %step.agent_name, "condition false, skipping");
                continue;
            }

            let agent = self
                .definition
                .agents
                .get(&step.agent_name)
                .ok_or_else(|| WeftError::UnknownAgent(step.agent_name.clone()))?;

            if last_role != Some(agent.role) {
                if let Some(hook) = &self.init_hook {
                    hook(agent);
                }
                last_role = Some(agent.role);
            }

            let result = self.engine.execute(agent, command, options).await;
            self.results.insert(step.agent_name.clone(), result);
            executed.insert(step.agent_name.clone());
        }

        Ok(&self.results)
    }

    pub fn results(&self) -> &HashMap<String, ExecutionResult> {
        &self.results
    }

    pub fn result(&self, agent_name: &str) -> Option<&ExecutionResult> {
        self.results.get(agent_name)
    }

    pub fn name(&self) -> &str {
        &self.definition.name
    }
}

/// Reject dependency cycles among steps at construction time.
///
/// Same explicit-stack three-color traversal as the flow validator, but a
/// back-edge here is a hard error naming the offending step. Dependencies
/// that name no declared step are leaves.
fn assert_acyclic(steps: &[WorkflowStep]) -> Result<()> {
    let by_name: HashMap<&str, &WorkflowStep> = steps
        .iter()
        .map(|step| (step.agent_name.as_str(), step))
        .collect();

    let mut visited: HashSet<&str> = HashSet::new();

    for root in steps {
        let root = root.agent_name.as_str();
        if visited.contains(root) {
            continue;
        }

        let mut visiting: HashSet<&str> = HashSet::new();
        let mut stack: Vec<(&str, usize)> = vec![(root, 0)];
        visited.insert(root);
        visiting.insert(root);

        while let Some((name, next_dep)) = stack.last_mut() {
            let deps: &[String] = by_name
                .get(name)
                .map(|step| step.depends_on.as_slice())
                .unwrap_or_default();

            if *next_dep < deps.len() {
                let dep = deps[*next_dep].as_str();
                *next_dep += 1;

                if visiting.contains(dep) {
                    return Err(WeftError::WorkflowCycle(dep.to_string()));
                }
                if visited.insert(dep) {
                    visiting.insert(dep);
                    stack.push((dep, 0));
                }
            } else {
                let (name, _) = stack.pop().expect("stack is non-empty");
                visiting.remove(name);
            }
        }
    }

    Ok(())
}
