//! Bounded-parallelism fan-out of many agent executions.

use super::{ExecOptions, ExecutionEngine, ExecutionResult};
use crate::agent::Agent;
use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex};
use tracing::debug;

const DEFAULT_MAX_CONCURRENT: usize = 4;

/// Worker-pool executor over a shared [`ExecutionEngine`].
///
/// `execute_many` starts `min(max_concurrent, agents.len())` workers, each
/// popping the next agent off a shared queue until it is empty. Results come
/// back in completion order, not submission order.
pub struct ConcurrentExecutor {
    engine: Arc<ExecutionEngine>,
    running: Arc<Mutex<HashSet<String>>>,
    max_concurrent: usize,
}

impl Default for ConcurrentExecutor {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CONCURRENT)
    }
}

impl ConcurrentExecutor {
    pub fn new(max_concurrent: usize) -> Self {
        Self {
            engine: Arc::new(ExecutionEngine::new()),
            running: Arc::new(Mutex::new(HashSet::new())),
            max_concurrent,
        }
    }

    /// The underlying engine, for event subscription and result access.
    pub fn engine(&self) -> &ExecutionEngine {
        &self.engine
    }

    /// Execute `command` once per agent with bounded concurrency.
    pub async fn execute_many(
        &self,
        agents: &[Agent],
        command: &str,
        options: &ExecOptions,
    ) -> Vec<ExecutionResult> {
        let queue: Arc<Mutex<VecDeque<Agent>>> =
            Arc::new(Mutex::new(agents.iter().cloned().collect()));
        let results: Arc<Mutex<Vec<ExecutionResult>>> = Arc::new(Mutex::new(Vec::new()));

        let workers = self.max_concurrent.min(agents.len());
        debug!(agents = agents.len(), workers, "starting fan-out");

        let worker_futures: Vec<_> = (0..workers)
            .map(|_| {
                let engine = Arc::clone(&self.engine);
                let queue = Arc::clone(&queue);
                let running = Arc::clone(&self.running);
                let results = Arc::clone(&results);

                async move {
                    loop {
                        let agent = queue.lock().expect("queue poisoned").pop_front();
                        let Some(agent) = agent else { break };

                        running
                            .lock()
                            .expect("running set poisoned")
                            .insert(agent.name.clone());

                        let result = engine.execute(&agent, command, options).await;

                        running
                            .lock()
                            .expect("running set poisoned")
                            .remove(&agent.name);
                        results.lock().expect("results poisoned").push(result);
                    }
                }
            })
            .collect();

        futures::future::join_all(worker_futures).await;

        let results = Arc::try_unwrap(results).expect("workers finished");
        results.into_inner().expect("results poisoned")
    }

    /// Names of agents currently in flight (added at queue-pop, removed when
    /// the execution settles).
    pub fn running_agents(&self) -> Vec<String> {
        self.running
            .lock()
            .expect("running set poisoned")
            .iter()
            .cloned()
            .collect()
    }

    pub fn is_running(&self, agent_name: &str) -> bool {
        self.running
            .lock()
            .expect("running set poisoned")
            .contains(agent_name)
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Clamped to at least 1. Affects only future `execute_many` calls; a
    /// pool that has already started keeps its size.
    pub fn set_max_concurrent(&mut self, max: usize) {
        self.max_concurrent = max.max(1);
    }
}
