use super::*;
use crate::agent::{Agent, Role, Scope};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

fn dev_agent(name: &str) -> Agent {
    Agent::new(name, Role::Developer, Scope::new(vec!["**".to_string()]))
}

// Execution engine

#[tokio::test]
async fn echo_completes_with_exit_zero() {
    let engine = ExecutionEngine::new();
    let result = engine
        .execute(&dev_agent("dev"), "echo hi", &ExecOptions::default())
        .await;

    assert_eq!(result.state, ExecutionState::Completed);
    assert_eq!(result.exit_code, Some(0));
    assert!(result.stdout.contains("hi"));
    assert!(result.error.is_none());
    assert!(result.end_time.is_some());
    assert!(result.is_success());
}

#[tokio::test]
async fn nonzero_exit_is_failed() {
    let engine = ExecutionEngine::new();
    let result = engine
        .execute(&dev_agent("dev"), "exit 1", &ExecOptions::default())
        .await;

    assert_eq!(result.state, ExecutionState::Failed);
    assert_eq!(result.exit_code, Some(1));
    assert!(result.error.as_deref().unwrap().contains("code 1"));
    assert!(result.end_time.is_some());
}

#[tokio::test]
async fn stderr_is_captured_separately() {
    let engine = ExecutionEngine::new();
    let result = engine
        .execute(
            &dev_agent("dev"),
            "echo out; echo err >&2",
            &ExecOptions::default(),
        )
        .await;

    assert!(result.stdout.contains("out"));
    assert!(result.stderr.contains("err"));
    assert!(!result.stdout.contains("err"));
}

#[tokio::test]
async fn spawn_failure_fails_without_exit_code() {
    let engine = ExecutionEngine::new();
    let options = ExecOptions {
        cwd: Some("/definitely/not/a/real/dir".into()),
        ..ExecOptions::default()
    };
    let result = engine.execute(&dev_agent("dev"), "echo hi", &options).await;

    assert_eq!(result.state, ExecutionState::Failed);
    assert_eq!(result.exit_code, None);
    assert!(result.error.as_deref().unwrap().contains("failed to spawn"));
    assert!(result.end_time.is_some());
}

#[tokio::test]
async fn timeout_kills_and_fails() {
    let engine = ExecutionEngine::new();
    let start = std::time::Instant::now();
    let result = engine
        .execute(
            &dev_agent("dev"),
            "sleep 30",
            &ExecOptions::with_timeout(Duration::from_millis(100)),
        )
        .await;

    assert_eq!(result.state, ExecutionState::Failed);
    assert!(result.error.as_deref().unwrap().contains("timeout"));
    assert!(result.end_time.is_some());
    // The process was signalled, not waited out.
    assert!(start.elapsed() < Duration::from_secs(10));
}

#[tokio::test]
async fn fast_process_beats_its_timeout() {
    let engine = ExecutionEngine::new();
    let result = engine
        .execute(
            &dev_agent("dev"),
            "echo quick",
            &ExecOptions::with_timeout(Duration::from_secs(30)),
        )
        .await;

    assert_eq!(result.state, ExecutionState::Completed);
    assert!(result.stdout.contains("quick"));
}

#[tokio::test]
async fn custom_cwd_and_env_are_applied() {
    let temp = TempDir::new().unwrap();
    let engine = ExecutionEngine::new();
    let options = ExecOptions {
        cwd: Some(temp.path().to_path_buf()),
        env: [("WEFT_PROBE".to_string(), "42".to_string())].into(),
        ..ExecOptions::default()
    };
    let result = engine
        .execute(&dev_agent("dev"), "pwd; printf '%s' \"$WEFT_PROBE\"", &options)
        .await;

    assert_eq!(result.state, ExecutionState::Completed);
    assert!(
        result
            .stdout
            .contains(temp.path().file_name().unwrap().to_str().unwrap())
    );
    assert!(result.stdout.contains("42"));
}

#[tokio::test]
async fn results_accumulate_and_clear() {
    let engine = ExecutionEngine::new();
    let first = engine
        .execute(&dev_agent("a"), "true", &ExecOptions::default())
        .await;
    engine
        .execute(&dev_agent("b"), "true", &ExecOptions::default())
        .await;

    assert_eq!(engine.get_all_results().len(), 2);
    let looked_up = engine.get_result(&first.execution_id).unwrap();
    assert_eq!(looked_up.agent_name, "a");

    engine.clear_results();
    assert!(engine.get_all_results().is_empty());
    assert!(engine.get_result(&first.execution_id).is_none());
}

#[tokio::test]
async fn events_cover_the_execution_lifecycle() {
    let engine = ExecutionEngine::new();
    let mut events = engine.subscribe();
    let result = engine
        .execute(&dev_agent("dev"), "echo hi", &ExecOptions::default())
        .await;

    let mut kinds = Vec::new();
    while let Ok(event) = events.try_recv() {
        assert_eq!(event.execution_id(), result.execution_id);
        kinds.push(event.kind());
    }

    assert_eq!(kinds.first(), Some(&"execution:start"));
    assert_eq!(kinds.last(), Some(&"execution:end"));
    assert!(kinds.contains(&"execution:output"));
}

#[tokio::test]
async fn cancel_terminates_a_running_execution() {
    let engine = Arc::new(ExecutionEngine::new());
    let mut events = engine.subscribe();

    let agent = dev_agent("runner");
    let handle = {
        let engine = Arc::clone(&engine);
        tokio::spawn(async move { engine.execute(&agent, "sleep 30", &ExecOptions::default()).await })
    };

    let execution_id = loop {
        match events.recv().await.unwrap() {
            ExecutionEvent::Start { execution_id, .. } => break execution_id,
            _ => {}
        }
    };

    assert!(engine.cancel(&execution_id));
    let result = handle.await.unwrap();
    assert_eq!(result.state, ExecutionState::Failed);
    assert_eq!(result.error.as_deref(), Some("Execution cancelled"));

    // Already finished: no-op.
    assert!(!engine.cancel(&execution_id));
}

#[tokio::test]
async fn cancel_unknown_id_is_a_noop() {
    let engine = ExecutionEngine::new();
    assert!(!engine.cancel("ghost-0"));
}

// Concurrent executor

#[tokio::test]
async fn execute_many_runs_every_agent() {
    let executor = ConcurrentExecutor::new(2);
    let agents: Vec<Agent> = (0..5).map(|i| dev_agent(&format!("agent-{i}"))).collect();

    let results = executor
        .execute_many(&agents, "echo done", &ExecOptions::default())
        .await;

    assert_eq!(results.len(), 5);
    assert!(results.iter().all(|r| r.state == ExecutionState::Completed));
    assert!(executor.running_agents().is_empty());
}

#[tokio::test]
async fn in_flight_set_never_exceeds_the_bound() {
    let executor = Arc::new(ConcurrentExecutor::new(2));
    let agents: Vec<Agent> = (0..6).map(|i| dev_agent(&format!("agent-{i}"))).collect();

    let handle = {
        let executor = Arc::clone(&executor);
        tokio::spawn(async move {
            executor
                .execute_many(&agents, "sleep 0.3", &ExecOptions::default())
                .await
        })
    };

    let mut max_observed = 0;
    while !handle.is_finished() {
        max_observed = max_observed.max(executor.running_agents().len());
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    let results = handle.await.unwrap();
    assert_eq!(results.len(), 6);
    assert!(max_observed <= 2, "observed {max_observed} concurrent agents");
}

#[tokio::test]
async fn failures_do_not_stop_the_pool() {
    let executor = ConcurrentExecutor::new(3);
    let agents: Vec<Agent> = (0..4).map(|i| dev_agent(&format!("agent-{i}"))).collect();

    let results = executor
        .execute_many(&agents, "exit 2", &ExecOptions::default())
        .await;

    assert_eq!(results.len(), 4);
    assert!(results.iter().all(|r| r.state == ExecutionState::Failed));
    assert!(executor.running_agents().is_empty());
}

#[tokio::test]
async fn is_running_reflects_settled_executions() {
    let executor = ConcurrentExecutor::new(1);
    let agents = vec![dev_agent("solo")];
    executor
        .execute_many(&agents, "true", &ExecOptions::default())
        .await;
    assert!(!executor.is_running("solo"));
}

#[test]
fn set_max_concurrent_clamps_to_one() {
    let mut executor = ConcurrentExecutor::default();
    assert_eq!(executor.max_concurrent(), 4);

    executor.set_max_concurrent(0);
    assert_eq!(executor.max_concurrent(), 1);

    executor.set_max_concurrent(8);
    assert_eq!(executor.max_concurrent(), 8);
}

// Context isolation

#[test]
fn create_context_builds_scratch_dir_and_env() {
    let base = TempDir::new().unwrap();
    let mut isolation = ContextIsolation::new();
    let agent = dev_agent("sandboxed");

    let context = isolation.create_context(&agent, base.path()).unwrap();

    assert!(context.temp_dir.is_dir());
    assert_eq!(context.cwd, base.path());
    assert_eq!(context.env[ENV_AGENT_NAME], "sandboxed");
    assert_eq!(
        context.env[ENV_SCOPE_TEMP],
        context.temp_dir.to_string_lossy()
    );
    assert_eq!(context.env[ENV_SCOPE_BASE], base.path().to_string_lossy());

    isolation.cleanup("sandboxed");
    assert!(!context.temp_dir.exists());
    assert!(isolation.temp_dir("sandboxed").is_none());
}

#[test]
fn second_context_orphans_the_first() {
    let base = TempDir::new().unwrap();
    let mut isolation = ContextIsolation::new();
    let agent = dev_agent("repeat");

    let first = isolation.create_context(&agent, base.path()).unwrap();
    let second = isolation.create_context(&agent, base.path()).unwrap();

    assert_ne!(first.temp_dir, second.temp_dir);
    // The first dir is orphaned, not removed.
    assert!(first.temp_dir.is_dir());
    assert_eq!(isolation.temp_dir("repeat"), Some(second.temp_dir.as_path()));

    isolation.cleanup_all();
    assert!(!second.temp_dir.exists());
    assert!(first.temp_dir.is_dir());

    // Leave nothing behind.
    std::fs::remove_dir_all(&first.temp_dir).unwrap();
}

#[test]
fn cleanup_unknown_agent_is_a_noop() {
    let mut isolation = ContextIsolation::new();
    isolation.cleanup("nobody");
}

#[test]
fn is_read_only_reflects_scope() {
    let isolation = ContextIsolation::new();
    let writable = dev_agent("writer");
    let reader = Agent::new(
        "reader",
        Role::Reviewer,
        Scope::read_only(vec!["**".to_string()]),
    );

    assert!(!isolation.is_read_only(&writable));
    assert!(isolation.is_read_only(&reader));
}

#[tokio::test]
async fn executing_inside_a_context_sees_its_variables() {
    let base = TempDir::new().unwrap();
    let mut isolation = ContextIsolation::new();
    let agent = dev_agent("probe");
    let context = isolation.create_context(&agent, base.path()).unwrap();

    let engine = ExecutionEngine::new();
    let result = engine
        .execute(
            &agent,
            "printf '%s' \"$AGENT_NAME\"",
            &ExecOptions::for_context(&context),
        )
        .await;

    assert_eq!(result.state, ExecutionState::Completed);
    assert_eq!(result.stdout, "probe");

    isolation.cleanup_all();
}
