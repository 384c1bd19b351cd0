//! Single-command execution: spawn, supervise, time out, cancel.

use super::{ExecOptions, ExecutionEvent, ExecutionResult, ExecutionState, OutputStream};
use crate::agent::Agent;
use chrono::Utc;
use std::collections::HashMap;
use std::process::Stdio;
use std::sync::Mutex;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::debug;

const EVENT_CHANNEL_CAPACITY: usize = 256;
const READ_BUF_SIZE: usize = 4096;

/// Spawns and supervises external commands on behalf of agents.
///
/// Each instance owns its results map and in-flight set; independent
/// instances share nothing. Many executions may be in flight at once, keyed
/// by an internally generated execution id (agent name plus millisecond
/// timestamp).
pub struct ExecutionEngine {
    events: broadcast::Sender<ExecutionEvent>,
    results: Mutex<HashMap<String, ExecutionResult>>,
    active: Mutex<HashMap<String, CancellationToken>>,
}

impl Default for ExecutionEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ExecutionEngine {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            events,
            results: Mutex::new(HashMap::new()),
            active: Mutex::new(HashMap::new()),
        }
    }

    /// Subscribe to execution lifecycle events. Only events published after
    /// the call are received.
    pub fn subscribe(&self) -> broadcast::Receiver<ExecutionEvent> {
        self.events.subscribe()
    }

    /// Run `command` through `sh -c` for the given agent.
    ///
    /// Never returns an error: spawn failures, non-zero exits, timeouts,
    /// and cancellations all land in the returned result. `end_time` is set
    /// on every path before this future resolves.
    pub async fn execute(
        &self,
        agent: &Agent,
        command: &str,
        options: &ExecOptions,
    ) -> ExecutionResult {
        let execution_id = format!("{}-{}", agent.name, Utc::now().timestamp_millis());
        let mut result = ExecutionResult::pending(&execution_id, &agent.name);

        // Registered before the start event goes out so a subscriber
        // reacting to it can always cancel.
        let token = CancellationToken::new();
        self.active
            .lock()
            .expect("active map poisoned")
            .insert(execution_id.clone(), token.clone());

        result.state = ExecutionState::Running;
        self.emit(ExecutionEvent::Start {
            execution_id: execution_id.clone(),
            agent_name: agent.name.clone(),
        });
        debug!(agent = %agent.name, %command, "spawning command");

        let mut cmd = Command::new("sh");
        cmd.arg("-c")
            .arg(command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(cwd) = &options.cwd {
            cmd.current_dir(cwd);
        }
        for (key, value) in &options.env {
            cmd.env(key, value);
        }

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                result.state = ExecutionState::Failed;
                result.error = Some(format!("failed to spawn command: {e}"));
                result.end_time = Some(Utc::now());
                self.emit(ExecutionEvent::Error {
                    execution_id: execution_id.clone(),
                    agent_name: agent.name.clone(),
                    message: e.to_string(),
                });
                self.active
                    .lock()
                    .expect("active map poisoned")
                    .remove(&execution_id);
                self.finish(result.clone());
                return result;
            }
        };

        let (chunk_tx, mut chunks) = mpsc::unbounded_channel();
        if let Some(stdout) = child.stdout.take() {
            tokio::spawn(pump_output(stdout, OutputStream::Stdout, chunk_tx.clone()));
        }
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(pump_output(stderr, OutputStream::Stderr, chunk_tx.clone()));
        }
        drop(chunk_tx);

        let deadline = options.timeout.map(|t| tokio::time::Instant::now() + t);
        let mut timed_out = false;
        let mut cancelled = false;
        let mut streams_done = false;
        let mut wait_result = None;

        // Supervise until the process exits, the timeout fires, or the
        // execution is cancelled.
        loop {
            tokio::select! {
                chunk = chunks.recv(), if !streams_done => match chunk {
                    Some((stream, text)) => {
                        self.append_output(&mut result, &execution_id, &agent.name, stream, text);
                    }
                    None => streams_done = true,
                },
                status = child.wait() => {
                    wait_result = Some(status);
                    break;
                }
                _ = sleep_until(deadline), if deadline.is_some() => {
                    timed_out = true;
                    break;
                }
                _ = token.cancelled() => {
                    cancelled = true;
                    break;
                }
            }
        }

        // Interrupted: send the termination signal, then wait out the exit.
        if wait_result.is_none() {
            let _ = child.start_kill();
            if timed_out {
                self.emit(ExecutionEvent::Timeout {
                    execution_id: execution_id.clone(),
                    agent_name: agent.name.clone(),
                });
            }
            loop {
                tokio::select! {
                    chunk = chunks.recv(), if !streams_done => match chunk {
                        Some((stream, text)) => {
                            self.append_output(&mut result, &execution_id, &agent.name, stream, text);
                        }
                        None => streams_done = true,
                    },
                    status = child.wait() => {
                        wait_result = Some(status);
                        break;
                    }
                }
            }
        }

        let wait_result = wait_result.expect("wait result recorded on every path");

        // Drain whatever the pipes delivered after the process exited.
        while let Some((stream, text)) = chunks.recv().await {
            self.append_output(&mut result, &execution_id, &agent.name, stream, text);
        }

        result.end_time = Some(Utc::now());
        match wait_result {
            Ok(status) => {
                result.exit_code = status.code();
                if timed_out {
                    result.state = ExecutionState::Failed;
                    result.error = Some(format!(
                        "Execution timeout after {}ms",
                        options.timeout.map(|t| t.as_millis()).unwrap_or_default()
                    ));
                } else if cancelled {
                    result.state = ExecutionState::Failed;
                    result.error = Some("Execution cancelled".to_string());
                } else {
                    match status.code() {
                        Some(0) => result.state = ExecutionState::Completed,
                        Some(code) => {
                            result.state = ExecutionState::Failed;
                            result.error = Some(format!("Process exited with code {code}"));
                        }
                        None => {
                            result.state = ExecutionState::Failed;
                            result.error = Some("Process terminated by signal".to_string());
                        }
                    }
                }
            }
            Err(e) => {
                result.state = ExecutionState::Failed;
                result.error = Some(format!("failed to wait for process: {e}"));
            }
        }

        self.emit(ExecutionEvent::End {
            execution_id: execution_id.clone(),
            agent_name: agent.name.clone(),
            exit_code: result.exit_code,
        });
        self.active
            .lock()
            .expect("active map poisoned")
            .remove(&execution_id);
        self.finish(result.clone());

        result
    }

    /// Send a termination signal to a still-tracked execution.
    ///
    /// Returns whether an active execution was found; unknown or already
    /// finished ids are a no-op. The process is not guaranteed to have
    /// exited by the time this returns — only that the signal was sent.
    pub fn cancel(&self, execution_id: &str) -> bool {
        let active = self.active.lock().expect("active map poisoned");
        match active.get(execution_id) {
            Some(token) => {
                token.cancel();
                self.emit(ExecutionEvent::Cancelled {
                    execution_id: execution_id.to_string(),
                });
                true
            }
            None => false,
        }
    }

    pub fn get_result(&self, execution_id: &str) -> Option<ExecutionResult> {
        self.results
            .lock()
            .expect("results map poisoned")
            .get(execution_id)
            .cloned()
    }

    pub fn get_all_results(&self) -> Vec<ExecutionResult> {
        self.results
            .lock()
            .expect("results map poisoned")
            .values()
            .cloned()
            .collect()
    }

    /// Reset the accumulated result set. Results persist only for the
    /// lifetime of the engine instance in any case.
    pub fn clear_results(&self) {
        self.results.lock().expect("results map poisoned").clear();
    }

    fn append_output(
        &self,
        result: &mut ExecutionResult,
        execution_id: &str,
        agent_name: &str,
        stream: OutputStream,
        text: String,
    ) {
        match stream {
            OutputStream::Stdout => result.stdout.push_str(&text),
            OutputStream::Stderr => result.stderr.push_str(&text),
        }
        self.emit(ExecutionEvent::Output {
            execution_id: execution_id.to_string(),
            agent_name: agent_name.to_string(),
            stream,
            chunk: text,
        });
    }

    fn finish(&self, result: ExecutionResult) {
        self.results
            .lock()
            .expect("results map poisoned")
            .insert(result.execution_id.clone(), result);
    }

    fn emit(&self, event: ExecutionEvent) {
        // No subscribers is fine; events are observability only.
        let _ = self.events.send(event);
    }
}

/// Forward raw output chunks from a child pipe, bytes-as-text.
async fn pump_output<R>(
    mut reader: R,
    stream: OutputStream,
    tx: mpsc::UnboundedSender<(OutputStream, String)>,
) where
    R: tokio::io::AsyncRead + Unpin,
{
    let mut buf = [0u8; READ_BUF_SIZE];
    loop {
        match reader.read(&mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                let text = String::from_utf8_lossy(&buf[..n]).into_owned();
                if tx.send((stream, text)).is_err() {
                    break;
                }
            }
        }
    }
}

async fn sleep_until(deadline: Option<tokio::time::Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}
