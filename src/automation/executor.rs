//! Serialized execution of automation commands.
//!
//! The Things automation interface is not re-entrant, so every command goes
//! through one queue drained by one worker task. Callers enqueue from
//! anywhere and await their own reply; the worker runs commands strictly in
//! enqueue order with exactly one in flight.

use super::{AutomationCommand, ScriptRunner};
use crate::{Error, Result};
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;
use tokio::sync::{mpsc, oneshot};

/// A queued command and the channel its caller is waiting on.
struct Job {
    command: AutomationCommand,
    reply: oneshot::Sender<Result<String>>,
}

/// Handle to the single command worker.
///
/// Clones share the same queue and worker.
#[derive(Clone)]
pub struct CommandExecutor {
    tx: mpsc::UnboundedSender<Job>,
    pending: Arc<AtomicUsize>,
}

impl std::fmt::Debug for CommandExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandExecutor")
            .field("queue_depth", &self.queue_depth())
            .finish()
    }
}

impl CommandExecutor {
    /// Start the worker on the current tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    pub fn new(runner: Arc<dyn ScriptRunner>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let pending = Arc::new(AtomicUsize::new(0));
        tokio::spawn(drain(rx, runner, Arc::clone(&pending)));
        Self { tx, pending }
    }

    /// Convenience constructor taking the runner by value.
    pub fn with_runner<R: ScriptRunner + 'static>(runner: R) -> Self {
        Self::new(Arc::new(runner))
    }

    /// Enqueue a command immediately and return a future for its result.
    ///
    /// The command keeps its place in the queue (and still runs) even if the
    /// returned future is dropped.
    pub fn submit(
        &self,
        command: AutomationCommand,
    ) -> impl Future<Output = Result<String>> + Send + use<> {
        let (reply, reply_rx) = oneshot::channel();
        let label = command.label.clone();

        self.pending.fetch_add(1, Ordering::SeqCst);
        let sent = self.tx.send(Job { command, reply });
        if sent.is_err() {
            self.pending.fetch_sub(1, Ordering::SeqCst);
        } else {
            tracing::debug!(
                command = %label,
                queue_depth = self.queue_depth(),
                "automation command enqueued"
            );
        }

        async move {
            sent.map_err(|_| Error::ExecutorClosed)?;
            reply_rx.await.map_err(|_| Error::ExecutorClosed)?
        }
    }

    /// Run a command and wait for its result.
    pub async fn execute(&self, command: AutomationCommand) -> Result<String> {
        self.submit(command).await
    }

    /// Number of commands enqueued but not yet started.
    pub fn queue_depth(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }
}

/// Worker loop: pop, run to completion, reply, repeat.
async fn drain(
    mut rx: mpsc::UnboundedReceiver<Job>,
    runner: Arc<dyn ScriptRunner>,
    pending: Arc<AtomicUsize>,
) {
    while let Some(Job { command, reply }) = rx.recv().await {
        pending.fetch_sub(1, Ordering::SeqCst);
        let label = command.label.clone();
        let started = Instant::now();

        let worker_runner = Arc::clone(&runner);
        let mut cancelled = false;
        let result = match tokio::task::spawn_blocking(move || worker_runner.run(&command)).await
        {
            Ok(result) => result,
            Err(e) => {
                cancelled = e.is_cancelled();
                Err(join_failure(&label, &e))
            }
        };

        let elapsed_ms = started.elapsed().as_millis() as u64;
        match &result {
            Ok(output) => tracing::debug!(
                command = %label,
                elapsed_ms,
                bytes = output.len(),
                "automation command finished"
            ),
            // Runtime shutdown, not a script failure
            Err(e) if cancelled => tracing::debug!(
                command = %label,
                elapsed_ms,
                error = %e,
                "automation command cancelled"
            ),
            Err(e) => tracing::warn!(
                command = %label,
                elapsed_ms,
                error = %e,
                "automation command failed"
            ),
        }

        // The caller may have stopped waiting; the command still ran.
        let _ = reply.send(result);
    }
    tracing::trace!("command executor drained and closed");
}

/// Map a blocking-task join error onto the command that was running.
fn join_failure(label: &str, e: &tokio::task::JoinError) -> Error {
    if e.is_panic() {
        Error::execution(label, "script runner panicked")
    } else {
        Error::execution(label, "cancelled before completion")
    }
}
