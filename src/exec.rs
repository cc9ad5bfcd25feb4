//! Bounded parallel execution with first-error cancellation.
//!
//! A task group runs a set of fallible tasks on exactly-N scoped worker
//! threads. The first real error cancels the group and is reported from
//! the join; a task may instead short-circuit its peers voluntarily
//! ([`Flow::Break`]), which the group reports as a successful trigger, not
//! an error. Groups run against a child of the ambient [`CancelToken`], so
//! internal cancellation never leaks into the caller's token while external
//! cancellation stays visible through the parent chain.

use std::process::Command;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::Duration;

use crate::error::{BuildError, Result};

/// How often a waiting task polls the cancellation signal.
const CANCEL_POLL: Duration = Duration::from_millis(10);

/// Logical CPU count, the parallelism ceiling for compile work.
pub fn cpu_count() -> usize {
    thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
}

/// Parallelism ceiling for stat fan-out. The work is I/O bound, so it runs
/// well past the core count.
pub fn stat_limit() -> usize {
    cpu_count() * 4
}

struct Inner {
    raised: AtomicBool,
    parent: Option<CancelToken>,
}

/// Ambient cancellation signal, cheap to clone and share across threads.
///
/// A child token observes its parent's cancellation but cancelling the
/// child leaves the parent untouched.
#[derive(Clone)]
pub struct CancelToken {
    inner: Arc<Inner>,
}

impl CancelToken {
    pub fn new() -> Self {
        CancelToken {
            inner: Arc::new(Inner {
                raised: AtomicBool::new(false),
                parent: None,
            }),
        }
    }

    /// Derive a token that is cancelled when either it or any ancestor is.
    pub fn child(&self) -> Self {
        CancelToken {
            inner: Arc::new(Inner {
                raised: AtomicBool::new(false),
                parent: Some(self.clone()),
            }),
        }
    }

    pub fn cancel(&self) {
        self.inner.raised.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        if self.inner.raised.load(Ordering::SeqCst) {
            return true;
        }
        match &self.inner.parent {
            Some(parent) => parent.is_cancelled(),
            None => false,
        }
    }

    /// Cooperative checkpoint: error out if the signal is raised.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(BuildError::Cancelled)
        } else {
            Ok(())
        }
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

/// What a task tells the group after finishing successfully.
pub enum Flow {
    /// Nothing to report, keep going.
    Continue,
    /// Short-circuit: the task found what the group was looking for. Peers
    /// are cancelled and the group reports `trigger = true`.
    Break,
}

/// Run `tasks` with at most `limit` in flight, waiting for all of them.
///
/// Returns `Ok(true)` if any task broke out of the group, `Ok(false)` if
/// every task ran to completion, the first non-cancellation error
/// otherwise. Tasks observing cancellation and returning
/// [`BuildError::Cancelled`] are a consequence of the group winding down,
/// never recorded as its cause. No task starts after the group is
/// cancelled.
pub fn run_group<F>(limit: usize, token: &CancelToken, tasks: Vec<F>) -> Result<bool>
where
    F: FnOnce(&CancelToken) -> Result<Flow> + Send,
{
    if tasks.is_empty() {
        return Ok(false);
    }

    let group = token.child();
    let workers = limit.max(1).min(tasks.len());

    let (tx, rx) = mpsc::channel();
    for task in tasks {
        // The receiver lives until the scope ends, so send cannot fail.
        let _ = tx.send(task);
    }
    drop(tx);
    let queue = Mutex::new(rx);

    let triggered = AtomicBool::new(false);
    let first_error: Mutex<Option<BuildError>> = Mutex::new(None);

    thread::scope(|s| {
        for _ in 0..workers {
            s.spawn(|| loop {
                let task = match queue.lock().unwrap().recv() {
                    Ok(task) => task,
                    Err(_) => break,
                };
                if group.is_cancelled() {
                    break;
                }
                match task(&group) {
                    Ok(Flow::Continue) => {}
                    Ok(Flow::Break) => {
                        triggered.store(true, Ordering::SeqCst);
                        group.cancel();
                    }
                    Err(BuildError::Cancelled) => {}
                    Err(err) => {
                        let mut slot = first_error.lock().unwrap();
                        if slot.is_none() {
                            *slot = Some(err);
                        }
                        drop(slot);
                        group.cancel();
                    }
                }
            });
        }
    });

    if let Some(err) = first_error.into_inner().unwrap() {
        return Err(err);
    }
    if triggered.load(Ordering::SeqCst) {
        return Ok(true);
    }
    // The group itself only cancels on error or trigger; anything else
    // came from outside.
    token.check()?;
    Ok(false)
}

/// Why a child process run did not succeed.
pub enum RunError {
    /// The ambient signal was raised; the child was killed if running.
    Cancelled,
    /// Spawn failure or non-zero exit, with a printable cause.
    Failed(String),
}

/// Spawn a tool with inherited stdio and wait for it, killing it promptly
/// if the cancellation signal is raised mid-run.
pub fn run_checked(command: &mut Command, token: &CancelToken) -> std::result::Result<(), RunError> {
    if token.is_cancelled() {
        return Err(RunError::Cancelled);
    }

    let mut child = command.spawn().map_err(|err| RunError::Failed(err.to_string()))?;
    loop {
        match child.try_wait() {
            Ok(Some(status)) if status.success() => return Ok(()),
            Ok(Some(status)) => return Err(RunError::Failed(status.to_string())),
            Ok(None) => {
                if token.is_cancelled() {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(RunError::Cancelled);
                }
                thread::sleep(CANCEL_POLL);
            }
            Err(err) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(RunError::Failed(err.to_string()));
            }
        }
    }
}
