use std::any::Any;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};

use crate::agent::{AgentEngine, AgentResult};
use crate::errors::VulnAgentError;

use super::observer::{MessageCategory, Observer};
use super::task::{ScanTask, TaskLifecycle};

pub const DEFAULT_CONCURRENCY: usize = 2;

const CANCELLED: &str = "Task cancelled";

/// Fixed-size worker pool running one reasoning loop per submitted task.
///
/// A scheduler lives for one scan session. Lifecycles of finished tasks stay
/// queryable through [`lifecycle`](Self::lifecycle) until it is dropped, and
/// task ids are never reused within it.
pub struct TaskScheduler {
    inner: Arc<Shared>,
}

struct Shared {
    engine: Arc<AgentEngine>,
    observer: Arc<dyn Observer>,
    permits: Arc<Semaphore>,
    lifecycles: DashMap<u64, TaskLifecycle>,
    running: AtomicUsize,
    cancel: CancellationToken,
    tracker: TaskTracker,
}

/// Resolves to the task's [`AgentResult`].
pub struct TaskHandle {
    id: u64,
    join: JoinHandle<AgentResult>,
}

impl TaskHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    pub async fn result(self) -> AgentResult {
        match self.join.await {
            Ok(result) => result,
            Err(e) => AgentResult::error(format!("Task {} did not complete: {}", self.id, e)),
        }
    }
}

impl TaskScheduler {
    pub fn new(engine: Arc<AgentEngine>, observer: Arc<dyn Observer>, concurrency: usize) -> Self {
        let concurrency = concurrency.max(1);
        info!(concurrency, "Task scheduler started");
        Self {
            inner: Arc::new(Shared {
                engine,
                observer,
                permits: Arc::new(Semaphore::new(concurrency)),
                lifecycles: DashMap::new(),
                running: AtomicUsize::new(0),
                cancel: CancellationToken::new(),
                tracker: TaskTracker::new(),
            }),
        }
    }

    /// Queue a task. Refused once [`shutdown`](Self::shutdown) has begun or
    /// when the id is already known to this scheduler.
    pub fn submit(&self, task: ScanTask) -> Result<TaskHandle, VulnAgentError> {
        let inner = &self.inner;
        if inner.tracker.is_closed() {
            return Err(VulnAgentError::SchedulerClosed(format!("task {} rejected", task.id)));
        }
        let id = task.id;
        match inner.lifecycles.entry(id) {
            Entry::Occupied(_) => {
                return Err(VulnAgentError::InvalidRequest(format!("Duplicate task id {}", id)));
            }
            Entry::Vacant(slot) => {
                slot.insert(TaskLifecycle::Pending);
            }
        }
        inner.observer.on_task_created(id, task.request.method(), task.request.url(), task.scan_type);
        inner.observer.on_status(id, TaskLifecycle::Pending);
        debug!(task_id = id, scan_type = %task.scan_type, "Task queued");

        let shared = Arc::clone(inner);
        let join = inner.tracker.spawn(async move { shared.execute(task).await });
        Ok(TaskHandle { id, join })
    }

    pub fn lifecycle(&self, id: u64) -> Option<TaskLifecycle> {
        self.inner.lifecycles.get(&id).map(|entry| *entry)
    }

    pub fn running_count(&self) -> usize {
        self.inner.running.load(Ordering::SeqCst)
    }

    pub fn is_closed(&self) -> bool {
        self.inner.tracker.is_closed()
    }

    /// Stop admitting tasks and wait for the pool to drain. When `graceful`
    /// is false, queued and in-flight tasks are cancelled first.
    pub async fn shutdown(&self, graceful: bool) {
        let inner = &self.inner;
        inner.tracker.close();
        if !graceful {
            inner.cancel.cancel();
        }
        info!(graceful, pending = inner.tracker.len(), "Task scheduler shutting down");
        inner.tracker.wait().await;
    }
}

impl Shared {
    async fn execute(self: Arc<Self>, task: ScanTask) -> AgentResult {
        let id = task.id;

        let permit = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => None,
            permit = Arc::clone(&self.permits).acquire_owned() => permit.ok(),
        };
        let Some(_permit) = permit else {
            return self.complete(id, AgentResult::error(CANCELLED));
        };

        self.transition(id, TaskLifecycle::Running);
        self.running.fetch_add(1, Ordering::SeqCst);

        // The loop runs on its own task so a panic surfaces as a JoinError
        // here instead of unwinding through the pool.
        let engine = Arc::clone(&self.engine);
        let observer = Arc::clone(&self.observer);
        let run = tokio::spawn(async move { engine.run(&task, observer.as_ref()).await });
        let abort = run.abort_handle();

        let result = tokio::select! {
            joined = run => match joined {
                Ok(result) => result,
                Err(e) if e.is_panic() => {
                    let message = panic_message(e.into_panic());
                    error!(task_id = id, panic = %message, "Reasoning loop panicked");
                    AgentResult::error(format!("Task panicked: {}", message))
                }
                Err(_) => AgentResult::error(CANCELLED),
            },
            _ = self.cancel.cancelled() => {
                abort.abort();
                AgentResult::error(CANCELLED)
            }
        };

        self.running.fetch_sub(1, Ordering::SeqCst);
        self.complete(id, result)
    }

    fn complete(&self, id: u64, result: AgentResult) -> AgentResult {
        let category = if result.is_error() { MessageCategory::Error } else { MessageCategory::Result };
        self.observer.on_message(id, category, &result.summary());
        self.transition(id, result.lifecycle());
        info!(task_id = id, status = %result.lifecycle(), "Task finished");
        result
    }

    fn transition(&self, id: u64, next: TaskLifecycle) {
        let Some(mut current) = self.lifecycles.get_mut(&id) else {
            warn!(task_id = id, "Lifecycle update for unknown task");
            return;
        };
        let from = *current;
        if !from.can_transition_to(next) {
            warn!(task_id = id, from = %from, to = %next, "Ignoring backwards lifecycle transition");
            return;
        }
        *current = next;
        drop(current);
        self.observer.on_status(id, next);
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panic_message_variants() {
        assert_eq!(panic_message(Box::new("boom")), "boom");
        assert_eq!(panic_message(Box::new(String::from("owned"))), "owned");
        assert_eq!(panic_message(Box::new(42u8)), "unknown panic");
    }
}
