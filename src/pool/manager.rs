//! WorkerPool - bounded-concurrency task execution
//!
//! Admission is an instance-scoped counting semaphore: `submit` waits for a
//! permit, the spawned task owns the permit and releases it when it reaches a
//! terminal state. No global process count is consulted and nothing polls.
//!
//! Handles are tracked in submission order. `join_all` awaits only handles
//! that no earlier join has taken, so repeated barriers never re-wait work;
//! `prune` drops terminated entries so the tracked set stays bounded across
//! phases.

use crate::pool::error::{PoolError, PoolResult};
use crate::pool::task::{JoinSummary, Task, TaskId, TaskStatus};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::{AbortHandle, JoinHandle};

/// One submitted task as seen by the pool
struct TrackedTask {
    id: TaskId,
    label: String,
    abort: AbortHandle,
    /// Taken by the first `join_all` that awaits it
    handle: Option<JoinHandle<TaskStatus>>,
    /// Set once a join has observed the terminal state
    status: Option<TaskStatus>,
}

impl TrackedTask {
    fn is_terminated(&self) -> bool {
        self.status.is_some() || self.handle.as_ref().is_some_and(|h| h.is_finished())
    }
}

/// Bounded-concurrency executor shared by the orchestrator and all runners
///
/// # Example
///
/// ```rust,no_run
/// use sastbench::pool::api::{Task, WorkerPool};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = WorkerPool::new(4)?;
/// pool.submit(Task::new("say hello", async { Ok(()) })).await?;
/// let summary = pool.join_all().await;
/// assert_eq!(summary.completed, 1);
/// # Ok(())
/// # }
/// ```
pub struct WorkerPool {
    capacity: usize,
    permits: Arc<Semaphore>,
    next_id: AtomicU64,
    default_timeout: Option<Duration>,
    tasks: Mutex<Vec<TrackedTask>>,
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("capacity", &self.capacity)
            .field("running", &self.running())
            .field("tracked", &self.tracked())
            .field("default_timeout", &self.default_timeout)
            .finish()
    }
}

impl WorkerPool {
    /// Create a pool admitting at most `capacity` concurrent tasks
    pub fn new(capacity: usize) -> PoolResult<Self> {
        if capacity == 0 {
            return Err(PoolError::InvalidCapacity { capacity });
        }
        Ok(Self {
            capacity,
            permits: Arc::new(Semaphore::new(capacity)),
            next_id: AtomicU64::new(0),
            default_timeout: None,
            tasks: Mutex::new(Vec::new()),
        })
    }

    /// Deadline applied to tasks that do not carry their own
    pub fn with_default_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.default_timeout = timeout;
        self
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of tasks currently holding an execution slot
    pub fn running(&self) -> usize {
        self.capacity
            .saturating_sub(self.permits.available_permits())
    }

    /// Number of handles currently tracked (live, or terminated but not pruned)
    pub fn tracked(&self) -> usize {
        self.lock_tasks().len()
    }

    /// True once `cancel_all` has closed admission
    pub fn is_closed(&self) -> bool {
        self.permits.is_closed()
    }

    /// Submit a task, waiting until fewer than `capacity` tasks are executing
    ///
    /// Fails only when admission has been closed by `cancel_all`; a task is
    /// never silently dropped.
    pub async fn submit(&self, task: Task) -> PoolResult<TaskId> {
        let Task {
            label,
            timeout,
            work,
        } = task;

        let permit = match self.permits.clone().acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => return Err(PoolError::Closed { label }),
        };

        let id = TaskId(self.next_id.fetch_add(1, Ordering::SeqCst));
        let deadline = timeout.or(self.default_timeout);
        let task_label = label.clone();

        log::debug!("Admitted {} '{}' ({} running)", id, label, self.running());

        let handle = tokio::spawn(async move {
            let _permit = permit;
            let status = match deadline {
                Some(limit) => match tokio::time::timeout(limit, work).await {
                    Ok(result) => TaskStatus::from(result),
                    Err(_) => TaskStatus::TimedOut,
                },
                None => TaskStatus::from(work.await),
            };

            match &status {
                TaskStatus::Completed => log::debug!("{} '{}' completed", id, task_label),
                TaskStatus::Failed(cause) => {
                    log::error!("{} '{}' failed: {}", id, task_label, cause)
                }
                TaskStatus::TimedOut => log::error!(
                    "{} '{}' exceeded its deadline of {:?} and was terminated",
                    id,
                    task_label,
                    deadline.unwrap_or_default()
                ),
                TaskStatus::Cancelled | TaskStatus::Panicked(_) => {}
            }
            status
        });

        self.lock_tasks().push(TrackedTask {
            id,
            label,
            abort: handle.abort_handle(),
            handle: Some(handle),
            status: None,
        });

        Ok(id)
    }

    /// Wait for every tracked task that no previous join has awaited
    ///
    /// Loops until no unjoined handle remains, so tasks submitted while the
    /// join is in progress are covered too. Calling it again with no new
    /// submissions returns immediately with an empty summary.
    pub async fn join_all(&self) -> JoinSummary {
        let mut summary = JoinSummary::default();

        loop {
            let mut pending = PendingJoin {
                pool: self,
                handles: {
                    let mut tasks = self.lock_tasks();
                    tasks
                        .iter_mut()
                        .filter_map(|t| t.handle.take().map(|h| (t.id, t.label.clone(), h)))
                        .collect()
                },
            };

            if pending.handles.is_empty() {
                break;
            }

            while let Some((id, label, handle)) = pending.handles.front_mut() {
                let status = match handle.await {
                    Ok(status) => status,
                    Err(e) if e.is_cancelled() => {
                        log::warn!("{} '{}' was cancelled", id, label);
                        TaskStatus::Cancelled
                    }
                    Err(e) => {
                        log::error!("{} '{}' panicked: {}", id, label, e);
                        TaskStatus::Panicked(e.to_string())
                    }
                };
                let id = *id;
                pending.handles.pop_front();
                summary.record(&status);
                self.record_status(id, status);
            }
        }

        summary
    }

    /// Abort every live task and close admission
    ///
    /// Child processes spawned by task bodies are configured to be killed on
    /// drop, so aborting a task terminates its process. Returns the number of
    /// tasks that were signalled. Pending and future `submit` calls fail with
    /// `PoolError::Closed`.
    pub fn cancel_all(&self) -> usize {
        self.permits.close();

        let tasks = self.lock_tasks();
        let live: Vec<&TrackedTask> = tasks.iter().filter(|t| !t.is_terminated()).collect();
        for task in &live {
            log::debug!("Cancelling {} '{}'", task.id, task.label);
            task.abort.abort();
        }
        if !live.is_empty() {
            log::warn!("Cancelled {} in-flight task(s)", live.len());
        }
        live.len()
    }

    /// Drop terminated handles from the tracked set; live ones stay
    ///
    /// Returns the number of handles removed.
    pub fn prune(&self) -> usize {
        let mut tasks = self.lock_tasks();
        let before = tasks.len();
        tasks.retain(|t| !t.is_terminated());
        let removed = before - tasks.len();
        if removed > 0 {
            log::trace!("Pruned {} terminated task handle(s)", removed);
        }
        removed
    }

    fn record_status(&self, id: TaskId, status: TaskStatus) {
        let mut tasks = self.lock_tasks();
        if let Some(task) = tasks.iter_mut().find(|t| t.id == id) {
            task.status = Some(status);
        }
    }

    fn restore_handle(&self, id: TaskId, handle: JoinHandle<TaskStatus>) {
        let mut tasks = self.lock_tasks();
        if let Some(task) = tasks.iter_mut().find(|t| t.id == id) {
            task.handle = Some(handle);
        }
    }

    fn lock_tasks(&self) -> MutexGuard<'_, Vec<TrackedTask>> {
        // Never held across an await, so poisoning only follows a panic in
        // this module's own bookkeeping; the data is still consistent.
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Handles taken by an in-progress `join_all`
///
/// If the join is dropped before finishing, the handles it has not yet
/// awaited go back to the tracked set so a later join still observes them.
struct PendingJoin<'a> {
    pool: &'a WorkerPool,
    handles: VecDeque<(TaskId, String, JoinHandle<TaskStatus>)>,
}

impl Drop for PendingJoin<'_> {
    fn drop(&mut self) {
        for (id, _, handle) in self.handles.drain(..) {
            self.pool.restore_handle(id, handle);
        }
    }
}
