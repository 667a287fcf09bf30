//! Task definitions and join accounting

use crate::pool::error::TaskResult;
use futures::future::BoxFuture;
use std::future::Future;
use std::time::Duration;

/// Identifier assigned by the pool at submission, in submission order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(pub(crate) u64);

impl TaskId {
    pub fn value(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "task-{}", self.0)
    }
}

/// A deferred invocation: the work future (with its captured arguments),
/// a label for logging and an optional deadline
pub struct Task {
    pub(crate) label: String,
    pub(crate) timeout: Option<Duration>,
    pub(crate) work: BoxFuture<'static, TaskResult<()>>,
}

impl Task {
    pub fn new<F>(label: impl Into<String>, work: F) -> Self
    where
        F: Future<Output = TaskResult<()>> + Send + 'static,
    {
        Self {
            label: label.into(),
            timeout: None,
            work: Box::pin(work),
        }
    }

    /// Deadline for this task, overriding the pool default
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

impl std::fmt::Debug for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Task")
            .field("label", &self.label)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// Terminal state of a task
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskStatus {
    Completed,
    Failed(String),
    TimedOut,
    Cancelled,
    Panicked(String),
}

impl TaskStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, TaskStatus::Completed)
    }
}

impl From<TaskResult<()>> for TaskStatus {
    fn from(result: TaskResult<()>) -> Self {
        match result {
            Ok(()) => TaskStatus::Completed,
            Err(e) => TaskStatus::Failed(e.to_string()),
        }
    }
}

/// Counts of terminal states observed by one `join_all`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JoinSummary {
    pub completed: usize,
    pub failed: usize,
    pub timed_out: usize,
    pub cancelled: usize,
    pub panicked: usize,
}

impl JoinSummary {
    pub fn record(&mut self, status: &TaskStatus) {
        match status {
            TaskStatus::Completed => self.completed += 1,
            TaskStatus::Failed(_) => self.failed += 1,
            TaskStatus::TimedOut => self.timed_out += 1,
            TaskStatus::Cancelled => self.cancelled += 1,
            TaskStatus::Panicked(_) => self.panicked += 1,
        }
    }

    pub fn merge(&mut self, other: JoinSummary) {
        self.completed += other.completed;
        self.failed += other.failed;
        self.timed_out += other.timed_out;
        self.cancelled += other.cancelled;
        self.panicked += other.panicked;
    }

    pub fn total(&self) -> usize {
        self.completed + self.failures()
    }

    /// Everything that did not complete normally
    pub fn failures(&self) -> usize {
        self.failed + self.timed_out + self.cancelled + self.panicked
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

impl std::fmt::Display for JoinSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} tasks: {} completed, {} failed, {} timed out, {} cancelled",
            self.total(),
            self.completed,
            self.failed + self.panicked,
            self.timed_out,
            self.cancelled
        )
    }
}
