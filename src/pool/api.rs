//! Public API for the worker pool
//!
//! External modules should import from here rather than directly from internal modules.

pub use crate::pool::error::{PoolError, PoolResult, TaskError, TaskResult};
pub use crate::pool::manager::WorkerPool;
pub use crate::pool::task::{JoinSummary, Task, TaskId, TaskStatus};
