//! Pool and task error types

/// Errors raised by the pool itself
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PoolError {
    /// A pool needs room for at least one task
    #[error("Worker pool capacity must be at least 1 (got {capacity})")]
    InvalidCapacity { capacity: usize },

    /// Admission was closed by `cancel_all`
    #[error("Worker pool is closed; task '{label}' was not admitted")]
    Closed { label: String },
}

impl crate::core::error_handling::ContextualError for PoolError {
    fn is_user_actionable(&self) -> bool {
        false
    }

    fn user_message(&self) -> Option<&str> {
        None
    }
}

pub type PoolResult<T> = Result<T, PoolError>;

/// Failure of an individual task body
///
/// Never propagated out of the pool: the pool logs it and counts it in the
/// `JoinSummary` of the join that observed it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TaskError {
    /// External command ran but reported failure
    #[error("'{program}' exited with {status}{}", stderr_suffix(.stderr))]
    CommandFailed {
        program: String,
        status: String,
        stderr: String,
    },

    /// External command could not be started
    #[error("Failed to launch '{program}': {cause}")]
    Launch { program: String, cause: String },

    /// Filesystem preparation failed
    #[error("IO error during '{operation}' on {path}: {cause}")]
    Io {
        operation: String,
        path: String,
        cause: String,
    },

    /// A request to an external service failed
    #[error("Request to {endpoint} failed: {cause}")]
    Service { endpoint: String, cause: String },

    /// Precondition for the task was not met
    #[error("{message}")]
    Precondition { message: String },
}

fn stderr_suffix(stderr: &str) -> String {
    if stderr.is_empty() {
        String::new()
    } else {
        format!(": {}", stderr)
    }
}

impl crate::core::error_handling::ContextualError for TaskError {
    fn is_user_actionable(&self) -> bool {
        false
    }

    fn user_message(&self) -> Option<&str> {
        None
    }
}

pub type TaskResult<T> = Result<T, TaskError>;
