//! Runner Error Types

use crate::pool::api::PoolError;

/// Errors raised while resolving, building or dispatching a runner
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RunnerError {
    /// No factory registered under this name
    #[error("Unknown runner '{name}' (available: {available})")]
    NotFound { name: String, available: String },

    /// A factory was registered twice
    #[error("Runner '{name}' is already registered")]
    Duplicate { name: String },

    /// Settings or secrets for a runner are unusable
    #[error("Runner '{runner}' is misconfigured: {message}")]
    Configuration { runner: String, message: String },

    /// A service the runner depends on could not be started or reached
    #[error("Runner '{runner}' could not use its service: {message}")]
    Service { runner: String, message: String },

    /// The shared pool stopped admitting work
    #[error(transparent)]
    Pool(#[from] PoolError),
}

impl crate::core::error_handling::ContextualError for RunnerError {
    fn is_user_actionable(&self) -> bool {
        matches!(
            self,
            RunnerError::NotFound { .. } | RunnerError::Configuration { .. }
        )
    }

    fn user_message(&self) -> Option<&str> {
        match self {
            RunnerError::Configuration { message, .. } => Some(message),
            _ => None,
        }
    }
}

pub type RunnerResult<T> = Result<T, RunnerError>;
