//! Scanner Error Types

use crate::core::error_handling::ContextualError;
use crate::pool::api::PoolError;
use crate::runner::api::RunnerError;

/// Errors that stop a batch before or between phases
///
/// Individual fetch and scan failures never appear here: they are task
/// errors, logged by the pool and counted in the phase summaries.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    /// Invalid configuration detected before any work was submitted
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// A runner could not be resolved or constructed
    #[error(transparent)]
    Runner(#[from] RunnerError),

    /// The shared pool rejected work
    #[error(transparent)]
    Pool(#[from] PoolError),
}

impl ContextualError for ScanError {
    fn is_user_actionable(&self) -> bool {
        match self {
            ScanError::Configuration { .. } => true,
            ScanError::Runner(e) => e.is_user_actionable(),
            ScanError::Pool(_) => false,
        }
    }

    fn user_message(&self) -> Option<&str> {
        match self {
            ScanError::Configuration { message } => Some(message),
            ScanError::Runner(e) => e.user_message(),
            ScanError::Pool(_) => None,
        }
    }
}

pub type ScanResult<T> = Result<T, ScanError>;
