//! Generic error handling utilities
//!
//! Provides unified fatal-error reporting across the pool, runner, scanner and
//! report domains while keeping each domain's own error type.

/// Trait for errors that can distinguish between user-actionable and system errors
///
/// Configuration mistakes (an unknown runner, a zero worker count, a missing
/// config file) are user-actionable and carry a message worth printing as-is.
/// IO and process failures are system errors: the user sees the operation
/// context and the detail goes to the debug log.
///
/// When `is_user_actionable()` returns `true`, `user_message()` must return
/// `Some(message)`; otherwise it returns `None`.
pub trait ContextualError: std::error::Error {
    /// Returns true if this error carries a specific message the user can act on
    fn is_user_actionable(&self) -> bool;

    /// Returns the specific user message if this is a user-actionable error
    fn user_message(&self) -> Option<&str>;
}

/// Log errors with appropriate detail level based on error specificity
///
/// # Examples
/// ```rust,no_run
/// # use sastbench::core::error_handling::log_error_with_context;
/// # use sastbench::app::cli::config::ConfigError;
/// let err = ConfigError::Invalid { message: "max-workers must be at least 1".to_string() };
/// log_error_with_context(&err, "Configuration loading");
/// // Logs: "FATAL: max-workers must be at least 1"
/// ```
pub fn log_error_with_context<E: ContextualError + std::fmt::Display + std::fmt::Debug>(
    error: &E,
    operation_context: &str,
) {
    if error.is_user_actionable() {
        if let Some(user_msg) = error.user_message() {
            log::error!("FATAL: {}", user_msg);
        } else {
            log::error!("FATAL: {}", operation_context);
        }
    } else {
        log::error!("FATAL: {}: {}", operation_context, error);
    }
    log::debug!("DEBUG_DETAILS: {:?}", error);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    enum TestError {
        #[error("{0}")]
        User(String),
        #[error("connection refused")]
        System,
    }

    impl ContextualError for TestError {
        fn is_user_actionable(&self) -> bool {
            matches!(self, TestError::User(_))
        }

        fn user_message(&self) -> Option<&str> {
            match self {
                TestError::User(message) => Some(message),
                TestError::System => None,
            }
        }
    }

    #[test]
    fn test_user_actionable_error_exposes_message() {
        let error = TestError::User("unknown runner 'foo'".to_string());
        assert!(error.is_user_actionable());
        assert_eq!(error.user_message(), Some("unknown runner 'foo'"));
        log_error_with_context(&error, "Configuration loading");
    }

    #[test]
    fn test_system_error_has_no_user_message() {
        let error = TestError::System;
        assert!(!error.is_user_actionable());
        assert_eq!(error.user_message(), None);
        log_error_with_context(&error, "Repository fetch");
    }
}
