//! Report Error Types

/// Errors from parsing result files and producing reports
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReportError {
    /// Filesystem or network read/write failed
    #[error("IO error during '{operation}' on {path}: {cause}")]
    Io {
        operation: String,
        path: String,
        cause: String,
    },

    /// A result file is not valid SARIF
    #[error("Failed to parse {path}: {cause}")]
    Parse { path: String, cause: String },

    /// A result file pattern is not a valid glob
    #[error("Invalid result pattern '{pattern}': {cause}")]
    Pattern { pattern: String, cause: String },

    /// The report template failed to compile or render
    #[error("Template error: {cause}")]
    Template { cause: String },
}

impl crate::core::error_handling::ContextualError for ReportError {
    fn is_user_actionable(&self) -> bool {
        matches!(
            self,
            ReportError::Pattern { .. } | ReportError::Template { .. }
        )
    }

    fn user_message(&self) -> Option<&str> {
        None
    }
}

pub type ReportResult<T> = Result<T, ReportError>;
