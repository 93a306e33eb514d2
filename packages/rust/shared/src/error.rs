//! Error types for the harvester.
//!
//! Library crates use [`EntidadesError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all harvester operations.
#[derive(Debug, thiserror::Error)]
pub enum EntidadesError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Browsing-session error (launch, navigation, DOM access).
    #[error("browser error: {0}")]
    Browser(String),

    /// A navigation or ready-state wait exceeded its budget.
    #[error("timed out waiting for {operation}")]
    Timeout { operation: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Tabular output writer error.
    #[error("export error: {0}")]
    Export(String),

    /// Data validation error (bad counts, unparsable URL, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, EntidadesError>;

impl EntidadesError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a browser error from any displayable value.
    pub fn browser(err: impl std::fmt::Display) -> Self {
        Self::Browser(err.to_string())
    }

    /// Create a timeout error naming the operation that ran out of budget.
    pub fn timeout(operation: impl Into<String>) -> Self {
        Self::Timeout {
            operation: operation.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = EntidadesError::config("missing base URL");
        assert_eq!(err.to_string(), "config error: missing base URL");

        let err = EntidadesError::timeout("detail info fragments");
        assert_eq!(err.to_string(), "timed out waiting for detail info fragments");
    }

    #[test]
    fn browser_error_from_display() {
        let err = EntidadesError::browser("connection reset");
        assert!(err.to_string().contains("connection reset"));
    }
}
