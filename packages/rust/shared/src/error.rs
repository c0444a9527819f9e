//! Error types for the training catalog.
//!
//! Library crates use [`TrainingCatalogError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all catalog operations.
#[derive(Debug, thiserror::Error)]
pub enum TrainingCatalogError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Network/HTTP error that survived the retry policy.
    #[error("network error: {0}")]
    Network(String),

    /// Response body, markup or document parsing error.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Catalog or curriculum persistence error.
    #[error("storage error: {0}")]
    Storage(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Malformed input (unknown domain, bad filter, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, TrainingCatalogError>;

impl TrainingCatalogError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
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
        let err = TrainingCatalogError::config("missing engine id");
        assert_eq!(err.to_string(), "config error: missing engine id");

        let err = TrainingCatalogError::validation("unknown domain 'quantum'");
        assert!(err.to_string().contains("unknown domain"));
    }

    #[test]
    fn io_error_carries_path() {
        let err = TrainingCatalogError::io(
            "/tmp/catalog.json",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        let msg = err.to_string();
        assert!(msg.contains("catalog.json"));
        assert!(msg.contains("gone"));
    }
}
