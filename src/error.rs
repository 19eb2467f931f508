// src/error.rs

//! Unified error handling for the watcher.
//!
//! The four cycle-level failures (`Fetch`, `Extract`, `Storage`, `Notify`)
//! are kept distinct so the caller can tell a transient source problem
//! from a snapshot that failed to advance.

use std::fmt;

use thiserror::Error;

/// Result type alias for watcher operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// Source document could not be retrieved (network, timeout, HTTP status)
    #[error("Fetch error for {url}: {message}")]
    Fetch { url: String, message: String },

    /// Retrieved document could not be turned into a mapping
    #[error("Extract error for {context}: {message}")]
    Extract { context: String, message: String },

    /// Snapshot slot could not be read, written, or rotated
    #[error("Storage error at {context}: {message}")]
    Storage { context: String, message: String },

    /// Change notification could not be delivered to a destination
    #[error("Notify error for {destination}: {message}")]
    Notify { destination: String, message: String },

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

impl AppError {
    /// Create a fetch error for a source URL.
    pub fn fetch(url: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Fetch {
            url: url.into(),
            message: message.to_string(),
        }
    }

    /// Create an extract error with context.
    pub fn extract(context: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Extract {
            context: context.into(),
            message: message.to_string(),
        }
    }

    /// Create a storage error with the location that failed.
    pub fn storage(context: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Storage {
            context: context.into(),
            message: message.to_string(),
        }
    }

    /// Create a notify error for a destination label.
    pub fn notify(destination: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Notify {
            destination: destination.into(),
            message: message.to_string(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Short label used in log lines and cycle summaries.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Fetch { .. } | Self::Http(_) => "fetch",
            Self::Extract { .. } => "extract",
            Self::Storage { .. } | Self::Io(_) => "storage",
            Self::Notify { .. } => "notify",
            Self::Toml(_) | Self::Config(_) => "config",
            Self::Validation(_) => "validation",
        }
    }

    /// Whether the next scheduled cycle is expected to recover from this error.
    ///
    /// Storage failures count as transient too, but mean the previous slot
    /// did not advance and the same changes may be reported again.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Fetch { .. }
                | Self::Http(_)
                | Self::Extract { .. }
                | Self::Storage { .. }
                | Self::Io(_)
                | Self::Notify { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_labels() {
        assert_eq!(AppError::fetch("https://x", "timeout").kind(), "fetch");
        assert_eq!(AppError::extract("listing", "bad").kind(), "extract");
        assert_eq!(AppError::storage("prev.html", "denied").kind(), "storage");
        assert_eq!(AppError::notify("discord.com", "429").kind(), "notify");
        assert_eq!(AppError::config("missing").kind(), "config");
    }

    #[test]
    fn test_config_errors_are_not_transient() {
        assert!(AppError::fetch("https://x", "timeout").is_transient());
        assert!(AppError::storage("prev.html", "denied").is_transient());
        assert!(!AppError::config("missing").is_transient());
        assert!(!AppError::validation("empty").is_transient());
    }

    #[test]
    fn test_display_includes_context() {
        let err = AppError::fetch("https://openjdk.org/projects/jdk/", "HTTP 503");
        assert_eq!(
            err.to_string(),
            "Fetch error for https://openjdk.org/projects/jdk/: HTTP 503"
        );
    }
}
