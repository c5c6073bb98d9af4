//! Error types for linkenrich.
//!
//! Library crates use [`LinkEnrichError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all linkenrich operations.
#[derive(Debug, thiserror::Error)]
pub enum LinkEnrichError {
    /// Configuration loading or validation error (includes missing credentials).
    #[error("config error: {message}")]
    Config { message: String },

    /// Transport failure talking to the store or the model API.
    #[error("network error: {0}")]
    Network(String),

    /// Non-success HTTP reply from an external API.
    #[error("{service} API error (HTTP {status}): {message}")]
    Api {
        service: &'static str,
        status: u16,
        message: String,
    },

    /// Payload could not be decoded.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Store request rejected before it was sent.
    #[error("store error: {0}")]
    Store(String),

    /// Model reply carried no usable classification text.
    #[error("classify error: {0}")]
    Classify(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, LinkEnrichError>;

impl LinkEnrichError {
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

    /// Create an API error for a non-success HTTP status.
    pub fn api(service: &'static str, status: u16, msg: impl Into<String>) -> Self {
        Self::Api {
            service,
            status,
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
