//! Error types for billscope.
//!
//! Library crates use [`BillscopeError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all billscope operations.
#[derive(Debug, thiserror::Error)]
pub enum BillscopeError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Transport-level failure (connect, TLS, body read).
    #[error("network error: {0}")]
    Network(String),

    /// Non-retryable HTTP status from a remote service.
    #[error("HTTP {status} from {url}")]
    Http { url: String, status: u16 },

    /// The 503 retry budget ran out before the service produced content.
    #[error("exhausted {attempts} attempts for {url}")]
    RetriesExhausted { url: String, attempts: u32 },

    /// XML or JSON parsing error.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Local response or bill cache error.
    #[error("cache error: {0}")]
    Cache(String),

    /// LLM enrichment error (API, transport, or response shape).
    #[error("enrichment error: {0}")]
    Enrichment(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (bad date range, empty input, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// HTML-to-text/Markdown conversion error.
    #[error("conversion error: {0}")]
    Conversion(String),
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, BillscopeError>;

impl BillscopeError {
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
        let err = BillscopeError::config("missing API key");
        assert_eq!(err.to_string(), "config error: missing API key");

        let err = BillscopeError::Http {
            url: "https://api.govinfo.gov/search".into(),
            status: 404,
        };
        assert_eq!(err.to_string(), "HTTP 404 from https://api.govinfo.gov/search");

        let err = BillscopeError::RetriesExhausted {
            url: "https://api.govinfo.gov/packages/x/xml".into(),
            attempts: 3,
        };
        assert!(err.to_string().contains("exhausted 3 attempts"));
    }
}
