//! Error types for leadpipe.
//!
//! Library crates use [`LeadPipeError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all leadpipe operations.
#[derive(Debug, thiserror::Error)]
pub enum LeadPipeError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// A request URL could not be constructed.
    #[error("invalid URL {url:?}: {source}")]
    InvalidUrl {
        url: String,
        source: url::ParseError,
    },

    /// The request never produced a response (DNS, connect, TLS, timeout).
    #[error("failed to send request to {url}: {source}")]
    Transport { url: String, source: reqwest::Error },

    /// The service answered outside the 2xx range. The body is discarded.
    #[error("request to {url} failed with status code {status}")]
    Status { url: String, status: u16 },

    /// The response body could not be read.
    #[error("failed to read response body from {url}: {source}")]
    Body { url: String, source: reqwest::Error },

    /// A request body could not be serialized.
    #[error("failed to encode {what}: {source}")]
    Encode {
        what: &'static str,
        source: serde_json::Error,
    },

    /// A response body did not match the expected shape.
    #[error("failed to decode {what}: {source}")]
    Decode {
        what: &'static str,
        source: serde_json::Error,
    },

    /// An opaque scratch blob stored on a record could not be decoded.
    #[error("scratch payload error: {message}")]
    Scratch { message: String },

    /// A single record could not be enriched.
    #[error("enrichment error: {message}")]
    Enrichment { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Any of the above, annotated with the operation that failed.
    #[error("failed to {operation}: {source}")]
    Context {
        operation: String,
        source: Box<LeadPipeError>,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, LeadPipeError>;

impl LeadPipeError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a per-record enrichment error.
    pub fn enrichment(msg: impl Into<String>) -> Self {
        Self::Enrichment {
            message: msg.into(),
        }
    }

    /// Create a scratch payload error.
    pub fn scratch(msg: impl Into<String>) -> Self {
        Self::Scratch {
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

    /// Annotate an error with the operation that produced it.
    pub fn context(operation: impl Into<String>, source: LeadPipeError) -> Self {
        Self::Context {
            operation: operation.into(),
            source: Box::new(source),
        }
    }

    /// The innermost error, skipping any [`LeadPipeError::Context`] layers.
    pub fn root(&self) -> &LeadPipeError {
        match self {
            Self::Context { source, .. } => source.root(),
            other => other,
        }
    }

    /// HTTP status code, if this error (or the one it wraps) is a status failure.
    pub fn status(&self) -> Option<u16> {
        match self.root() {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = LeadPipeError::config("AIRTABLE_KEY is required");
        assert_eq!(err.to_string(), "config error: AIRTABLE_KEY is required");

        let err = LeadPipeError::Status {
            url: "https://api.airtable.com/v0/app/tbl".into(),
            status: 422,
        };
        assert!(err.to_string().contains("status code 422"));
    }

    #[test]
    fn context_preserves_source() {
        let inner = LeadPipeError::Status {
            url: "https://example.com".into(),
            status: 503,
        };
        let err = LeadPipeError::context("list records", inner);

        assert!(err.to_string().starts_with("failed to list records"));
        assert_eq!(err.status(), Some(503));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn root_unwraps_nested_context() {
        let err = LeadPipeError::context(
            "update records",
            LeadPipeError::context("send chunk", LeadPipeError::enrichment("boom")),
        );
        assert!(matches!(err.root(), LeadPipeError::Enrichment { .. }));
        assert_eq!(err.status(), None);
    }
}
