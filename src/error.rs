//! Error types for the resource awaiter
//!
//! Every failure a lifecycle operation can hit is one variant here. Each error
//! is surfaced to the host as exactly one diagnostic (see [`crate::diag`]),
//! so the variants carry the text that ends up in the summary and detail.

use std::time::Duration;

use thiserror::Error;

/// Main error type for awaiter operations
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Invalid resource configuration, rejected before any network activity
    #[error("configuration error for {field}: {message}")]
    Config {
        /// Name of the offending field (e.g. "timeout", "cacert")
        field: String,
        /// Description of what's invalid
        message: String,
    },

    /// Connection, TLS or client construction failure
    #[error("transport error: {message}")]
    Transport {
        /// Description of what failed
        message: String,
    },

    /// Failure response whose body could not be interpreted
    #[error("parse error: {message}")]
    Parse {
        /// Description of what failed
        message: String,
        /// The raw response body
        body: String,
    },

    /// The API server answered with a status other than 200 or 404
    #[error("resource error (HTTP {status}): {message}")]
    Resource {
        /// HTTP status code
        status: u16,
        /// The server-provided "message" field
        message: String,
        /// The full response body
        detail: String,
    },

    /// The resource was still absent when the deadline passed
    #[error("timeout reached: path {path} is still unavailable after {elapsed:?}")]
    Timeout {
        /// URI path that was being awaited
        path: String,
        /// Wall-clock time spent polling
        elapsed: Duration,
    },

    /// The caller cancelled the operation
    #[error("operation cancelled")]
    Cancelled,
}

impl Error {
    /// Create a configuration error for the given field
    pub fn config(field: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Config {
            field: field.into(),
            message: msg.into(),
        }
    }

    /// Create a transport error with the given message
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport {
            message: msg.into(),
        }
    }

    /// Create a parse error for a failure body
    pub fn parse(msg: impl Into<String>, body: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
            body: body.into(),
        }
    }

    /// Short, human-readable summary for the host diagnostic
    pub fn summary(&self) -> String {
        match self {
            Self::Resource { message, .. } => message.clone(),
            Self::Timeout { .. } => "Timeout reached".to_string(),
            other => other.to_string(),
        }
    }

    /// Long-form detail for the host diagnostic (empty when there is none)
    pub fn detail(&self) -> String {
        match self {
            Self::Resource { detail, .. } => detail.clone(),
            Self::Timeout { path, elapsed } => {
                format!("Path {} is still unavailable after {:?}", path, elapsed)
            }
            Self::Parse { body, .. } => body.clone(),
            _ => String::new(),
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Self::transport(e.to_string())
    }
}
