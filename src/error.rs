// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Error types for krang-xwin
//!
//! Errors carry enough context (origins, field names, selectors) to be shown
//! to the CMS user or logged as a protocol mismatch between two windows.

use thiserror::Error;

/// Result type alias for krang-xwin operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type
#[derive(Error, Debug)]
pub enum Error {
    /// Cross document message from an origin other than the configured CMS
    #[error("Cross document message from unauthorized origin '{origin}' (expected '{expected}')")]
    OriginRejected { origin: String, expected: String },

    /// A JSON segment of an envelope could not be parsed
    #[error("Malformed {field} data: {reason}")]
    MalformedPayload { field: String, reason: String },

    /// Response tag with no registered handler slot
    #[error("Unknown response tag '{0}'")]
    UnknownTag(String),

    /// Operation name not understood by the remote window
    #[error("Unknown operation type '{0}'")]
    UnknownOperation(String),

    /// The counterpart window is gone
    #[error("Window {0} has been closed")]
    WindowClosed(String),

    /// The origin string of a window or target could not be derived
    #[error("Invalid origin '{0}'")]
    InvalidOrigin(String),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// URL parsing failed
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// HTML parsing failed
    #[error("HTML parsing error: {0}")]
    HtmlParse(String),

    /// DOM operation failed
    #[error("DOM error: {0}")]
    Dom(String),

    /// Selector parsing error
    #[error("Invalid selector '{selector}': {reason}")]
    Selector { selector: String, reason: String },

    /// File include with an unknown extension
    #[error("Unsupported file type in load_file(): {0}")]
    UnsupportedFile(String),

    /// Timeout error
    #[error("Operation timed out after {duration_ms}ms: {operation}")]
    Timeout { operation: String, duration_ms: u64 },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an origin rejection
    pub fn origin_rejected(origin: impl Into<String>, expected: impl Into<String>) -> Self {
        Error::OriginRejected {
            origin: origin.into(),
            expected: expected.into(),
        }
    }

    /// Create a malformed payload error for a named envelope field
    pub fn malformed(field: impl Into<String>, reason: impl ToString) -> Self {
        Error::MalformedPayload {
            field: field.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a selector error
    pub fn selector(selector: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::Selector {
            selector: selector.into(),
            reason: reason.into(),
        }
    }

    /// Create a new DOM error
    pub fn dom<S: Into<String>>(msg: S) -> Self {
        Error::Dom(msg.into())
    }

    /// Create a timeout error
    pub fn timeout(operation: impl Into<String>, duration_ms: u64) -> Self {
        Error::Timeout {
            operation: operation.into(),
            duration_ms,
        }
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        Error::Other(msg.into())
    }

    /// Message from a foreign origin; never retried
    pub fn is_security_violation(&self) -> bool {
        matches!(self, Error::OriginRejected { .. })
    }

    /// Shown to the user as a "critical error"
    pub fn is_critical(&self) -> bool {
        matches!(
            self,
            Error::MalformedPayload { .. } | Error::Serialization(_)
        )
    }

    /// The two windows disagree about the protocol
    pub fn is_protocol_mismatch(&self) -> bool {
        matches!(self, Error::UnknownTag(_) | Error::UnknownOperation(_))
    }

    /// Check if this is a timeout error
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout { .. })
    }

    /// Get the offending origin if available
    pub fn origin(&self) -> Option<&str> {
        match self {
            Error::OriginRejected { origin, .. } => Some(origin),
            Error::InvalidOrigin(origin) => Some(origin),
            _ => None,
        }
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Other(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Other(s.to_string())
    }
}

/// Helper trait for adding context to errors
pub trait ErrorContext<T> {
    /// Add operation context to error
    fn context(self, msg: &str) -> Result<T>;
}

impl<T, E: Into<Error>> ErrorContext<T> for std::result::Result<T, E> {
    fn context(self, msg: &str) -> Result<T> {
        self.map_err(|e| {
            let err = e.into();
            match err {
                // Security and payload errors keep their kind so callers can classify them
                Error::OriginRejected { .. } | Error::MalformedPayload { .. } => err,
                other => Error::Other(format!("{}: {}", msg, other)),
            }
        })
    }
}
