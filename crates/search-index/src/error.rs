//! Error types for the search-index layer.
//!
//! Errors are organised as a hierarchy: [`IndexError`] is what crosses the
//! crate boundary, and it wraps store, schema, and configuration errors.
//! [`IndexError::kind`] collapses that hierarchy into the handful of outcomes
//! collaborators branch on.

// Error enum variant fields are self-documenting via their #[error(...)] messages
#![allow(missing_docs)]

use std::fmt;

use thiserror::Error;

/// `error.type` reported by the store when an index already exists.
pub const ALREADY_EXISTS_ERROR_TYPE: &str = "resource_already_exists_exception";

/// `error.type` reported by the store when an index is missing.
pub const INDEX_NOT_FOUND_ERROR_TYPE: &str = "index_not_found_exception";

/// The primary error type for all search-index operations.
#[derive(Error, Debug)]
pub enum IndexError {
    /// Errors reported by, or while talking to, the backing store
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Sub-index provisioning and schema version errors
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// Invalid configuration, detected before any store I/O
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The store failed in a way the connection gate cannot recover from.
    #[error("unable to connect to search store at {url}")]
    Connection {
        url: String,
        #[source]
        source: StoreError,
    },

    /// The index has not been started, or has been stopped.
    #[error("search index '{index_name}' is not started")]
    NotStarted { index_name: String },
}

/// Coarse classification of an [`IndexError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The store (or the index) is not available yet.
    Unavailable,
    /// The store rejected the request.
    Rejected,
    /// The stored schema version differs from the expected one.
    VersionMismatch,
    /// The addressed index or document does not exist.
    NotFound,
    /// The layer was configured incorrectly.
    Configuration,
    /// Anything else.
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Unavailable => "unavailable",
            ErrorKind::Rejected => "rejected",
            ErrorKind::VersionMismatch => "version-mismatch",
            ErrorKind::NotFound => "not-found",
            ErrorKind::Configuration => "configuration",
            ErrorKind::Internal => "internal",
        };
        write!(f, "{}", name)
    }
}

impl IndexError {
    /// Returns the coarse kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            IndexError::Store(err) => err.kind(),
            IndexError::Schema(SchemaError::VersionMismatch { .. }) => ErrorKind::VersionMismatch,
            IndexError::Schema(_) => ErrorKind::Internal,
            IndexError::Config(_) => ErrorKind::Configuration,
            IndexError::Connection { source, .. } => match source.kind() {
                ErrorKind::Rejected | ErrorKind::NotFound => ErrorKind::Rejected,
                ErrorKind::Internal => ErrorKind::Internal,
                _ => ErrorKind::Unavailable,
            },
            IndexError::NotStarted { .. } => ErrorKind::Unavailable,
        }
    }
}

/// Errors originating from the backing document store.
#[derive(Error, Debug, Clone)]
pub enum StoreError {
    /// The store could not be reached (connection refused, reset or closed).
    #[error("search store unreachable: {message}")]
    Unreachable { message: String },

    /// The store answered with a non-success status.
    #[error("search store returned status {status}: {reason}")]
    Status {
        status: u16,
        /// The structured `error.type` from the response body, if any.
        error_type: Option<String>,
        reason: String,
    },

    /// Any other transport failure.
    #[error("search store transport error: {message}")]
    Transport { message: String },

    /// A response body could not be decoded.
    #[error("failed to decode search store response: {message}")]
    Decode { message: String },
}

impl StoreError {
    /// Builds a status error from a raw response body.
    ///
    /// Bodies of the form `{"error": {"type": ..., "reason": ...}}` are parsed
    /// into a structured error type; anything else is kept verbatim as the
    /// reason.
    pub fn from_response(status: u16, body: &str) -> Self {
        let parsed: Option<serde_json::Value> = serde_json::from_str(body).ok();
        let error = parsed.as_ref().and_then(|v| v.get("error"));

        let error_type = error
            .and_then(|e| e.get("type"))
            .and_then(|t| t.as_str())
            .map(String::from);

        let reason = error
            .and_then(|e| match e {
                serde_json::Value::String(s) => Some(s.clone()),
                other => other
                    .get("reason")
                    .and_then(|r| r.as_str())
                    .map(String::from),
            })
            .unwrap_or_else(|| body.to_string());

        StoreError::Status {
            status,
            error_type,
            reason,
        }
    }

    /// Returns the HTTP status for status errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            StoreError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns the structured store error type for status errors.
    pub fn error_type(&self) -> Option<&str> {
        match self {
            StoreError::Status { error_type, .. } => error_type.as_deref(),
            _ => None,
        }
    }

    /// Returns `true` if the store reported that the index already exists.
    pub fn is_already_exists(&self) -> bool {
        self.error_type() == Some(ALREADY_EXISTS_ERROR_TYPE)
    }

    /// Returns `true` if the store reported a missing index or document.
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404) || self.error_type() == Some(INDEX_NOT_FOUND_ERROR_TYPE)
    }

    /// Returns `true` if the failed operation may be resent as-is.
    ///
    /// Unreachable stores, request timeouts, throttling and server-side
    /// failures are transient; any other client error is not.
    pub fn is_transient(&self) -> bool {
        match self {
            StoreError::Unreachable { .. } => true,
            StoreError::Status { status, .. } => {
                matches!(status, 408 | 429) || (500..600).contains(status)
            }
            StoreError::Transport { .. } | StoreError::Decode { .. } => false,
        }
    }

    /// Returns the coarse kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::Unreachable { .. } => ErrorKind::Unavailable,
            StoreError::Status { .. } if self.is_not_found() => ErrorKind::NotFound,
            StoreError::Status { status: 503, .. } => ErrorKind::Unavailable,
            StoreError::Status { .. } => ErrorKind::Rejected,
            StoreError::Transport { .. } | StoreError::Decode { .. } => ErrorKind::Internal,
        }
    }
}

/// Errors raised while provisioning sub-indices.
#[derive(Error, Debug)]
pub enum SchemaError {
    /// The stored schema version does not match the one the code expects.
    #[error("search index '{index}' is at version {stored}, but codebase expects {expected}")]
    VersionMismatch {
        index: String,
        stored: u32,
        expected: u32,
    },

    /// The version record exists but cannot be read.
    #[error("invalid version record in search index '{index}': {message}")]
    InvalidVersionRecord { index: String, message: String },

    /// The store did not acknowledge index creation.
    #[error("unable to create search index '{index}': not acknowledged")]
    NotAcknowledged { index: String },

    /// A required schema resource was not found in any root.
    #[error("schema resource '{name}' not found")]
    MissingResource { name: String },

    /// A schema resource could not be read or parsed.
    #[error("invalid schema resource '{name}': {message}")]
    InvalidResource { name: String, message: String },
}

/// Configuration errors, raised at startup before any store I/O.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The startup retry delay must be strictly positive.
    #[error("retry delay on startup was wrongly configured ({value} ms), value has to be greater than 0")]
    InvalidRetryDelay { value: i64 },

    /// The index identifier is blank.
    #[error("search index identifier must be set")]
    BlankIndexIdentifier,

    /// The scheme is not http or https.
    #[error("unsupported search store scheme: {scheme}")]
    UnsupportedScheme { scheme: String },

    /// The port is zero.
    #[error("search store port cannot be 0")]
    InvalidPort,

    /// The maximum result window is zero.
    #[error("maximum result window cannot be 0")]
    InvalidResultWindow,

    /// A configured schema root does not exist.
    #[error("schema root does not exist: {path}")]
    MissingSchemaRoot { path: String },

    /// The store URL could not be built.
    #[error("invalid search store url '{url}': {message}")]
    InvalidUrl { url: String, message: String },
}

/// Result type alias for search-index operations.
pub type IndexResult<T> = Result<T, IndexError>;

/// Result type alias for raw store operations.
pub type StoreResult<T> = Result<T, StoreError>;

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Decode {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_response_parses_structured_error() {
        let body = r#"{"error":{"type":"resource_already_exists_exception","reason":"index [helios_event/abc] already exists"},"status":400}"#;
        let err = StoreError::from_response(400, body);

        assert_eq!(err.status(), Some(400));
        assert_eq!(err.error_type(), Some(ALREADY_EXISTS_ERROR_TYPE));
        assert!(err.is_already_exists());
        assert!(err.to_string().contains("already exists"));
    }

    #[test]
    fn test_from_response_keeps_unstructured_body() {
        let err = StoreError::from_response(502, "Bad Gateway");
        assert_eq!(err.error_type(), None);
        assert_eq!(err.to_string(), "search store returned status 502: Bad Gateway");
    }

    #[test]
    fn test_already_exists_is_not_matched_by_substring() {
        let err = StoreError::Status {
            status: 400,
            error_type: Some("illegal_argument_exception".to_string()),
            reason: "resource_already_exists_exception mentioned in passing".to_string(),
        };
        assert!(!err.is_already_exists());
    }

    #[test]
    fn test_transient_classification() {
        let unreachable = StoreError::Unreachable {
            message: "connection refused".to_string(),
        };
        assert!(unreachable.is_transient());

        for status in [408, 429, 500, 502, 503, 504] {
            assert!(StoreError::from_response(status, "").is_transient());
        }
        for status in [400, 401, 403, 404, 409] {
            assert!(!StoreError::from_response(status, "").is_transient());
        }

        let decode = StoreError::Decode {
            message: "eof".to_string(),
        };
        assert!(!decode.is_transient());
    }

    #[test]
    fn test_error_kinds() {
        let not_found = IndexError::from(StoreError::from_response(
            404,
            r#"{"error":{"type":"index_not_found_exception","reason":"no such index"}}"#,
        ));
        assert_eq!(not_found.kind(), ErrorKind::NotFound);

        let rejected = IndexError::from(StoreError::from_response(401, "unauthorized"));
        assert_eq!(rejected.kind(), ErrorKind::Rejected);

        let mismatch = IndexError::from(SchemaError::VersionMismatch {
            index: "helios_event".to_string(),
            stored: 3,
            expected: 4,
        });
        assert_eq!(mismatch.kind(), ErrorKind::VersionMismatch);
        assert_eq!(
            mismatch.to_string(),
            "search index 'helios_event' is at version 3, but codebase expects 4"
        );

        let config = IndexError::from(ConfigError::InvalidRetryDelay { value: 0 });
        assert_eq!(config.kind(), ErrorKind::Configuration);

        let not_started = IndexError::NotStarted {
            index_name: "Elasticsearch".to_string(),
        };
        assert_eq!(not_started.kind(), ErrorKind::Unavailable);
    }

    #[test]
    fn test_error_kind_display() {
        assert_eq!(ErrorKind::VersionMismatch.to_string(), "version-mismatch");
        assert_eq!(ErrorKind::NotFound.to_string(), "not-found");
    }
}
