//! Error taxonomy
//!
//! Every transport maps its failures onto the same [`ErrorKind`] set so a
//! caller sees identical errors whether a call went over the API or the CLI.
//! A call only surfaces an [`AggregatedFailure`] once every attempted
//! transport has failed.

use crate::transport::TransportId;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde_json::Value;
use std::fmt;

/// Result alias used across the crate
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Closed set of failure kinds shared by every transport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Unauthorized,
    Forbidden,
    NotFound,
    ValidationFailed,
    RateLimited,
    InternalServerError,
    ServiceUnavailable,
    /// The CLI could not be spawned or the API could not be reached
    TransportUnavailable,
    /// The operation has no call for this transport
    TransportNotImplemented,
    /// Any status or CLI code outside the table above
    Other,
}

impl ErrorKind {
    /// Map an HTTP status code onto the taxonomy
    pub fn from_status(status: u16) -> Self {
        match status {
            401 => Self::Unauthorized,
            403 => Self::Forbidden,
            404 => Self::NotFound,
            422 => Self::ValidationFailed,
            429 => Self::RateLimited,
            500 => Self::InternalServerError,
            503 => Self::ServiceUnavailable,
            _ => Self::Other,
        }
    }

    /// Map a CLI error code onto the taxonomy
    pub fn from_cli_code(code: &str) -> Self {
        match code {
            "unauthorized" => Self::Unauthorized,
            "forbidden" => Self::Forbidden,
            "not_found" => Self::NotFound,
            "validation_error" => Self::ValidationFailed,
            "too_many_requests" => Self::RateLimited,
            "service_unavailable" => Self::ServiceUnavailable,
            _ => Self::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unauthorized => "unauthorized",
            Self::Forbidden => "forbidden",
            Self::NotFound => "not_found",
            Self::ValidationFailed => "validation_failed",
            Self::RateLimited => "rate_limited",
            Self::InternalServerError => "internal_server_error",
            Self::ServiceUnavailable => "service_unavailable",
            Self::TransportUnavailable => "transport_unavailable",
            Self::TransportNotImplemented => "transport_not_implemented",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One transport's failure
#[derive(Debug, Clone, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct TransportError {
    pub kind: ErrorKind,
    pub message: String,
    /// Raw HTTP status or CLI error code, when there was one
    pub code: Option<String>,
    /// When a rate limit resets, if the response said so
    pub reset_at: Option<DateTime<Utc>>,
    /// Decoded error body, if any
    pub body: Option<Value>,
}

impl TransportError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            code: None,
            reset_at: None,
            body: None,
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_reset_at(mut self, reset_at: Option<DateTime<Utc>>) -> Self {
        self.reset_at = reset_at;
        self
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::TransportUnavailable, message)
    }

    pub fn not_implemented(transport: TransportId) -> Self {
        Self::new(
            ErrorKind::TransportNotImplemented,
            format!("operation is not available over {}", transport),
        )
    }

    /// A successful response whose payload did not have the expected shape
    pub fn decode(message: impl fmt::Display) -> Self {
        Self::new(ErrorKind::Other, format!("failed to decode response: {}", message))
    }
}

/// Per-transport failures of a call where every transport failed
#[derive(Debug, Clone, Default)]
pub struct AggregatedFailure {
    errors: IndexMap<TransportId, TransportError>,
}

impl AggregatedFailure {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record(&mut self, transport: TransportId, error: TransportError) {
        self.errors.insert(transport, error);
    }

    /// The failure a specific transport produced, if it was attempted
    pub fn get(&self, transport: TransportId) -> Option<&TransportError> {
        self.errors.get(&transport)
    }

    /// Failures in the order transports were attempted
    pub fn iter(&self) -> impl Iterator<Item = (&TransportId, &TransportError)> {
        self.errors.iter()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// True when every recorded failure has the given kind
    pub fn all(&self, kind: ErrorKind) -> bool {
        !self.errors.is_empty() && self.errors.values().all(|e| e.kind == kind)
    }
}

impl fmt::Display for AggregatedFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "all transports failed")?;
        for (i, (transport, error)) in self.errors.iter().enumerate() {
            let sep = if i == 0 { ": " } else { "; " };
            write!(f, "{}{} ({})", sep, transport, error)?;
        }
        Ok(())
    }
}

impl std::error::Error for AggregatedFailure {}

/// Call-level error
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    #[error("no transports configured")]
    NoTransportsConfigured,

    #[error(transparent)]
    Aggregated(#[from] AggregatedFailure),

    #[error("share reference does not contain a share id")]
    ShareIdUnresolvable,

    #[error("credential could not be resolved: {0}")]
    CredentialUnavailable(String),

    #[error("no revisions found for project {project_id} branch {branch_id}")]
    RevisionResolutionFailed {
        project_id: String,
        branch_id: String,
    },

    #[error("invalid client configuration: {0}")]
    Config(String),
}

impl Error {
    /// The failure of one transport, when this error is an aggregate
    pub fn transport_error(&self, transport: TransportId) -> Option<&TransportError> {
        match self {
            Self::Aggregated(failure) => failure.get(transport),
            _ => None,
        }
    }
}
