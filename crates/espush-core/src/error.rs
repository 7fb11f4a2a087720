//! Shared error type across espush crates.

use thiserror::Error;

/// Coarse error classes (stable API).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Caller contract violation at an instrumentation call site.
    Validation,
    /// Collector registration conflict.
    Registration,
    /// Snapshot, serialization, or push failure during an export cycle.
    Export,
    /// Unreadable or invalid configuration.
    Config,
    /// Internal error.
    Internal,
}

impl ErrorKind {
    /// String representation used in logs and reports.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Validation => "VALIDATION",
            ErrorKind::Registration => "REGISTRATION",
            ErrorKind::Export => "EXPORT",
            ErrorKind::Config => "CONFIG",
            ErrorKind::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, EsPushError>;

/// Unified error type used by core and exporter.
#[derive(Debug, Error)]
pub enum EsPushError {
    #[error("inconsistent label cardinality: expected {expected} label values, got {got}")]
    InconsistentCardinality { expected: usize, got: usize },
    #[error("label name {0:?} missing in label map")]
    MissingLabel(String),
    #[error("label name {0:?} is already curried")]
    AlreadyCurried(String),
    #[error("{0} unknown label(s) found during currying")]
    UnknownLabels(usize),
    #[error("invalid metric: {0}")]
    InvalidMetric(String),
    #[error("collector {0:?} is already registered")]
    AlreadyRegistered(String),
    #[error("snapshot failed: {0}")]
    Snapshot(String),
    #[error("serialization failed: {0}")]
    Serialization(String),
    #[error("push to {destination} failed: {reason}")]
    Sink { destination: String, reason: String },
    #[error("push to {destination} timed out after {timeout_ms}ms")]
    Timeout { destination: String, timeout_ms: u64 },
    #[error("config: {0}")]
    Config(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl EsPushError {
    /// Map an error to its stable class.
    pub fn kind(&self) -> ErrorKind {
        match self {
            EsPushError::InconsistentCardinality { .. }
            | EsPushError::MissingLabel(_)
            | EsPushError::AlreadyCurried(_)
            | EsPushError::UnknownLabels(_)
            | EsPushError::InvalidMetric(_) => ErrorKind::Validation,
            EsPushError::AlreadyRegistered(_) => ErrorKind::Registration,
            EsPushError::Snapshot(_)
            | EsPushError::Serialization(_)
            | EsPushError::Sink { .. }
            | EsPushError::Timeout { .. } => ErrorKind::Export,
            EsPushError::Config(_) => ErrorKind::Config,
            EsPushError::Internal(_) => ErrorKind::Internal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_map_to_validation_kind() {
        let err = EsPushError::AlreadyCurried("job".into());
        assert_eq!(err.kind().as_str(), "VALIDATION");
        assert_eq!(err.to_string(), "label name \"job\" is already curried");
    }

    #[test]
    fn timeout_is_an_export_error() {
        let err = EsPushError::Timeout {
            destination: "http://sink/1".into(),
            timeout_ms: 250,
        };
        assert_eq!(err.kind(), ErrorKind::Export);
        assert_eq!(err.to_string(), "push to http://sink/1 timed out after 250ms");
    }
}
