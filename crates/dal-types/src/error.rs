use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid hex string: {0}")]
    InvalidHex(String),

    #[error("invalid byte length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("subject identifier must not be empty")]
    EmptySubject,

    #[error("invalid fingerprint {value:?}: {reason}")]
    InvalidFingerprint { value: String, reason: String },
}
