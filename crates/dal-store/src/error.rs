use std::fmt;

/// Errors from content store operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The payload has zero bytes.
    #[error("payload is empty")]
    EmptyPayload,

    /// The backend could not be reached or did not answer usably.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The backend refused the payload (e.g. size limits).
    #[error("store rejected payload: {0}")]
    Rejected(String),

    /// The store client is misconfigured.
    #[error("store configuration error: {0}")]
    Config(String),
}

impl StoreError {
    /// The coarse error kind reported to callers.
    pub fn kind(&self) -> StoreErrorKind {
        match self {
            Self::EmptyPayload => StoreErrorKind::EmptyPayload,
            Self::Unavailable(_) | Self::Config(_) => StoreErrorKind::StoreUnavailable,
            Self::Rejected(_) => StoreErrorKind::StoreRejected,
        }
    }
}

/// Store-layer error kinds. All are retryable by the caller after backoff.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StoreErrorKind {
    StoreUnavailable,
    StoreRejected,
    EmptyPayload,
}

impl fmt::Display for StoreErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StoreUnavailable => write!(f, "StoreUnavailable"),
            Self::StoreRejected => write!(f, "StoreRejected"),
            Self::EmptyPayload => write!(f, "EmptyPayload"),
        }
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
