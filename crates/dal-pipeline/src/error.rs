use std::fmt;

use dal_ledger::{LedgerError, LedgerErrorKind};
use dal_store::{StoreError, StoreErrorKind};
use dal_types::{Fingerprint, SubjectId};
use serde::{Deserialize, Serialize};

use crate::state::Stage;

/// Every way a submission can fail, as reported to callers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    InvalidInput,
    StoreUnavailable,
    StoreRejected,
    EmptyPayload,
    NetworkMismatch,
    IdentityUnavailable,
    InvalidArtifact,
    TransactionRejected,
    TransactionTimeout,
    SubmissionInProgress,
    Cancelled,
}

impl ErrorKind {
    /// Whether resubmitting later can succeed without reconfiguration.
    ///
    /// `TransactionTimeout` is retryable, but the timed-out transaction may
    /// still be mined, so a retry can produce a second anchor record.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::StoreUnavailable
            | Self::StoreRejected
            | Self::EmptyPayload
            | Self::TransactionTimeout
            | Self::SubmissionInProgress
            | Self::Cancelled => true,
            Self::InvalidInput
            | Self::NetworkMismatch
            | Self::IdentityUnavailable
            | Self::InvalidArtifact
            | Self::TransactionRejected => false,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidInput => "InvalidInput",
            Self::StoreUnavailable => "StoreUnavailable",
            Self::StoreRejected => "StoreRejected",
            Self::EmptyPayload => "EmptyPayload",
            Self::NetworkMismatch => "NetworkMismatch",
            Self::IdentityUnavailable => "IdentityUnavailable",
            Self::InvalidArtifact => "InvalidArtifact",
            Self::TransactionRejected => "TransactionRejected",
            Self::TransactionTimeout => "TransactionTimeout",
            Self::SubmissionInProgress => "SubmissionInProgress",
            Self::Cancelled => "Cancelled",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<StoreErrorKind> for ErrorKind {
    fn from(kind: StoreErrorKind) -> Self {
        match kind {
            StoreErrorKind::StoreUnavailable => Self::StoreUnavailable,
            StoreErrorKind::StoreRejected => Self::StoreRejected,
            StoreErrorKind::EmptyPayload => Self::EmptyPayload,
        }
    }
}

impl From<LedgerErrorKind> for ErrorKind {
    fn from(kind: LedgerErrorKind) -> Self {
        match kind {
            LedgerErrorKind::NetworkMismatch => Self::NetworkMismatch,
            LedgerErrorKind::IdentityUnavailable => Self::IdentityUnavailable,
            LedgerErrorKind::InvalidArtifact => Self::InvalidArtifact,
            LedgerErrorKind::TransactionRejected => Self::TransactionRejected,
            LedgerErrorKind::TransactionTimeout => Self::TransactionTimeout,
        }
    }
}

/// Errors returned by [`crate::IngestionPipeline::submit`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PipelineError {
    /// Validation failed; nothing was stored.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Another submission for the same subject is in flight.
    #[error("a submission for {subject} is already in progress")]
    SubmissionInProgress { subject: SubjectId },

    /// The content store failed; nothing was anchored.
    #[error(transparent)]
    Store(StoreError),

    /// The ledger failed after the bytes were stored.
    #[error("{source} (document stored as {fingerprint})")]
    Anchor {
        source: LedgerError,
        fingerprint: Fingerprint,
    },

    /// The caller's deadline passed or the caller cancelled.
    #[error("cancelled during {stage}: {reason}")]
    Cancelled {
        stage: Stage,
        reason: String,
        fingerprint: Option<Fingerprint>,
    },
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::SubmissionInProgress { .. } => ErrorKind::SubmissionInProgress,
            Self::Store(e) => e.kind().into(),
            Self::Anchor { source, .. } => source.kind().into(),
            Self::Cancelled { .. } => ErrorKind::Cancelled,
        }
    }

    /// The fingerprint of bytes that were stored before the failure.
    ///
    /// `Some` means partial completion: the document is retrievable but no
    /// anchor record was confirmed within this submission.
    pub fn stored_fingerprint(&self) -> Option<&Fingerprint> {
        match self {
            Self::Anchor { fingerprint, .. } => Some(fingerprint),
            Self::Cancelled { fingerprint, .. } => fingerprint.as_ref(),
            _ => None,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.kind().is_retryable()
    }
}

/// Result alias for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;
