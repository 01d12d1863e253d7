use std::fmt;

use dal_types::{NetworkId, TxHash};

/// Errors produced by ledger session operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("contract not deployed on network {network}")]
    NetworkMismatch { network: NetworkId },

    #[error("no signer identity available: {0}")]
    IdentityUnavailable(String),

    #[error("invalid contract artifact: {0}")]
    InvalidArtifact(String),

    #[error("transaction rejected: {0}")]
    TransactionRejected(String),

    /// The account's nonce moved on since it was read.
    #[error("transaction rejected: nonce {got} does not match expected {expected}")]
    NonceMismatch { expected: u64, got: u64 },

    #[error("transaction {tx_hash} not confirmed within {waited_ms} ms")]
    TransactionTimeout { tx_hash: TxHash, waited_ms: u64 },
}

impl LedgerError {
    pub fn kind(&self) -> LedgerErrorKind {
        match self {
            Self::NetworkMismatch { .. } => LedgerErrorKind::NetworkMismatch,
            Self::IdentityUnavailable(_) => LedgerErrorKind::IdentityUnavailable,
            Self::InvalidArtifact(_) => LedgerErrorKind::InvalidArtifact,
            Self::TransactionRejected(_) | Self::NonceMismatch { .. } => {
                LedgerErrorKind::TransactionRejected
            }
            Self::TransactionTimeout { .. } => LedgerErrorKind::TransactionTimeout,
        }
    }

    /// Whether this error came from session construction rather than a
    /// transaction. Such errors persist until the node is reconfigured.
    pub fn is_session_setup(&self) -> bool {
        matches!(
            self,
            Self::NetworkMismatch { .. } | Self::IdentityUnavailable(_) | Self::InvalidArtifact(_)
        )
    }
}

/// Ledger-layer error kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LedgerErrorKind {
    NetworkMismatch,
    IdentityUnavailable,
    InvalidArtifact,
    TransactionRejected,
    TransactionTimeout,
}

impl fmt::Display for LedgerErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NetworkMismatch => "NetworkMismatch",
            Self::IdentityUnavailable => "IdentityUnavailable",
            Self::InvalidArtifact => "InvalidArtifact",
            Self::TransactionRejected => "TransactionRejected",
            Self::TransactionTimeout => "TransactionTimeout",
        };
        f.write_str(name)
    }
}

pub type LedgerResult<T> = Result<T, LedgerError>;
