//! Ledger session for the Document Anchor Ledger (DAL).
//!
//! This crate records `(subject, fingerprint)` pairs on an append-only
//! ledger. It provides:
//! - Contract artifacts and fail-closed per-network binding resolution
//! - `SignerProvider` / `LedgerBackend` trait boundaries
//! - Ed25519-signed anchor transactions with per-account nonces
//! - `LedgerSession`, the authenticated handle exposing `anchor`
//! - `InMemoryLedger`, a hash-chained development ledger for tests and
//!   local runs

pub mod backend;
pub mod block;
pub mod config;
pub mod contract;
pub mod error;
pub mod memory;
pub mod session;
pub mod signer;
pub mod transaction;

pub use backend::LedgerBackend;
pub use block::{verify_blocks, Block, ChainError};
pub use config::LedgerConfig;
pub use contract::{
    development_contract_address, ContractArtifact, ContractBinding, Deployment, ANCHOR_METHOD,
    DEFAULT_CONTRACT_NAME,
};
pub use error::{LedgerError, LedgerErrorKind, LedgerResult};
pub use memory::InMemoryLedger;
pub use session::{LedgerSession, DEFAULT_CONFIRMATION_TIMEOUT};
pub use signer::{LedgerSigner, SignerProvider, StaticSigner};
pub use transaction::{AnchorCall, SignedTransaction, UnsignedTransaction};
