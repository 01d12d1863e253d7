//! Foundation types for the Document Anchor Ledger (DAL).
//!
//! This crate provides the identity, content, and receipt types shared by the
//! store client, the ledger session, and the ingestion pipeline. Every other
//! DAL crate depends on `dal-types`.
//!
//! # Key Types
//!
//! - [`Fingerprint`]: Content-derived identifier of a stored document
//! - [`SubjectId`]: Ledger slot a fingerprint is anchored against
//! - [`DocumentPayload`]: Raw document bytes plus an optional media type
//! - [`AccountId`]: Address of the identity submitting ledger transactions
//! - [`NetworkId`]: Identifier of the ledger network a session is bound to
//! - [`AnchorReceipt`]: Confirmation of an anchor transaction
//! - [`AnchorRecord`]: The (subject, fingerprint, submitter, receipt) tuple
//! - [`SubmissionId`]: UUID v7 identifier of one ingestion attempt

pub mod error;
pub mod fingerprint;
pub mod identity;
pub mod payload;
pub mod receipt;
pub mod subject;
pub mod submission;

pub use error::TypeError;
pub use fingerprint::Fingerprint;
pub use identity::{AccountId, NetworkId};
pub use payload::DocumentPayload;
pub use receipt::{AnchorReceipt, AnchorRecord, BlockHash, BlockRef, TxHash, TxStatus};
pub use subject::SubjectId;
pub use submission::SubmissionId;
