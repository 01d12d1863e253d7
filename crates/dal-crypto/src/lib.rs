//! Cryptographic primitives for the Document Anchor Ledger.
//!
//! Provides domain-separated BLAKE3 hashing and Ed25519 signing/verification
//! of ledger transactions.
//!
//! All primitives come from `blake3` and `ed25519-dalek`.

pub mod hasher;
pub mod signer;

pub use hasher::{ContentHasher, HasherError};
pub use signer::{Signature, SignatureError, SigningKey, VerifyingKey};
