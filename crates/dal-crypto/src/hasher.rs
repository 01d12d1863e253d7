/// Domain-separated BLAKE3 hasher.
///
/// Each hasher carries a domain tag (e.g., `"dal-tx-v1"`, `"dal-block-v1"`)
/// that is prepended to every hash computation. This prevents cross-type hash
/// collisions: a transaction and a block with identical bytes will produce
/// different hashes.
pub struct ContentHasher {
    domain: &'static str,
}

impl ContentHasher {
    /// Hasher for signed ledger transactions.
    pub const TRANSACTION: Self = Self::new("dal-tx-v1");
    /// Hasher for ledger blocks.
    pub const BLOCK: Self = Self::new("dal-block-v1");
    /// Hasher for addresses derived from a contract name.
    pub const CONTRACT: Self = Self::new("dal-contract-v1");

    /// Create a hasher with a custom domain tag.
    pub const fn new(domain: &'static str) -> Self {
        Self { domain }
    }

    /// Hash raw bytes with domain separation.
    pub fn hash(&self, data: &[u8]) -> [u8; 32] {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.domain.as_bytes());
        hasher.update(b":");
        hasher.update(data);
        *hasher.finalize().as_bytes()
    }

    /// Hash the canonical (bincode) encoding of a value with domain separation.
    pub fn hash_canonical<T: serde::Serialize>(&self, value: &T) -> Result<[u8; 32], HasherError> {
        let data = canonical_bytes(value)?;
        Ok(self.hash(&data))
    }

    pub fn domain(&self) -> &str {
        self.domain
    }
}

/// Canonical byte encoding used for hashing and signing.
pub fn canonical_bytes<T: serde::Serialize>(value: &T) -> Result<Vec<u8>, HasherError> {
    bincode::serialize(value).map_err(|e| HasherError::Serialization(e.to_string()))
}

/// Errors from hashing operations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum HasherError {
    #[error("serialization error: {0}")]
    Serialization(String),
}
