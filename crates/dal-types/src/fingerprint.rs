use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Multihash code assigned to BLAKE3-256.
pub const BLAKE3_MULTIHASH_CODE: u8 = 0x1e;

/// Digest length carried in the multihash prefix.
const DIGEST_LEN: u8 = 32;

/// Longest identifier accepted from a storage backend.
const MAX_FINGERPRINT_LEN: usize = 256;

/// Characters that would change the meaning of `<gateway>/<fingerprint>`.
const URI_DELIMITERS: &[char] = &['/', '?', '#', '%', '\\'];

/// Content-derived identifier of a stored document.
///
/// A fingerprint is a pure function of the document bytes: identical payloads
/// always produce the same fingerprint, and the store uses it as the retrieval
/// key. Locally computed fingerprints are BLAKE3 multihashes rendered as hex
/// (`1e20` followed by 64 hex characters). Fingerprints returned by a remote
/// object store (e.g. an IPFS CID) are accepted verbatim once validated.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Compute the BLAKE3 multihash fingerprint of raw bytes.
    pub fn from_content(data: &[u8]) -> Self {
        let digest = blake3::hash(data);
        let mut encoded = String::with_capacity(4 + 64);
        encoded.push_str(&hex::encode([BLAKE3_MULTIHASH_CODE, DIGEST_LEN]));
        encoded.push_str(&digest.to_hex());
        Self(encoded)
    }

    /// Validate an identifier produced by a storage backend.
    ///
    /// The identifier must be non-empty, at most 256 characters long, and
    /// free of whitespace, control characters and URI delimiters (it is
    /// appended to a gateway URI as a single path segment).
    pub fn parse(value: impl Into<String>) -> Result<Self, TypeError> {
        let value = value.into();
        let invalid = |reason: &str| TypeError::InvalidFingerprint {
            value: value.clone(),
            reason: reason.into(),
        };
        if value.is_empty() {
            return Err(invalid("empty"));
        }
        if value.len() > MAX_FINGERPRINT_LEN {
            return Err(invalid("too long"));
        }
        if value.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(invalid("contains whitespace or control characters"));
        }
        if let Some(c) = value.chars().find(|c| URI_DELIMITERS.contains(c)) {
            return Err(invalid(&format!("contains URI delimiter {c:?}")));
        }
        Ok(Self(value))
    }

    /// The textual form of the fingerprint.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short form for logs (first 12 characters).
    pub fn short(&self) -> &str {
        let end = self
            .0
            .char_indices()
            .nth(12)
            .map(|(i, _)| i)
            .unwrap_or(self.0.len());
        &self.0[..end]
    }

    /// Returns `true` if this fingerprint was locally derived with BLAKE3.
    pub fn is_blake3_multihash(&self) -> bool {
        self.0.len() == 68 && self.0.starts_with("1e20") && hex::decode(&self.0).is_ok()
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({})", self.short())
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Fingerprint {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<Fingerprint> for String {
    fn from(fp: Fingerprint) -> Self {
        fp.0
    }
}
