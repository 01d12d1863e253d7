use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Address of an identity that signs ledger transactions.
///
/// An `AccountId` is derived deterministically from a 32-byte public key:
/// the last 20 bytes of a domain-separated BLAKE3 hash. The same key always
/// produces the same account.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccountId([u8; 20]);

impl AccountId {
    /// Derive the account address for a public key.
    pub fn from_public_key(public_key: &[u8; 32]) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"dal-account-v1:");
        hasher.update(public_key);
        let digest = hasher.finalize();
        let mut address = [0u8; 20];
        address.copy_from_slice(&digest.as_bytes()[12..]);
        Self(address)
    }

    /// Create from raw address bytes.
    pub fn from_raw(address: [u8; 20]) -> Self {
        Self(address)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// `0x`-prefixed hex form.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// Parse from hex, with or without a `0x` prefix.
    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
        let address: [u8; 20] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| TypeError::InvalidLength {
                expected: 20,
                actual: bytes.len(),
            })?;
        Ok(Self(address))
    }
}

impl fmt::Debug for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccountId(0x{})", hex::encode(&self.0[..4]))
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl TryFrom<String> for AccountId {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value)
    }
}

impl From<AccountId> for String {
    fn from(account: AccountId) -> Self {
        account.to_hex()
    }
}

/// Identifier of a ledger network (chain id equivalent).
///
/// Contract artifacts key their deployments by the decimal form of this id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NetworkId(pub u64);

impl NetworkId {
    /// Network id used by local development ledgers.
    pub const DEVELOPMENT: Self = Self(5777);

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for NetworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for NetworkId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derivation_is_deterministic() {
        let a = AccountId::from_public_key(&[9u8; 32]);
        let b = AccountId::from_public_key(&[9u8; 32]);
        assert_eq!(a, b);
        assert_ne!(a, AccountId::from_public_key(&[8u8; 32]));
    }

    #[test]
    fn hex_roundtrip_with_and_without_prefix() {
        let account = AccountId::from_public_key(&[1u8; 32]);
        let hex = account.to_hex();
        assert!(hex.starts_with("0x"));
        assert_eq!(hex.len(), 42);
        assert_eq!(AccountId::from_hex(&hex).unwrap(), account);
        assert_eq!(AccountId::from_hex(&hex[2..]).unwrap(), account);
    }

    #[test]
    fn from_hex_rejects_wrong_length() {
        assert_eq!(
            AccountId::from_hex("0xabcd"),
            Err(TypeError::InvalidLength {
                expected: 20,
                actual: 2
            })
        );
        assert!(matches!(
            AccountId::from_hex("0xzz"),
            Err(TypeError::InvalidHex(_))
        ));
    }

    #[test]
    fn account_serializes_as_hex_string() {
        let account = AccountId::from_raw([0xab; 20]);
        let json = serde_json::to_string(&account).unwrap();
        assert_eq!(json, format!("\"0x{}\"", "ab".repeat(20)));
        assert_eq!(serde_json::from_str::<AccountId>(&json).unwrap(), account);
    }

    #[test]
    fn network_id_display_and_serde() {
        let id = NetworkId::DEVELOPMENT;
        assert_eq!(id.to_string(), "5777");
        assert_eq!(serde_json::to_string(&id).unwrap(), "5777");
        assert_eq!(NetworkId::from(1), NetworkId(1));
    }
}
