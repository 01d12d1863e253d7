use dal_types::AccountId;
use serde::{Deserialize, Serialize};

/// Secret half of a ledger account key.
pub struct SigningKey(ed25519_dalek::SigningKey);

/// Public half of a ledger account key. Its hash is the [`AccountId`].
#[derive(Clone, PartialEq, Eq)]
pub struct VerifyingKey(ed25519_dalek::VerifyingKey);

/// Transaction signature, serialized as 128 hex characters.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature(#[serde(with = "signature_hex")] ed25519_dalek::Signature);

impl SigningKey {
    pub fn generate() -> Self {
        let mut csprng = rand::thread_rng();
        Self(ed25519_dalek::SigningKey::generate(&mut csprng))
    }

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(ed25519_dalek::SigningKey::from_bytes(&bytes))
    }

    /// Parse a 32-byte secret from hex (with or without `0x`).
    pub fn from_hex(s: &str) -> Result<Self, SignatureError> {
        let s = s.trim();
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s).map_err(|_| SignatureError::InvalidKey)?;
        let secret: [u8; 32] = bytes.try_into().map_err(|_| SignatureError::InvalidKey)?;
        Ok(Self::from_bytes(secret))
    }

    pub fn verifying_key(&self) -> VerifyingKey {
        VerifyingKey(self.0.verifying_key())
    }

    pub fn sign(&self, message: &[u8]) -> Signature {
        use ed25519_dalek::Signer;
        Signature(self.0.sign(message))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        self.0.as_bytes()
    }
}

impl VerifyingKey {
    pub fn verify(&self, message: &[u8], signature: &Signature) -> Result<(), SignatureError> {
        use ed25519_dalek::Verifier;
        self.0
            .verify(message, &signature.0)
            .map_err(|_| SignatureError::InvalidSignature)
    }

    /// The ledger account controlled by this key.
    pub fn to_account_id(&self) -> AccountId {
        AccountId::from_public_key(&self.0.to_bytes())
    }

    pub fn as_bytes(&self) -> [u8; 32] {
        self.0.to_bytes()
    }

    /// Fails for byte strings that are not a valid curve point.
    pub fn from_bytes(bytes: [u8; 32]) -> Result<Self, SignatureError> {
        let key = ed25519_dalek::VerifyingKey::from_bytes(&bytes)
            .map_err(|_| SignatureError::InvalidKey)?;
        Ok(Self(key))
    }
}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SigningKey(<redacted>)")
    }
}

impl std::fmt::Debug for VerifyingKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "VerifyingKey({})", hex::encode(self.0.to_bytes()))
    }
}

impl std::fmt::Debug for Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Signature({}...)",
            hex::encode(&self.0.to_bytes()[..8])
        )
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("signature does not match the transaction")]
    InvalidSignature,
    #[error("malformed account key")]
    InvalidKey,
}

mod signature_hex {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        sig: &ed25519_dalek::Signature,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(sig.to_bytes()))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<ed25519_dalek::Signature, D::Error> {
        let text = String::deserialize(deserializer)?;
        let bytes = hex::decode(&text).map_err(D::Error::custom)?;
        let raw: [u8; 64] = bytes
            .try_into()
            .map_err(|_| D::Error::custom("signature must be 64 bytes"))?;
        Ok(ed25519_dalek::Signature::from_bytes(&raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_and_verify() {
        let sk = SigningKey::generate();
        let sig = sk.sign(b"anchor HH1001");
        assert!(sk.verifying_key().verify(b"anchor HH1001", &sig).is_ok());
    }

    #[test]
    fn verify_fails_on_wrong_message() {
        let sk = SigningKey::generate();
        let sig = sk.sign(b"correct message");
        assert_eq!(
            sk.verifying_key().verify(b"wrong message", &sig),
            Err(SignatureError::InvalidSignature)
        );
    }

    #[test]
    fn verify_fails_with_wrong_key() {
        let sk1 = SigningKey::generate();
        let sk2 = SigningKey::generate();
        let sig = sk1.sign(b"message");
        assert!(sk2.verifying_key().verify(b"message", &sig).is_err());
    }

    #[test]
    fn account_id_is_stable_per_key() {
        let sk = SigningKey::from_bytes([3u8; 32]);
        assert_eq!(
            sk.verifying_key().to_account_id(),
            sk.verifying_key().to_account_id()
        );
        assert_ne!(
            sk.verifying_key().to_account_id(),
            SigningKey::from_bytes([4u8; 32]).verifying_key().to_account_id()
        );
    }

    #[test]
    fn from_hex_roundtrip() {
        let sk = SigningKey::generate();
        let encoded = format!("0x{}", hex::encode(sk.as_bytes()));
        let parsed = SigningKey::from_hex(&encoded).unwrap();
        assert_eq!(parsed.verifying_key(), sk.verifying_key());
    }

    #[test]
    fn from_hex_rejects_bad_input() {
        assert_eq!(SigningKey::from_hex("zz").unwrap_err(), SignatureError::InvalidKey);
        assert_eq!(SigningKey::from_hex("abcd").unwrap_err(), SignatureError::InvalidKey);
    }

    #[test]
    fn verifying_key_bytes_roundtrip() {
        let vk = SigningKey::generate().verifying_key();
        assert_eq!(VerifyingKey::from_bytes(vk.as_bytes()).unwrap(), vk);
    }

    #[test]
    fn signature_json_is_hex() {
        let sig = SigningKey::from_bytes([5u8; 32]).sign(b"anchor");
        let json = serde_json::to_value(&sig).unwrap();
        assert_eq!(json.as_str().unwrap().len(), 128);
        let parsed: Signature = serde_json::from_value(json).unwrap();
        assert_eq!(sig, parsed);
        assert!(serde_json::from_str::<Signature>("\"abcd\"").is_err());
    }

    #[test]
    fn debug_redacts_signing_key() {
        let debug = format!("{:?}", SigningKey::generate());
        assert!(debug.contains("redacted"));
    }
}
