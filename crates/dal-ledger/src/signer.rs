use async_trait::async_trait;
use dal_crypto::{Signature, SigningKey, VerifyingKey};
use dal_types::AccountId;

use crate::error::{LedgerError, LedgerResult};

/// The identity a session signs transactions with.
#[derive(Debug)]
pub struct LedgerSigner {
    key: SigningKey,
    account: AccountId,
}

impl LedgerSigner {
    pub fn new(key: SigningKey) -> Self {
        let account = key.verifying_key().to_account_id();
        Self { key, account }
    }

    pub fn account(&self) -> AccountId {
        self.account
    }

    pub fn verifying_key(&self) -> VerifyingKey {
        self.key.verifying_key()
    }

    pub fn sign(&self, message: &[u8]) -> Signature {
        self.key.sign(message)
    }
}

/// Source of signer identities (a wallet, a key file, an HSM).
///
/// A provider may refuse; the session then fails with
/// [`LedgerError::IdentityUnavailable`].
#[async_trait]
pub trait SignerProvider: Send + Sync {
    async fn request_identity(&self) -> LedgerResult<LedgerSigner>;
}

/// Provider backed by a fixed secret, or by nothing at all.
pub struct StaticSigner {
    secret: Option<[u8; 32]>,
}

impl StaticSigner {
    pub fn from_secret(secret: [u8; 32]) -> Self {
        Self {
            secret: Some(secret),
        }
    }

    /// Parse a hex-encoded 32-byte secret.
    pub fn from_hex(seed_hex: &str) -> LedgerResult<Self> {
        let key = SigningKey::from_hex(seed_hex)
            .map_err(|e| LedgerError::IdentityUnavailable(format!("signer seed: {e}")))?;
        Ok(Self::from_secret(*key.as_bytes()))
    }

    /// A freshly generated key, valid for this process only.
    pub fn ephemeral() -> Self {
        Self::from_secret(*SigningKey::generate().as_bytes())
    }

    /// A provider that never yields an identity.
    pub fn none() -> Self {
        Self { secret: None }
    }

    /// Account of the configured key, if any.
    pub fn account(&self) -> Option<AccountId> {
        self.secret
            .map(|secret| SigningKey::from_bytes(secret).verifying_key().to_account_id())
    }
}

#[async_trait]
impl SignerProvider for StaticSigner {
    async fn request_identity(&self) -> LedgerResult<LedgerSigner> {
        let secret = self
            .secret
            .ok_or_else(|| LedgerError::IdentityUnavailable("no signer key configured".into()))?;
        Ok(LedgerSigner::new(SigningKey::from_bytes(secret)))
    }
}

impl std::fmt::Debug for StaticSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticSigner")
            .field("account", &self.account())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn static_signer_yields_stable_account() {
        let provider = StaticSigner::from_secret([7u8; 32]);
        let a = provider.request_identity().await.unwrap();
        let b = provider.request_identity().await.unwrap();
        assert_eq!(a.account(), b.account());
        assert_eq!(Some(a.account()), provider.account());
    }

    #[tokio::test]
    async fn none_is_identity_unavailable() {
        let err = StaticSigner::none().request_identity().await.unwrap_err();
        assert!(matches!(err, LedgerError::IdentityUnavailable(_)));
        assert_eq!(StaticSigner::none().account(), None);
    }

    #[test]
    fn bad_hex_seed_is_identity_unavailable() {
        assert!(matches!(
            StaticSigner::from_hex("not-hex"),
            Err(LedgerError::IdentityUnavailable(_))
        ));
        assert!(StaticSigner::from_hex(&"11".repeat(32)).is_ok());
    }

    #[test]
    fn signatures_verify_under_account_key() {
        let signer = LedgerSigner::new(SigningKey::from_bytes([9u8; 32]));
        let sig = signer.sign(b"payload");
        assert!(signer.verifying_key().verify(b"payload", &sig).is_ok());
        assert_eq!(signer.verifying_key().to_account_id(), signer.account());
    }

    #[test]
    fn debug_hides_secret() {
        let debug = format!("{:?}", StaticSigner::from_secret([1u8; 32]));
        assert!(debug.contains("account"));
        assert!(!debug.contains("0101010101"));
    }
}
