use dal_crypto::hasher::canonical_bytes;
use dal_crypto::{ContentHasher, Signature, VerifyingKey};
use dal_types::{AccountId, Fingerprint, NetworkId, SubjectId, TxHash};
use serde::{Deserialize, Serialize};

use crate::contract::ContractBinding;
use crate::error::{LedgerError, LedgerResult};
use crate::signer::LedgerSigner;

/// A call of the contract's anchor method.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnchorCall {
    pub contract: AccountId,
    pub method: String,
    pub subject: SubjectId,
    pub fingerprint: Fingerprint,
}

impl AnchorCall {
    pub fn new(binding: &ContractBinding, subject: SubjectId, fingerprint: Fingerprint) -> Self {
        Self {
            contract: binding.address,
            method: binding.method.clone(),
            subject,
            fingerprint,
        }
    }
}

/// A transaction before signing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnsignedTransaction {
    pub network: NetworkId,
    pub from: AccountId,
    pub nonce: u64,
    pub call: AnchorCall,
}

impl UnsignedTransaction {
    /// Sign the canonical encoding of this transaction.
    pub fn sign(self, signer: &LedgerSigner) -> LedgerResult<SignedTransaction> {
        if self.from != signer.account() {
            return Err(LedgerError::IdentityUnavailable(format!(
                "signer {} cannot sign for {}",
                signer.account(),
                self.from
            )));
        }
        let message = canonical_bytes(&self)
            .map_err(|e| LedgerError::TransactionRejected(e.to_string()))?;
        let signature = signer.sign(&message);
        Ok(SignedTransaction {
            public_key: signer.verifying_key().as_bytes(),
            signature,
            tx: self,
        })
    }
}

/// A transaction ready for submission.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTransaction {
    pub tx: UnsignedTransaction,
    pub public_key: [u8; 32],
    pub signature: Signature,
}

impl SignedTransaction {
    /// Hash identifying this transaction on the ledger.
    pub fn tx_hash(&self) -> LedgerResult<TxHash> {
        ContentHasher::TRANSACTION
            .hash_canonical(self)
            .map(TxHash::from_hash)
            .map_err(|e| LedgerError::TransactionRejected(e.to_string()))
    }

    /// Check that the signature is valid and that the key controls `from`.
    pub fn verify(&self) -> LedgerResult<()> {
        let key = VerifyingKey::from_bytes(self.public_key)
            .map_err(|_| LedgerError::TransactionRejected("malformed public key".into()))?;
        if key.to_account_id() != self.tx.from {
            return Err(LedgerError::TransactionRejected(
                "public key does not match sender".into(),
            ));
        }
        let message = canonical_bytes(&self.tx)
            .map_err(|e| LedgerError::TransactionRejected(e.to_string()))?;
        key.verify(&message, &self.signature)
            .map_err(|_| LedgerError::TransactionRejected("invalid signature".into()))
    }
}
