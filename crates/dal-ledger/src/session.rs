use std::sync::Arc;
use std::time::Duration;

use dal_types::{AccountId, AnchorReceipt, Fingerprint, NetworkId, SubjectId, TxStatus};
use tokio::sync::Mutex;

use crate::backend::LedgerBackend;
use crate::contract::{ContractArtifact, ContractBinding};
use crate::error::{LedgerError, LedgerResult};
use crate::signer::{LedgerSigner, SignerProvider};
use crate::transaction::{AnchorCall, UnsignedTransaction};

/// Default wait for a transaction to be mined.
pub const DEFAULT_CONFIRMATION_TIMEOUT: Duration = Duration::from_secs(30);

/// An authenticated identity bound to a deployed anchoring contract.
///
/// A session is built once with [`LedgerSession::connect`] and then shared;
/// nonces are allocated under an internal lock so concurrent `anchor` calls
/// never collide.
pub struct LedgerSession {
    backend: Arc<dyn LedgerBackend>,
    signer: LedgerSigner,
    binding: ContractBinding,
    confirmation_timeout: Duration,
    next_nonce: Mutex<Option<u64>>,
}

impl LedgerSession {
    /// Request an identity, query the network, and resolve the contract
    /// binding for it, in that order.
    pub async fn connect(
        backend: Arc<dyn LedgerBackend>,
        signers: &dyn SignerProvider,
        artifact: &ContractArtifact,
        confirmation_timeout: Duration,
    ) -> LedgerResult<Self> {
        let signer = signers.request_identity().await?;
        let network = backend.network_id().await?;
        let binding = artifact.binding_for(network)?;

        tracing::info!(
            account = %signer.account(),
            network = %network,
            contract = %binding.address,
            "ledger session established"
        );

        Ok(Self {
            backend,
            signer,
            binding,
            confirmation_timeout,
            next_nonce: Mutex::new(None),
        })
    }

    pub fn account(&self) -> AccountId {
        self.signer.account()
    }

    pub fn network(&self) -> NetworkId {
        self.binding.network
    }

    pub fn binding(&self) -> &ContractBinding {
        &self.binding
    }

    pub fn confirmation_timeout(&self) -> Duration {
        self.confirmation_timeout
    }

    /// Record `(subject, fingerprint)` on the ledger and wait for the block.
    ///
    /// Not idempotent: every call that succeeds creates a new anchor record.
    pub async fn anchor(
        &self,
        subject: &SubjectId,
        fingerprint: &Fingerprint,
    ) -> LedgerResult<AnchorReceipt> {
        let tx_hash = {
            let mut next_nonce = self.next_nonce.lock().await;
            let mut resynced = next_nonce.is_none();
            loop {
                let nonce = match *next_nonce {
                    Some(nonce) => nonce,
                    None => self.backend.transaction_count(self.account()).await?,
                };

                let signed = UnsignedTransaction {
                    network: self.binding.network,
                    from: self.account(),
                    nonce,
                    call: AnchorCall::new(&self.binding, subject.clone(), fingerprint.clone()),
                }
                .sign(&self.signer)?;

                match self.backend.submit(signed).await {
                    Ok(tx_hash) => {
                        *next_nonce = Some(nonce + 1);
                        break tx_hash;
                    }
                    Err(LedgerError::NonceMismatch { expected, got }) if !resynced => {
                        // Another writer shares this account. Re-read once.
                        tracing::debug!(expected, got, "nonce out of date, resyncing");
                        *next_nonce = None;
                        resynced = true;
                    }
                    Err(e) => {
                        *next_nonce = None;
                        return Err(e);
                    }
                }
            }
        };

        tracing::debug!(%subject, %fingerprint, %tx_hash, "anchor transaction submitted");

        let receipt = tokio::time::timeout(
            self.confirmation_timeout,
            self.backend.wait_for_receipt(tx_hash),
        )
        .await
        .map_err(|_| LedgerError::TransactionTimeout {
            tx_hash,
            waited_ms: self.confirmation_timeout.as_millis() as u64,
        })??;

        match &receipt.status {
            TxStatus::Confirmed => {
                tracing::info!(
                    %subject,
                    %tx_hash,
                    block = %receipt.block,
                    "anchor confirmed"
                );
                Ok(receipt)
            }
            TxStatus::Reverted { reason } => {
                tracing::warn!(%subject, %tx_hash, %reason, "anchor reverted");
                Err(LedgerError::TransactionRejected(reason.clone()))
            }
        }
    }
}

impl std::fmt::Debug for LedgerSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LedgerSession")
            .field("account", &self.account())
            .field("network", &self.binding.network)
            .field("contract", &self.binding.address)
            .finish()
    }
}
